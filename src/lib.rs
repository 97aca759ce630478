pub mod fetch;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod sample;
pub mod schema;

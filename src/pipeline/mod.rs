//! The matching and aggregation core.
//!
//! Raw rows are screened into ELP violations, joined to their inspection's
//! state, accumulated into month and state count tables, and reduced to the
//! dashboard statistics. Everything here is synchronous and source-agnostic;
//! the loaders and fetchers feed it.

pub mod aggregate;
pub mod classify;
pub mod dates;
pub mod join;
pub mod stats;
pub mod types;

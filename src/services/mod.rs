pub mod records_api;

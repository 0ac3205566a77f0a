pub mod config;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod source;
pub mod store;
pub mod utility;

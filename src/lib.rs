pub mod aggregate;
pub mod config;
pub mod detect;
pub mod error;
pub mod history;
pub mod ingest;
pub mod model;
pub mod parsers;

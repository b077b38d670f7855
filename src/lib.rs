pub mod analyzers;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod roster;
pub mod schema;
pub mod stats;
pub mod store;

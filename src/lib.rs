pub mod app;
pub mod config;
pub mod error;
pub mod ingest;
pub mod query;
pub mod storage;
pub mod types;

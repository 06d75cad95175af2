pub mod backoff;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod ndjson;
pub mod scan;

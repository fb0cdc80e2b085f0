//! Season-level soccer player statistics: a one-shot CSV ingestion pipeline
//! (FBRef light export → SQLite star schema) plus the derived-metric and
//! query layers a dashboard consumes.

pub mod coerce;
pub mod config;
pub mod dimensions;
pub mod ingest;
pub mod metrics;
pub mod queries;
pub mod schema;

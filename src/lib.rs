// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod export;
pub mod hotness;
pub mod ingest;
pub mod logging;
pub mod metrics;

pub use crate::aggregator::{rank, Aggregator};
pub use crate::api::create_router;
pub use crate::hotness::HotnessTable;
pub use crate::ingest::{Article, UnknownSourceError};

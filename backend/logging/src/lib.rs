//! Structured logging for ltconfig.
//!
//! Console output plus an optional JSON log file with daily rotation.

pub mod logger;

pub use logger::init_logger;

//! TeamPulse - cross-platform team activity aggregation.
//!
//! Per-source activity signals are scored, merged into one identity per
//! person, and rolled up into team health statistics and isolation risk
//! insights. [`pipeline::aggregate`] is the pure core; [`pipeline::run_cycle`]
//! adds the concurrent source fan-in around it.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod scoring;
pub mod sources;

pub use error::{AdapterFetchError, MergeError};
pub use pipeline::{
    aggregate, observe, run_cycle, AggregateOptions, AggregateReport, AggregationContext,
    CycleLocks, CycleOutcome,
};

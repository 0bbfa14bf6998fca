//! Output module for extracted events and run reports
//!
//! This module handles:
//! - Writing extracted events to Parquet part files
//! - Summarising a completed run
//! - Reporting the saved state of a period

mod parquet_sink;
pub mod stats;
mod traits;

pub use parquet_sink::{
    event_schema, events_to_batch, part_file_name, write_events_parquet, ParquetSink,
};
pub use stats::{load_statistics, print_statistics, PeriodStatistics, RunSummary};
pub use traits::{OutputError, OutputResult, ResultSink};

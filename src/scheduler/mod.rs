//! The ingestion loop behind `gator agg`.
//!
//! [`Aggregator`] ties the store and the fetcher together: every tick it
//! collects the feed that has waited longest. [`parse_interval`] turns the
//! command-line interval into a [`std::time::Duration`].

mod aggregator;
mod interval;

pub use aggregator::{Aggregator, CycleOutcome, CycleReport};
pub use interval::parse_interval;

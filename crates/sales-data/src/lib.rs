//! Data layer for the sales report.
//!
//! Loads sales records from JSON into a validated batch and derives the
//! summary facts (revenue leader, sales leader, most popular year).

pub mod aggregator;
pub mod reader;

pub use sales_core as core;

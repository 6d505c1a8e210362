//! Runtime layer for the sales report.
//!
//! Renders report documents, builds and dispatches the summary email, and
//! drives a complete run from input file to delivered message.

pub mod mail;
pub mod pipeline;
pub mod report;

pub use sales_core as core;
pub use sales_data as data;

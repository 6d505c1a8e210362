//! Core types and pure logic for the sales report.
//!
//! Holds the record model, currency parsing, summary and table formatting,
//! the shared error type and CLI settings used by every other crate in the
//! workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod money;
pub mod settings;

//! Export of analysis results

pub mod json;

pub use json::{write_report, SCHEMA_VERSION};

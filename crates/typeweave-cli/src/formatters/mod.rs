//! Output formatters for extraction results.

pub mod human;
pub mod json;

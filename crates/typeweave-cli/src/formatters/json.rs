//! JSON formatter for extraction results.

use anyhow::Result;
use typeweave_core::ExtractionResult;

/// Prints the result in its wire shape, so it can be piped into other tools.
pub fn print_json(result: &ExtractionResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

//! JSON pretty printer.

use std::io::Read;

use serde_json::Value;

use crate::Result;

/// Re-serialise the JSON document read from `reader`.
///
/// Compact output without whitespace, or two-space indentation when
/// `pretty` is set. Object keys keep their input order.
pub fn simple_pretty_json(reader: impl Read, pretty: bool) -> Result<String> {
    let value: Value = serde_json::from_reader(reader)?;

    let out = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(out)
}

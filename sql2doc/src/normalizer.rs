use log::{debug, warn};

use crate::types::{ColumnValue, NormalizedValue};

/// Convert a raw driver value into a portable scalar. Never fails.
///
/// Byte sequences are decoded as UTF-8 text, so the destination never receives raw bytes.
/// Unrecognized driver types go through unchanged.
pub fn normalize(raw: ColumnValue) -> NormalizedValue {
    match raw {
        ColumnValue::Null => NormalizedValue::Null,
        ColumnValue::Text(value) => NormalizedValue::String(value),
        ColumnValue::RawBytes(bytes) => NormalizedValue::String(decode_bytes(bytes)),
        ColumnValue::Integer(value) => NormalizedValue::Integer(value),
        ColumnValue::UInteger(value) => NormalizedValue::UInteger(value),
        ColumnValue::Float(value) => NormalizedValue::Float(value),
        ColumnValue::Boolean(value) => NormalizedValue::Boolean(value),
        ColumnValue::Timestamp(value) => NormalizedValue::Timestamp(value),
        ColumnValue::Unrecognized(value) => {
            debug!("passing through unrecognized column value '{}'", value);
            NormalizedValue::Unrecognized(value)
        }
    }
}

fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "column value is not valid UTF-8 ({}), invalid sequences are replaced",
                err.utf8_error()
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

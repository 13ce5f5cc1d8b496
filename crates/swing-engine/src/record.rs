//! Flat key-value export of analysis outputs.

use serde::Serialize;
use serde_json::{Map, Value};
use swing_core::{Error, Result};

/// Output structure that can be handed to storage or an API layer as a
/// plain key-value record.
pub trait Record: Serialize {
    fn to_record(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Serialization(format!(
                "expected an object record, got {}",
                other
            ))),
        }
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

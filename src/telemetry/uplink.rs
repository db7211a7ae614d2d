// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for `chirpstack/<eui>/upChannel` payloads.

use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::PowerState;

use super::{TelemetryField, TelemetryRecord};

/// A decoded uplink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uplink {
    /// Reported socket status; `None` when the uplink did not carry one.
    pub socket_status: Option<PowerState>,
    /// Readings carried by this uplink only.
    pub readings: TelemetryRecord,
}

/// Decodes a raw uplink payload.
///
/// Only structural problems are errors. Missing readings, unknown keys and
/// readings that are not numeric are not.
///
/// # Errors
///
/// - [`ParseError::MalformedJson`] if the payload is not JSON
/// - [`ParseError::UnexpectedShape`] if it is not an object with a
///   `decoded.payload` object
pub fn decode_uplink(payload: &[u8]) -> Result<Uplink, ParseError> {
    let root: Value = serde_json::from_slice(payload)?;

    let Value::Object(root) = root else {
        return Err(ParseError::UnexpectedShape(
            "uplink is not a JSON object".to_string(),
        ));
    };

    let data = root
        .get("decoded")
        .and_then(|decoded| decoded.get("payload"))
        .ok_or_else(|| ParseError::UnexpectedShape("missing decoded.payload".to_string()))?;

    let Value::Object(data) = data else {
        return Err(ParseError::UnexpectedShape(
            "decoded.payload is not an object".to_string(),
        ));
    };

    Ok(Uplink {
        socket_status: data
            .get("socket_status")
            .map(|status| PowerState::from(status.as_str() == Some("open"))),
        readings: read_telemetry(data),
    })
}

fn read_telemetry(data: &Map<String, Value>) -> TelemetryRecord {
    let mut record = TelemetryRecord::new();
    for field in TelemetryField::ALL {
        let Some(raw) = data.get(field.key()) else {
            continue;
        };
        match as_reading(raw) {
            Some(value) => record.set(field, value),
            None => {
                tracing::debug!(field = %field, value = %raw, "Skipping non-numeric reading");
            }
        }
    }
    record
}

/// Accepts JSON numbers and numeric strings.
fn as_reading(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

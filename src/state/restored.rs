// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-persisted switch state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::telemetry::{TelemetryField, TelemetryRecord};
use crate::types::PowerState;

/// Last state the host recorded for the switch entity.
///
/// Mirrors the host's own record: a state string (`"on"`, `"off"`, or
/// host-specific values such as `"unavailable"`) and the attribute map as
/// it was presented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoredState {
    /// Host state string.
    pub state: String,
    /// Attributes as persisted; values may be null.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RestoredState {
    /// Builds a record from a power state and telemetry readings.
    #[must_use]
    pub fn new(power: Option<PowerState>, telemetry: &TelemetryRecord) -> Self {
        let state = power.map_or("unknown", |power| power.as_str()).to_string();
        let attributes = telemetry
            .to_attributes()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.map_or(Value::Null, Value::from)))
            .collect();
        Self { state, attributes }
    }

    /// Returns the persisted power state, if it was `on` or `off`.
    #[must_use]
    pub fn power(&self) -> Option<PowerState> {
        match self.state.as_str() {
            "on" => Some(PowerState::On),
            "off" => Some(PowerState::Off),
            _ => None,
        }
    }

    /// Returns the persisted numeric telemetry attributes.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryRecord {
        let mut record = TelemetryRecord::new();
        for field in TelemetryField::ALL {
            if let Some(value) = self.attributes.get(field.key()).and_then(Value::as_f64) {
                record.set(field, value);
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_only_for_on_and_off() {
        let state = |s: &str| RestoredState {
            state: s.to_string(),
            ..RestoredState::default()
        };
        assert_eq!(state("on").power(), Some(PowerState::On));
        assert_eq!(state("off").power(), Some(PowerState::Off));
        assert_eq!(state("unavailable").power(), None);
        assert_eq!(state("").power(), None);
    }

    #[test]
    fn telemetry_skips_null_and_non_numeric() {
        let restored: RestoredState = serde_json::from_str(
            r#"{
                "state": "off",
                "attributes": {
                    "voltage": 230,
                    "current": null,
                    "active_power": "12",
                    "power_factor": 97.5,
                    "friendly_name": "Desk"
                }
            }"#,
        )
        .unwrap();

        let telemetry = restored.telemetry();
        assert_eq!(telemetry.get(TelemetryField::Voltage), Some(230.0));
        assert_eq!(telemetry.get(TelemetryField::Current), None);
        assert_eq!(telemetry.get(TelemetryField::ActivePower), None);
        assert_eq!(telemetry.get(TelemetryField::PowerFactor), Some(97.5));
    }

    #[test]
    fn attributes_default_to_empty() {
        let restored: RestoredState = serde_json::from_str(r#"{"state": "on"}"#).unwrap();
        assert!(restored.attributes.is_empty());
        assert!(restored.telemetry().is_empty());
    }

    #[test]
    fn new_records_unknown_power() {
        let restored = RestoredState::new(None, &TelemetryRecord::new());
        assert_eq!(restored.state, "unknown");
        assert_eq!(restored.attributes.len(), 5);
        assert!(restored.attributes.values().all(Value::is_null));
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot of one plug.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::connection::{ConnectionState, ConnectionStatus};
use crate::telemetry::TelemetryRecord;
use crate::types::PowerState;

use super::RestoredState;

/// Observable state of one plug.
///
/// `power` is `None` until the host restored a previous state or the
/// device reported its socket status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlugState {
    /// Relay state as last reported by the device.
    pub power: Option<PowerState>,
    /// Connection state, availability and retry count.
    pub connection: ConnectionStatus,
    /// Last known reading per field.
    pub telemetry: TelemetryRecord,
}

impl PlugState {
    /// Returns true if the relay is known to be on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.power.is_some_and(|power| power.is_on())
    }

    /// Returns whether the plug is presented as available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.connection.available
    }

    /// Returns the connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state
    }

    /// Returns the telemetry readings keyed by attribute name.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<&'static str, Option<f64>> {
        self.telemetry.to_attributes()
    }

    /// Applies a host-persisted state.
    ///
    /// The power state is taken only if the host recorded `on` or `off`.
    /// Numeric attributes are restored; anything else is ignored.
    pub fn restore(&mut self, restored: &RestoredState) {
        if let Some(power) = restored.power() {
            self.power = Some(power);
        }
        self.telemetry.merge(&restored.telemetry());
    }

    /// Builds the record the host persists for this plug.
    #[must_use]
    pub fn to_restored(&self) -> RestoredState {
        RestoredState::new(self.power, &self.telemetry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetryField;

    #[test]
    fn unknown_power_is_not_on() {
        let state = PlugState::default();
        assert_eq!(state.power, None);
        assert!(!state.is_on());
        assert!(!state.is_available());
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn attributes_list_every_field() {
        let mut state = PlugState::default();
        state.telemetry.set(TelemetryField::ActivePower, 42.0);

        let attributes = state.attributes();
        assert_eq!(attributes.len(), 5);
        assert_eq!(attributes["active_power"], Some(42.0));
        assert_eq!(attributes["voltage"], None);
    }

    #[test]
    fn restore_keeps_power_when_host_state_is_unavailable() {
        let mut state = PlugState {
            power: Some(PowerState::Off),
            ..PlugState::default()
        };
        let restored: RestoredState =
            serde_json::from_str(r#"{"state": "unavailable", "attributes": {}}"#).unwrap();

        state.restore(&restored);

        assert_eq!(state.power, Some(PowerState::Off));
    }

    #[test]
    fn to_restored_round_trips_through_restore() {
        let mut original = PlugState {
            power: Some(PowerState::On),
            ..PlugState::default()
        };
        original.telemetry.set(TelemetryField::PowerConsumption, 1250.0);

        let mut restored = PlugState::default();
        restored.restore(&original.to_restored());

        assert_eq!(restored.power, original.power);
        assert_eq!(restored.telemetry, original.telemetry);
    }
}

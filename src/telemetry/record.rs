// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Telemetry readings reported by the plug.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric reading the WS523 reports in its uplinks.
///
/// The [`key`](Self::key) is both the uplink field name and the attribute
/// name presented to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryField {
    /// Line voltage in volts.
    Voltage,
    /// Load current in milliamperes.
    Current,
    /// Active power in watts.
    ActivePower,
    /// Cumulative energy in watt-hours.
    PowerConsumption,
    /// Power factor in percent.
    PowerFactor,
}

impl TelemetryField {
    /// All fields, in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Voltage,
        Self::Current,
        Self::ActivePower,
        Self::PowerConsumption,
        Self::PowerFactor,
    ];

    /// Returns the uplink/attribute key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::ActivePower => "active_power",
            Self::PowerConsumption => "power_consumption",
            Self::PowerFactor => "power_factor",
        }
    }

    /// Looks up a field by its uplink key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Partial set of telemetry readings.
///
/// Used both for a single decoded uplink (only the fields it carried) and
/// for the last known values held by the plug.
///
/// # Examples
///
/// ```
/// use ws523_lib::telemetry::{TelemetryField, TelemetryRecord};
///
/// let mut known = TelemetryRecord::new();
/// known.set(TelemetryField::Voltage, 229.0);
/// known.set(TelemetryField::Current, 120.0);
///
/// let mut update = TelemetryRecord::new();
/// update.set(TelemetryField::Voltage, 231.0);
///
/// known.merge(&update);
/// assert_eq!(known.get(TelemetryField::Voltage), Some(231.0));
/// assert_eq!(known.get(TelemetryField::Current), Some(120.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    power_consumption: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    power_factor: Option<f64>,
}

impl TelemetryRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, field: TelemetryField) -> &mut Option<f64> {
        match field {
            TelemetryField::Voltage => &mut self.voltage,
            TelemetryField::Current => &mut self.current,
            TelemetryField::ActivePower => &mut self.active_power,
            TelemetryField::PowerConsumption => &mut self.power_consumption,
            TelemetryField::PowerFactor => &mut self.power_factor,
        }
    }

    /// Returns the reading for `field`, if known.
    #[must_use]
    pub fn get(&self, field: TelemetryField) -> Option<f64> {
        match field {
            TelemetryField::Voltage => self.voltage,
            TelemetryField::Current => self.current,
            TelemetryField::ActivePower => self.active_power,
            TelemetryField::PowerConsumption => self.power_consumption,
            TelemetryField::PowerFactor => self.power_factor,
        }
    }

    /// Sets the reading for `field`.
    pub fn set(&mut self, field: TelemetryField, value: f64) {
        *self.slot_mut(field) = Some(value);
    }

    /// Returns true if no reading is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterates over the present readings in field order.
    pub fn iter(&self) -> impl Iterator<Item = (TelemetryField, f64)> + '_ {
        TelemetryField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    /// Overwrites the fields present in `update`; absent fields keep their
    /// last known value.
    ///
    /// Returns true if any value changed.
    pub fn merge(&mut self, update: &Self) -> bool {
        let mut changed = false;
        for (field, value) in update.iter() {
            let slot = self.slot_mut(field);
            if *slot != Some(value) {
                *slot = Some(value);
                changed = true;
            }
        }
        changed
    }

    /// Returns every field keyed by name, `None` for unknown readings.
    ///
    /// This is the attribute map presented alongside the switch state.
    #[must_use]
    pub fn to_attributes(&self) -> BTreeMap<&'static str, Option<f64>> {
        TelemetryField::ALL
            .into_iter()
            .map(|field| (field.key(), self.get(field)))
            .collect()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static sensor descriptors.

use serde::Serialize;

use crate::telemetry::TelemetryField;

/// Kind of physical quantity a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Voltage,
    Current,
    Power,
    Energy,
    PowerFactor,
}

/// How the host should aggregate a sensor's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    /// A point-in-time reading.
    Measurement,
    /// A counter that only grows (resets are treated as meter replacement).
    TotalIncreasing,
}

/// Describes how one telemetry field is presented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorDescription {
    pub field: TelemetryField,
    pub name: &'static str,
    pub unit: &'static str,
    pub device_class: DeviceClass,
    pub state_class: StateClass,
}

/// One descriptor per telemetry field, in [`TelemetryField::ALL`] order.
pub static SENSOR_TYPES: [SensorDescription; 5] = [
    SensorDescription {
        field: TelemetryField::Voltage,
        name: "Voltage",
        unit: "V",
        device_class: DeviceClass::Voltage,
        state_class: StateClass::Measurement,
    },
    SensorDescription {
        field: TelemetryField::Current,
        name: "Current",
        unit: "mA",
        device_class: DeviceClass::Current,
        state_class: StateClass::Measurement,
    },
    SensorDescription {
        field: TelemetryField::ActivePower,
        name: "Power",
        unit: "W",
        device_class: DeviceClass::Power,
        state_class: StateClass::Measurement,
    },
    SensorDescription {
        field: TelemetryField::PowerConsumption,
        name: "Energy",
        unit: "Wh",
        device_class: DeviceClass::Energy,
        state_class: StateClass::TotalIncreasing,
    },
    SensorDescription {
        field: TelemetryField::PowerFactor,
        name: "Power Factor",
        unit: "%",
        device_class: DeviceClass::PowerFactor,
        state_class: StateClass::Measurement,
    },
];

impl SensorDescription {
    /// Returns the descriptor for `field`.
    #[must_use]
    pub fn for_field(field: TelemetryField) -> &'static Self {
        match field {
            TelemetryField::Voltage => &SENSOR_TYPES[0],
            TelemetryField::Current => &SENSOR_TYPES[1],
            TelemetryField::ActivePower => &SENSOR_TYPES[2],
            TelemetryField::PowerConsumption => &SENSOR_TYPES[3],
            TelemetryField::PowerFactor => &SENSOR_TYPES[4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_follow_field_order() {
        for (description, field) in SENSOR_TYPES.iter().zip(TelemetryField::ALL) {
            assert_eq!(description.field, field);
            assert_eq!(SensorDescription::for_field(field), description);
        }
    }

    #[test]
    fn energy_is_total_increasing() {
        let energy = SensorDescription::for_field(TelemetryField::PowerConsumption);
        assert_eq!(energy.unit, "Wh");
        assert_eq!(energy.state_class, StateClass::TotalIncreasing);

        let others = SENSOR_TYPES
            .iter()
            .filter(|d| d.state_class == StateClass::Measurement)
            .count();
        assert_eq!(others, 4);
    }

    #[test]
    fn current_is_reported_in_milliamperes() {
        assert_eq!(SensorDescription::for_field(TelemetryField::Current).unit, "mA");
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lookup of sensor entities by device.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::telemetry::{TelemetryField, TelemetryRecord};
use crate::types::DeviceEui;

use super::Sensor;

/// Maps `(device EUI, field)` to the sensor presenting that reading.
///
/// The registry is shared by reference between the integration that
/// creates sensors and the switch adapters that feed them.
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: RwLock<HashMap<DeviceEui, HashMap<TelemetryField, Arc<Sensor>>>>,
}

impl SensorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sensor`, replacing any sensor for the same device and field.
    pub fn register(&self, sensor: Arc<Sensor>) {
        tracing::debug!(eui = %sensor.eui(), field = %sensor.field(), "Registering sensor");
        self.sensors
            .write()
            .entry(sensor.eui().clone())
            .or_default()
            .insert(sensor.field(), sensor);
    }

    /// Removes every sensor of `eui`, returning how many were registered.
    pub fn unregister_device(&self, eui: &DeviceEui) -> usize {
        self.sensors.write().remove(eui).map_or(0, |sensors| sensors.len())
    }

    /// Returns the sensor for `field` of `eui`.
    #[must_use]
    pub fn get(&self, eui: &DeviceEui, field: TelemetryField) -> Option<Arc<Sensor>> {
        self.sensors.read().get(eui)?.get(&field).cloned()
    }

    /// Returns the sensors registered for `eui`, in field order.
    #[must_use]
    pub fn sensors_for(&self, eui: &DeviceEui) -> Vec<Arc<Sensor>> {
        let sensors = self.sensors.read();
        let Some(by_field) = sensors.get(eui) else {
            return Vec::new();
        };
        TelemetryField::ALL
            .iter()
            .filter_map(|field| by_field.get(field).cloned())
            .collect()
    }

    /// Pushes every reading in `readings` to the matching sensor of `eui`.
    ///
    /// Readings without a registered sensor are skipped. Returns the number
    /// of sensors updated.
    pub fn forward(&self, eui: &DeviceEui, readings: &TelemetryRecord) -> usize {
        let sensors = self.sensors.read();
        let Some(by_field) = sensors.get(eui) else {
            return 0;
        };

        let mut updated = 0;
        for (field, value) in readings.iter() {
            if let Some(sensor) = by_field.get(&field) {
                sensor.update_from_data(value);
                updated += 1;
            }
        }
        updated
    }

    /// Returns the number of devices with registered sensors.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.sensors.read().len()
    }
}

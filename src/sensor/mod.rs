// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor entities for the plug's telemetry readings.
//!
//! Each plug exposes one [`Sensor`] per [`TelemetryField`]. The switch
//! adapter does not own them: it looks them up in a [`SensorRegistry`]
//! keyed by device EUI and pushes new readings through
//! [`Sensor::update_from_data`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use ws523_lib::sensor::{Sensor, SensorRegistry};
//! use ws523_lib::telemetry::TelemetryField;
//! use ws523_lib::types::DeviceEui;
//!
//! let eui = DeviceEui::new("24e124468d123456").unwrap();
//! let registry = SensorRegistry::new();
//! for sensor in Sensor::all_for(&eui) {
//!     registry.register(Arc::new(sensor));
//! }
//!
//! let voltage = registry.get(&eui, TelemetryField::Voltage).unwrap();
//! assert_eq!(voltage.entity_id(), "sensor.ws523_24e124468d123456_voltage");
//! assert_eq!(voltage.native_value(), None);
//! ```

mod description;
mod registry;

pub use description::{DeviceClass, SENSOR_TYPES, SensorDescription, StateClass};
pub use registry::SensorRegistry;

use tokio::sync::watch;

use crate::entity::{DeviceInfo, sensor_entity_id};
use crate::telemetry::TelemetryField;
use crate::types::DeviceEui;

/// One telemetry reading presented to the host.
#[derive(Debug)]
pub struct Sensor {
    eui: DeviceEui,
    description: &'static SensorDescription,
    value: watch::Sender<Option<f64>>,
}

impl Sensor {
    /// Creates the sensor for `field` of the plug `eui`.
    #[must_use]
    pub fn new(eui: DeviceEui, field: TelemetryField) -> Self {
        let (value, _) = watch::channel(None);
        Self {
            eui,
            description: SensorDescription::for_field(field),
            value,
        }
    }

    /// Creates the full set of sensors for one plug.
    #[must_use]
    pub fn all_for(eui: &DeviceEui) -> Vec<Self> {
        TelemetryField::ALL
            .into_iter()
            .map(|field| Self::new(eui.clone(), field))
            .collect()
    }

    /// Returns the EUI of the plug this sensor belongs to.
    #[must_use]
    pub fn eui(&self) -> &DeviceEui {
        &self.eui
    }

    /// Returns the telemetry field this sensor presents.
    #[must_use]
    pub fn field(&self) -> TelemetryField {
        self.description.field
    }

    /// Returns the static descriptor (unit, device class, ...).
    #[must_use]
    pub fn description(&self) -> &'static SensorDescription {
        self.description
    }

    /// Returns `sensor.ws523_<eui>_<key>`.
    #[must_use]
    pub fn entity_id(&self) -> String {
        sensor_entity_id(&self.eui, self.description.field)
    }

    /// Returns `<eui>_<key>`.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.eui, self.description.field.key())
    }

    /// Returns the entity name shown under the device.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.description.name
    }

    /// Returns the device this sensor is grouped under.
    #[must_use]
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::for_plug(&self.eui)
    }

    /// Returns the last reading, `None` until the device reported one.
    #[must_use]
    pub fn native_value(&self) -> Option<f64> {
        *self.value.borrow()
    }

    /// Stores a new reading and notifies watchers.
    pub fn update_from_data(&self, value: f64) {
        self.value.send_replace(Some(value));
    }

    /// Returns a receiver notified on every update.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<f64>> {
        self.value.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eui() -> DeviceEui {
        DeviceEui::new("24E124468D00BEEF").unwrap()
    }

    #[test]
    fn identifiers() {
        let sensor = Sensor::new(eui(), TelemetryField::PowerConsumption);
        assert_eq!(sensor.entity_id(), "sensor.ws523_24E124468D00BEEF_power_consumption");
        assert_eq!(sensor.unique_id(), "24E124468D00BEEF_power_consumption");
        assert_eq!(sensor.name(), "Energy");
        assert_eq!(sensor.device_info().name, "WS523 Smart Plug BEEF");
    }

    #[test]
    fn all_for_covers_every_field() {
        let sensors = Sensor::all_for(&eui());
        let fields: Vec<_> = sensors.iter().map(Sensor::field).collect();
        assert_eq!(fields, TelemetryField::ALL);
    }

    #[tokio::test]
    async fn update_notifies_watchers() {
        let sensor = Sensor::new(eui(), TelemetryField::Voltage);
        let mut rx = sensor.watch();

        sensor.update_from_data(231.0);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(231.0));
        assert_eq!(sensor.native_value(), Some(231.0));
    }
}

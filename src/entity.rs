// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host entity interface.
//!
//! The host sees each plug as one switch entity plus five sensor entities,
//! all grouped under one device. This module holds the narrow switch
//! interface and the naming shared by both entity kinds.

use std::collections::BTreeMap;
use std::future::Future;

use serde::Serialize;

use crate::telemetry::TelemetryField;
use crate::types::{DeviceEui, PowerState};

/// Integration domain, used as the device identifier namespace.
pub const DOMAIN: &str = "milesight_ws523";

/// Command the host sends to a switch entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchCommand {
    TurnOn,
    TurnOff,
}

impl From<PowerState> for SwitchCommand {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::On => Self::TurnOn,
            PowerState::Off => Self::TurnOff,
        }
    }
}

/// The switch side of a plug as the host consumes it.
pub trait SwitchEntity {
    /// Returns the host entity id.
    fn entity_id(&self) -> String;

    /// Returns the id the host uses to track the entity across restarts.
    fn unique_id(&self) -> String;

    /// Returns the last device-reported state, `None` if unknown.
    fn state(&self) -> Option<PowerState>;

    /// Returns the extra state attributes.
    fn attributes(&self) -> BTreeMap<&'static str, Option<f64>>;

    /// Returns whether the entity is available.
    fn is_available(&self) -> bool;

    /// Handles a host command. Transport failures are not reported back.
    fn on_command(&self, command: SwitchCommand) -> impl Future<Output = ()> + Send;
}

/// Device registry entry shared by a plug's entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, eui)` pairs identifying the device.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
}

impl DeviceInfo {
    /// Returns the device entry for the plug `eui`.
    #[must_use]
    pub fn for_plug(eui: &DeviceEui) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_string(), eui.to_string())],
            name: format!("WS523 Smart Plug {}", eui.short_suffix()),
            manufacturer: "Milesight".to_string(),
            model: "WS523".to_string(),
            sw_version: "1.0".to_string(),
        }
    }
}

/// Returns `switch.ws523_<eui>`.
#[must_use]
pub fn switch_entity_id(eui: &DeviceEui) -> String {
    format!("switch.ws523_{eui}")
}

/// Returns `milesight_ws523_<eui>`.
#[must_use]
pub fn switch_unique_id(eui: &DeviceEui) -> String {
    format!("{DOMAIN}_{eui}")
}

/// Returns `sensor.ws523_<eui>_<key>`.
#[must_use]
pub fn sensor_entity_id(eui: &DeviceEui, field: TelemetryField) -> String {
    format!("sensor.ws523_{eui}_{}", field.key())
}

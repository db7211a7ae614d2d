// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for WS523 plug control.
//!
//! Each type validates its value at construction time so the rest of the
//! library can rely on it.
//!
//! # Types
//!
//! - [`DeviceEui`] - 16-hex-character LoRaWAN device identifier
//! - [`Qos`] - MQTT delivery guarantee (0, 1 or 2)
//! - [`PowerState`] - On/Off state of the plug relay

mod eui;
mod power;
mod qos;

pub use eui::DeviceEui;
pub use power::PowerState;
pub use qos::Qos;

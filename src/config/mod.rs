// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plug configuration and the config flow that creates it.
//!
//! A configured plug is a [`ConfigEntry`] whose data is a [`PlugConfig`].
//! The host stores entry data as JSON; [`PlugConfig`] deserializes it
//! directly and defaults the QoS to 2 when absent.
//!
//! # Examples
//!
//! ```
//! use ws523_lib::config::PlugConfig;
//! use ws523_lib::types::Qos;
//!
//! let config: PlugConfig =
//!     serde_json::from_str(r#"{"device_eui": "24E124468D123456"}"#).unwrap();
//! assert_eq!(config.qos, Qos::ExactlyOnce);
//! assert_eq!(config.title(), "WS523 3456");
//! ```

mod entries;
mod flow;

pub use entries::{ConfigEntries, ConfigEntry};
pub use flow::{AbortReason, ConfigFlow, FlowResult, UserInput};

use serde::{Deserialize, Serialize};

use crate::types::{DeviceEui, Qos};

/// Configuration of one plug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlugConfig {
    /// Device EUI as entered by the user.
    pub device_eui: DeviceEui,
    /// QoS used for the uplink subscription and downlink publishes.
    #[serde(default)]
    pub qos: Qos,
}

impl PlugConfig {
    /// Creates a configuration with the default QoS.
    #[must_use]
    pub fn new(device_eui: DeviceEui) -> Self {
        Self {
            device_eui,
            qos: Qos::default(),
        }
    }

    /// Sets the QoS level.
    #[must_use]
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }

    /// Returns the entry title, `WS523 <last 4 EUI characters>`.
    #[must_use]
    pub fn title(&self) -> String {
        format!("WS523 {}", self.device_eui.short_suffix())
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay power state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Power state of the plug relay as reported by the device.
///
/// # Examples
///
/// ```
/// use ws523_lib::types::PowerState;
///
/// assert_eq!(PowerState::from_socket_status("open"), PowerState::On);
/// assert_eq!(PowerState::from_socket_status("closed"), PowerState::Off);
/// assert_eq!(PowerState::On.as_str(), "on");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    /// Socket is closed, no power delivered.
    Off,
    /// Socket is open, power delivered.
    On,
}

impl PowerState {
    /// Returns the host state string (`"on"` / `"off"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Maps the device's `socket_status` value; only `"open"` means on.
    #[must_use]
    pub fn from_socket_status(status: &str) -> Self {
        Self::from(status == "open")
    }

    /// Returns true if the relay is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a host-persisted state string. Anything other than `"on"` is off,
/// which matches how a restored `unavailable`/`unknown` state is treated.
impl FromStr for PowerState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s == "on"))
    }
}

impl From<bool> for PowerState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

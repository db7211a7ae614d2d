// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LoRaWAN device EUI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValueError;

/// Extended Unique Identifier of a LoRaWAN device.
///
/// Exactly 16 hexadecimal characters, validated case-insensitively. The
/// spelling as entered is kept because it becomes part of MQTT topic
/// names and entity identifiers.
///
/// # Examples
///
/// ```
/// use ws523_lib::types::DeviceEui;
///
/// let eui = DeviceEui::new("24E124468D123456").unwrap();
/// assert_eq!(eui.uplink_topic(), "chirpstack/24E124468D123456/upChannel");
/// assert_eq!(eui.short_suffix(), "3456");
///
/// assert!(DeviceEui::new("24E124468D12345").is_err());
/// assert!(DeviceEui::new("24E124468D12345G").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceEui(String);

impl DeviceEui {
    /// Number of hexadecimal characters in an EUI.
    pub const LEN: usize = 16;

    /// Creates a validated device EUI.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidDeviceEui` unless the input is exactly
    /// 16 characters over `[0-9a-fA-F]`.
    pub fn new(eui: impl Into<String>) -> Result<Self, ValueError> {
        let eui = eui.into();
        if Self::is_valid(&eui) {
            Ok(Self(eui))
        } else {
            Err(ValueError::InvalidDeviceEui(eui))
        }
    }

    /// Returns true if `eui` is a well-formed device EUI.
    #[must_use]
    pub fn is_valid(eui: &str) -> bool {
        eui.len() == Self::LEN && eui.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Returns the EUI as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last four characters, used in display names.
    #[must_use]
    pub fn short_suffix(&self) -> &str {
        // Validated as ASCII, so byte slicing is on char boundaries.
        &self.0[Self::LEN - 4..]
    }

    /// Topic the network server publishes device uplinks on.
    #[must_use]
    pub fn uplink_topic(&self) -> String {
        format!("chirpstack/{}/upChannel", self.0)
    }

    /// Topic the network server reads device downlinks from.
    #[must_use]
    pub fn downlink_topic(&self) -> String {
        format!("chirpstack/{}/dnChannel", self.0)
    }
}

impl fmt::Display for DeviceEui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceEui {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DeviceEui {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for DeviceEui {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_sixteen_hex_chars_any_case() {
        assert!(DeviceEui::new("0123456789abcdef").is_ok());
        assert!(DeviceEui::new("0123456789ABCDEF").is_ok());
        assert!(DeviceEui::new("24e124468D123456").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(DeviceEui::new("").is_err());
        assert!(DeviceEui::new("0123456789abcde").is_err());
        assert!(DeviceEui::new("0123456789abcdef0").is_err());
    }

    #[test]
    fn rejects_non_hex_characters() {
        let err = DeviceEui::new("0123456789abcdeg").unwrap_err();
        assert_eq!(err, ValueError::InvalidDeviceEui("0123456789abcdeg".to_string()));
        assert!(DeviceEui::new("0123456789abcd-f").is_err());
        assert!(DeviceEui::new("0123456789abcd f").is_err());
    }

    #[test]
    fn rejects_multibyte_input_of_sixteen_bytes() {
        // 8 two-byte characters: 16 bytes but not hex
        assert!(DeviceEui::new("éééééééé").is_err());
    }

    #[test]
    fn preserves_case_in_topics() {
        let eui = DeviceEui::new("24E124468d123456").unwrap();
        assert_eq!(eui.uplink_topic(), "chirpstack/24E124468d123456/upChannel");
        assert_eq!(eui.downlink_topic(), "chirpstack/24E124468d123456/dnChannel");
        assert_eq!(eui.to_string(), "24E124468d123456");
    }

    #[test]
    fn short_suffix_is_last_four() {
        let eui = DeviceEui::new("0000000000001a2B").unwrap();
        assert_eq!(eui.short_suffix(), "1a2B");
    }

    #[test]
    fn deserialize_validates() {
        let eui: DeviceEui = serde_json::from_str("\"0123456789abcdef\"").unwrap();
        assert_eq!(eui.as_str(), "0123456789abcdef");
        assert!(serde_json::from_str::<DeviceEui>("\"nope\"").is_err());
    }
}

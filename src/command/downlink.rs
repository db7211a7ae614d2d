// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ChirpStack downlink envelope.

use serde::{Deserialize, Serialize};

/// LoRaWAN application port the WS523 listens on for commands.
pub const DOWNLINK_PORT: u8 = 85;

/// JSON envelope published on `chirpstack/<eui>/dnChannel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Downlink {
    /// Base64-encoded command bytes.
    pub payload_raw: String,
    /// LoRaWAN FPort.
    pub port: u8,
    /// Whether the network server requests an acknowledgement.
    pub confirmed: bool,
}

impl Downlink {
    /// Creates a confirmed downlink on [`DOWNLINK_PORT`].
    #[must_use]
    pub fn confirmed(payload_raw: String) -> Self {
        Self {
            payload_raw,
            port: DOWNLINK_PORT,
            confirmed: true,
        }
    }

    /// Serializes the envelope to JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Three plain fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WS523 downlink command definitions.
//!
//! The plug understands a handful of fixed byte sequences. They are sent
//! base64-encoded inside a ChirpStack downlink envelope on the device's
//! `dnChannel` topic.
//!
//! | Command | Bytes | `payload_raw` |
//! |---------|-------|---------------|
//! | [`PlugCommand::TurnOn`] | `08 01 00 ff` | `CAEA/w==` |
//! | [`PlugCommand::TurnOff`] | `08 00 00 ff` | `CAAA/w==` |
//! | [`PlugCommand::StatusQuery`] | `ff 28 ff` | `/yj/` |
//!
//! # Examples
//!
//! ```
//! use ws523_lib::command::{Command, PlugCommand};
//!
//! let downlink = PlugCommand::TurnOn.to_downlink();
//! assert_eq!(downlink.payload_raw, "CAEA/w==");
//! assert_eq!(downlink.port, 85);
//! assert!(downlink.confirmed);
//! ```

mod downlink;
mod power;

pub use downlink::{DOWNLINK_PORT, Downlink};
pub use power::PlugCommand;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A command that can be sent to a WS523 plug.
pub trait Command {
    /// Returns the raw bytes understood by the device firmware.
    fn bytes(&self) -> &'static [u8];

    /// Returns the base64-encoded command for the `payload_raw` field.
    fn payload_raw(&self) -> String {
        STANDARD.encode(self.bytes())
    }

    /// Wraps the command in a confirmed downlink envelope.
    fn to_downlink(&self) -> Downlink {
        Downlink::confirmed(self.payload_raw())
    }
}

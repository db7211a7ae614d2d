// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uplink decoding for WS523 telemetry.
//!
//! ChirpStack publishes every device uplink on
//! `chirpstack/<eui>/upChannel`, with the codec output nested under
//! `decoded.payload`:
//!
//! ```json
//! {"decoded": {"payload": {"socket_status": "open", "voltage": 230, "current": 120}}}
//! ```
//!
//! Any subset of the readings may be present in a given uplink. Fields
//! that are absent leave the last known value untouched, see
//! [`TelemetryRecord::merge`].
//!
//! # Examples
//!
//! ```
//! use ws523_lib::telemetry::{TelemetryField, decode_uplink};
//! use ws523_lib::types::PowerState;
//!
//! let uplink = decode_uplink(br#"{"decoded":{"payload":{"socket_status":"open","voltage":230}}}"#)?;
//! assert_eq!(uplink.socket_status, Some(PowerState::On));
//! assert_eq!(uplink.readings.get(TelemetryField::Voltage), Some(230.0));
//! assert_eq!(uplink.readings.get(TelemetryField::Current), None);
//! # Ok::<(), ws523_lib::error::ParseError>(())
//! ```

mod record;
mod uplink;

pub use record::{TelemetryField, TelemetryRecord};
pub use uplink::{Uplink, decode_uplink};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plug state types.
//!
//! [`PlugState`] is the snapshot presented to the host: switch state,
//! availability, connection state and the last known telemetry. The plug
//! publishes a new snapshot on every change.
//!
//! [`RestoredState`] is what the host persisted for the switch entity and
//! hands back when the plug is attached again.
//!
//! # Examples
//!
//! ```
//! use ws523_lib::state::{PlugState, RestoredState};
//! use ws523_lib::telemetry::TelemetryField;
//! use ws523_lib::types::PowerState;
//!
//! let restored: RestoredState = serde_json::from_str(
//!     r#"{"state": "on", "attributes": {"voltage": 229.5, "current": null}}"#,
//! ).unwrap();
//!
//! let mut state = PlugState::default();
//! state.restore(&restored);
//!
//! assert_eq!(state.power, Some(PowerState::On));
//! assert_eq!(state.telemetry.get(TelemetryField::Voltage), Some(229.5));
//! assert_eq!(state.telemetry.get(TelemetryField::Current), None);
//! ```

mod plug_state;
mod restored;

pub use plug_state::PlugState;
pub use restored::RestoredState;

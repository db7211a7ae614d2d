// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay control and status commands.

use crate::command::Command;
use crate::types::PowerState;

/// Command understood by the WS523 firmware.
///
/// # Examples
///
/// ```
/// use ws523_lib::command::{Command, PlugCommand};
/// use ws523_lib::types::PowerState;
///
/// assert_eq!(PlugCommand::set(PowerState::On), PlugCommand::TurnOn);
/// assert_eq!(PlugCommand::TurnOff.bytes(), &[0x08, 0x00, 0x00, 0xff]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlugCommand {
    /// Close the relay.
    TurnOn,
    /// Open the relay.
    TurnOff,
    /// Ask the device to report its socket status.
    StatusQuery,
}

const TURN_ON: [u8; 4] = [0x08, 0x01, 0x00, 0xff];
const TURN_OFF: [u8; 4] = [0x08, 0x00, 0x00, 0xff];
const STATUS_QUERY: [u8; 3] = [0xff, 0x28, 0xff];

impl PlugCommand {
    /// Creates the command that drives the relay to `state`.
    #[must_use]
    pub const fn set(state: PowerState) -> Self {
        match state {
            PowerState::On => Self::TurnOn,
            PowerState::Off => Self::TurnOff,
        }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::StatusQuery => "status_query",
        }
    }
}

impl Command for PlugCommand {
    fn bytes(&self) -> &'static [u8] {
        match self {
            Self::TurnOn => &TURN_ON,
            Self::TurnOff => &TURN_OFF,
            Self::StatusQuery => &STATUS_QUERY,
        }
    }
}

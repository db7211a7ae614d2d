// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ws523_lib` - drive Milesight WS523 LoRaWAN smart plugs through ChirpStack.
//!
//! The WS523 is reached through the MQTT integration of a ChirpStack network
//! server: uplinks arrive decoded on `chirpstack/<eui>/upChannel`, downlinks
//! are published base64-encoded on `chirpstack/<eui>/dnChannel`. This crate
//! turns that channel into a switch entity with five telemetry sensors.
//!
//! # Features
//!
//! - **Switch control**: on/off commands; the state follows what the device
//!   reports, never the command that was sent
//! - **Telemetry**: voltage, current, power, energy and power factor, merged
//!   into last known values and pushed to sensor entities
//! - **Connection management**: per-plug availability tracking with an
//!   unbounded retry loop (exponential backoff capped at 300 s, ±15 % jitter)
//! - **Config flow**: EUI and QoS validation, duplicate detection
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ws523_lib::config::{ConfigEntry, PlugConfig};
//! use ws523_lib::integration::Integration;
//! use ws523_lib::protocol::MqttBroker;
//! use ws523_lib::types::DeviceEui;
//!
//! #[tokio::main]
//! async fn main() -> ws523_lib::Result<()> {
//!     let broker = MqttBroker::builder()
//!         .host("192.168.1.50")
//!         .credentials("chirpstack", "secret")
//!         .build()
//!         .await?;
//!     let integration = Integration::new(Arc::new(broker));
//!
//!     let entry = ConfigEntry::new(PlugConfig::new(DeviceEui::new("24e124468d123456")?));
//!     let plug = integration.setup_entry(entry, None).await?;
//!
//!     plug.turn_on().await;
//!
//!     let mut state = plug.subscribe();
//!     while state.changed().await.is_ok() {
//!         let snapshot = state.borrow().clone();
//!         println!("power={:?} available={}", snapshot.power, snapshot.is_available());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Custom Transports
//!
//! Hosts that already hold an MQTT connection implement
//! [`protocol::Transport`] and skip the built-in [`protocol::MqttBroker`]
//! (disable the default `mqtt` feature to drop the rumqttc dependency).

pub mod command;
pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod integration;
pub mod plug;
pub mod protocol;
pub mod sensor;
pub mod state;
pub mod telemetry;
pub mod types;

pub use command::{Command, Downlink, PlugCommand};
pub use config::{ConfigEntry, ConfigFlow, PlugConfig};
pub use connection::{BackoffPolicy, ConnectionManager, ConnectionState, RetryHandle};
pub use entity::{DOMAIN, DeviceInfo, SwitchCommand, SwitchEntity};
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use integration::Integration;
pub use plug::SmartPlug;
#[cfg(feature = "mqtt")]
pub use protocol::{MqttBroker, MqttBrokerBuilder, MqttBrokerConfig};
pub use protocol::{Transport, UplinkEvent, UplinkSink};
pub use sensor::{Sensor, SensorRegistry};
pub use state::{PlugState, RestoredState};
pub use telemetry::{TelemetryField, TelemetryRecord};
pub use types::{DeviceEui, PowerState, Qos};

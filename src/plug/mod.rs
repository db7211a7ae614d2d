// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The WS523 switch adapter.
//!
//! [`SmartPlug`] ties the pieces together: it encodes host commands,
//! decodes uplinks, owns the plug's [`ConnectionManager`] and feeds the
//! sibling sensors.
//!
//! The switch state follows the device only. `turn_on`/`turn_off` publish
//! the command and leave the state alone until the device reports its new
//! socket status in an uplink.
//!
//! # Lifecycle
//!
//! ```no_run
//! use std::sync::Arc;
//! use ws523_lib::config::PlugConfig;
//! use ws523_lib::plug::SmartPlug;
//! use ws523_lib::protocol::MqttBroker;
//! use ws523_lib::sensor::SensorRegistry;
//! use ws523_lib::types::DeviceEui;
//!
//! # async fn example() -> ws523_lib::Result<()> {
//! let broker = Arc::new(MqttBroker::builder().host("192.168.1.50").build().await?);
//! let config = PlugConfig::new(DeviceEui::new("24e124468d123456")?);
//!
//! let plug = SmartPlug::builder(&config, broker)
//!     .sensors(Arc::new(SensorRegistry::new()))
//!     .build();
//!
//! plug.attach(None).await;
//! plug.turn_on().await;
//!
//! let mut state = plug.subscribe();
//! state.changed().await.ok();
//! println!("power: {:?}", state.borrow().power);
//!
//! plug.detach().await;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::SmartPlugBuilder;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::command::PlugCommand;
use crate::config::PlugConfig;
use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::entity::{DeviceInfo, SwitchCommand, SwitchEntity, switch_entity_id, switch_unique_id};
use crate::protocol::{Transport, UplinkEvent};
use crate::sensor::SensorRegistry;
use crate::state::{PlugState, RestoredState};
use crate::telemetry::decode_uplink;
use crate::types::{DeviceEui, PowerState};

/// One WS523 plug presented to the host as a switch.
pub struct SmartPlug<T: Transport> {
    core: PlugCore<T>,
    uplinks: Mutex<Option<mpsc::UnboundedReceiver<UplinkEvent>>>,
    message_task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the plug and its message task.
struct PlugCore<T: Transport> {
    eui: DeviceEui,
    connection: ConnectionManager<T>,
    sensors: Arc<SensorRegistry>,
    state: Arc<watch::Sender<PlugState>>,
}

impl<T: Transport> Clone for PlugCore<T> {
    fn clone(&self) -> Self {
        Self {
            eui: self.eui.clone(),
            connection: self.connection.clone(),
            sensors: Arc::clone(&self.sensors),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Transport> SmartPlug<T> {
    /// Creates a builder for the plug described by `config`.
    #[must_use]
    pub fn builder(config: &PlugConfig, transport: Arc<T>) -> SmartPlugBuilder<T> {
        SmartPlugBuilder::new(config, transport)
    }

    pub(crate) fn from_parts(
        eui: DeviceEui,
        connection: ConnectionManager<T>,
        uplinks: mpsc::UnboundedReceiver<UplinkEvent>,
        sensors: Arc<SensorRegistry>,
        state: Arc<watch::Sender<PlugState>>,
    ) -> Self {
        Self {
            core: PlugCore {
                eui,
                connection,
                sensors,
                state,
            },
            uplinks: Mutex::new(Some(uplinks)),
            message_task: Mutex::new(None),
        }
    }

    /// Returns the device EUI.
    #[must_use]
    pub fn eui(&self) -> &DeviceEui {
        &self.core.eui
    }

    /// Returns the device registry entry.
    #[must_use]
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::for_plug(&self.core.eui)
    }

    /// Returns the plug's connection manager.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.core.connection
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PlugState {
        self.core.state.borrow().clone()
    }

    /// Returns a receiver notified whenever the snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlugState> {
        self.core.state.subscribe()
    }

    /// Returns the record the host should persist for this plug.
    #[must_use]
    pub fn restored_state(&self) -> RestoredState {
        self.core.state.borrow().to_restored()
    }

    /// Attaches the plug to the host.
    ///
    /// Applies `restored`, starts handling uplinks and connects. If the
    /// first connection attempt fails the retry loop takes over.
    pub async fn attach(&self, restored: Option<&RestoredState>) {
        if let Some(restored) = restored {
            self.core.state.send_modify(|state| state.restore(restored));
            tracing::debug!(
                eui = %self.core.eui,
                power = ?self.core.state.borrow().power,
                "Restored plug state"
            );
        }

        self.start_message_task();

        if self.core.connection.connect().await.is_err() {
            self.core.connection.schedule_retry();
        }
    }

    fn start_message_task(&self) {
        let Some(mut uplinks) = self.uplinks.lock().take() else {
            tracing::warn!(eui = %self.core.eui, "Plug already attached");
            return;
        };

        let core = self.core.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = uplinks.recv().await {
                match event {
                    UplinkEvent::Message(payload) => core.handle_uplink(&payload).await,
                    UplinkEvent::SubscriptionLost => {
                        tracing::warn!(eui = %core.eui, "Uplink subscription lost");
                        core.connection.connection_lost();
                    }
                }
            }
            tracing::debug!(eui = %core.eui, "Uplink channel closed");
        });
        *self.message_task.lock() = Some(task);
    }

    /// Detaches the plug from the host.
    ///
    /// Stops the retry loop and the message task, waiting for both, then
    /// drops the uplink subscription.
    pub async fn detach(&self) {
        self.core.connection.cancel().await;

        let task = self.message_task.lock().take();
        if let Some(task) = task {
            task.abort();
            if let Err(e) = task.await
                && !e.is_cancelled()
            {
                tracing::error!(eui = %self.core.eui, error = %e, "Message task failed");
            }
        }

        self.core.connection.unsubscribe().await;
        tracing::info!(eui = %self.core.eui, "Plug detached");
    }

    /// Asks the device to close its relay.
    pub async fn turn_on(&self) {
        self.send(PlugCommand::TurnOn).await;
    }

    /// Asks the device to open its relay.
    pub async fn turn_off(&self) {
        self.send(PlugCommand::TurnOff).await;
    }

    async fn send(&self, command: PlugCommand) {
        // Failures are logged and recovered by the connection manager.
        let _ = self.core.connection.publish(command).await;
    }

    /// Processes one raw uplink payload.
    ///
    /// Uplinks arriving on the subscription are handled by the message
    /// task; this is for hosts that deliver payloads themselves.
    pub async fn handle_uplink(&self, payload: &[u8]) {
        self.core.handle_uplink(payload).await;
    }
}

impl<T: Transport> PlugCore<T> {
    async fn handle_uplink(&self, payload: &[u8]) {
        let uplink = match decode_uplink(payload) {
            Ok(uplink) => uplink,
            Err(e) => {
                tracing::error!(eui = %self.eui, error = %e, "Dropping uplink");
                return;
            }
        };

        let mut changed_to = None;
        self.state.send_modify(|state| {
            state.telemetry.merge(&uplink.readings);
            if let Some(reported) = uplink.socket_status
                && state.power != Some(reported)
            {
                state.power = Some(reported);
                changed_to = Some(reported);
            }
        });

        if let Some(power) = changed_to {
            tracing::info!(eui = %self.eui, state = %power, "Socket status changed");
            // Confirms the new state with the device.
            let _ = self.connection.publish(PlugCommand::StatusQuery).await;
        }

        self.connection.mark_available();

        let forwarded = self.sensors.forward(&self.eui, &uplink.readings);
        tracing::debug!(eui = %self.eui, forwarded, "Handled uplink");
    }
}

impl<T: Transport> SwitchEntity for SmartPlug<T> {
    fn entity_id(&self) -> String {
        switch_entity_id(&self.core.eui)
    }

    fn unique_id(&self) -> String {
        switch_unique_id(&self.core.eui)
    }

    fn state(&self) -> Option<PowerState> {
        self.core.state.borrow().power
    }

    fn attributes(&self) -> BTreeMap<&'static str, Option<f64>> {
        self.core.state.borrow().attributes()
    }

    fn is_available(&self) -> bool {
        self.core.connection.is_available()
    }

    async fn on_command(&self, command: SwitchCommand) {
        match command {
            SwitchCommand::TurnOn => self.turn_on().await,
            SwitchCommand::TurnOff => self.turn_off().await,
        }
    }
}

impl<T: Transport> std::fmt::Debug for SmartPlug<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartPlug")
            .field("eui", &self.core.eui)
            .field("state", &*self.core.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Keeps the snapshot's connection status in step with the manager.
pub(crate) fn mirror_status(state: &watch::Sender<PlugState>, status: ConnectionStatus) {
    state.send_if_modified(|snapshot| {
        if snapshot.connection == status {
            false
        } else {
            snapshot.connection = status;
            true
        }
    });
}

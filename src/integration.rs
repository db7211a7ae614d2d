// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setup and unload of configured plugs.
//!
//! [`Integration`] plays the host's part for each [`ConfigEntry`]: it
//! creates the five sensors, builds and attaches the switch adapter, and
//! tears both down again on unload. All plugs share one transport and one
//! [`SensorRegistry`].
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use ws523_lib::config::{ConfigEntries, ConfigFlow, FlowResult, UserInput};
//! use ws523_lib::integration::Integration;
//! use ws523_lib::protocol::MqttBroker;
//!
//! # async fn example() -> ws523_lib::Result<()> {
//! let broker = Arc::new(MqttBroker::builder().host("192.168.1.50").build().await?);
//! let integration = Integration::new(broker);
//! let entries = ConfigEntries::new();
//!
//! let input = UserInput::new("24e124468d123456");
//! if let FlowResult::CreateEntry(entry) = ConfigFlow::new().step_user(Some(input), &entries) {
//!     entries.add(entry.clone());
//!     let plug = integration.setup_entry(entry.clone(), None).await?;
//!     plug.turn_on().await;
//!     integration.unload_entry(&entry.entry_id).await;
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::ConfigEntry;
use crate::connection::BackoffPolicy;
use crate::error::{Error, Result};
use crate::plug::SmartPlug;
use crate::protocol::Transport;
use crate::sensor::{Sensor, SensorRegistry};
use crate::state::RestoredState;

struct LoadedEntry<T: Transport> {
    entry: ConfigEntry,
    plug: Arc<SmartPlug<T>>,
}

/// Loaded plugs keyed by config entry id.
pub struct Integration<T: Transport> {
    transport: Arc<T>,
    sensors: Arc<SensorRegistry>,
    backoff: BackoffPolicy,
    loaded: Mutex<HashMap<String, LoadedEntry<T>>>,
}

impl<T: Transport> Integration<T> {
    /// Creates an integration using `transport` for every plug.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            sensors: Arc::new(SensorRegistry::new()),
            backoff: BackoffPolicy::default(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the backoff policy used by plugs set up afterwards.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns the shared sensor registry.
    #[must_use]
    pub fn sensors(&self) -> &Arc<SensorRegistry> {
        &self.sensors
    }

    /// Sets up the plug of `entry`.
    ///
    /// Registers its sensors, then builds and attaches the switch adapter
    /// with the host-persisted `restored` state.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryAlreadyLoaded` if the entry is already set up.
    pub async fn setup_entry(
        &self,
        entry: ConfigEntry,
        restored: Option<&RestoredState>,
    ) -> Result<Arc<SmartPlug<T>>> {
        let eui = entry.data.device_eui.clone();

        let plug = {
            let mut loaded = self.loaded.lock();
            if loaded.contains_key(&entry.entry_id) {
                return Err(Error::EntryAlreadyLoaded(entry.entry_id));
            }

            for sensor in Sensor::all_for(&eui) {
                self.sensors.register(Arc::new(sensor));
            }

            let plug = Arc::new(
                SmartPlug::builder(&entry.data, Arc::clone(&self.transport))
                    .sensors(Arc::clone(&self.sensors))
                    .backoff(self.backoff.clone())
                    .build(),
            );
            loaded.insert(
                entry.entry_id.clone(),
                LoadedEntry {
                    entry,
                    plug: Arc::clone(&plug),
                },
            );
            plug
        };

        tracing::info!(eui = %eui, "Setting up plug");
        plug.attach(restored).await;
        Ok(plug)
    }

    /// Unloads the entry with `entry_id`.
    ///
    /// Detaches the plug, waiting for its background tasks, and removes its
    /// sensors. Returns false if the entry was not loaded.
    pub async fn unload_entry(&self, entry_id: &str) -> bool {
        let Some(loaded) = self.loaded.lock().remove(entry_id) else {
            tracing::debug!(entry_id, "Entry not loaded");
            return false;
        };

        loaded.plug.detach().await;
        let removed = self.sensors.unregister_device(loaded.plug.eui());
        tracing::info!(eui = %loaded.plug.eui(), sensors = removed, "Unloaded plug");
        true
    }

    /// Unloads every entry.
    pub async fn unload_all(&self) {
        let ids: Vec<String> = self.loaded.lock().keys().cloned().collect();
        for id in ids {
            self.unload_entry(&id).await;
        }
    }

    /// Returns the plug of `entry_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntryNotFound` if the entry is not loaded.
    pub fn plug(&self, entry_id: &str) -> Result<Arc<SmartPlug<T>>> {
        self.loaded
            .lock()
            .get(entry_id)
            .map(|loaded| Arc::clone(&loaded.plug))
            .ok_or_else(|| Error::EntryNotFound(entry_id.to_string()))
    }

    /// Returns the loaded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<ConfigEntry> {
        self.loaded
            .lock()
            .values()
            .map(|loaded| loaded.entry.clone())
            .collect()
    }

    /// Returns the number of loaded entries.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }
}

impl<T: Transport> std::fmt::Debug for Integration<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integration")
            .field("loaded", &self.loaded_count())
            .field("sensors", &self.sensors)
            .finish_non_exhaustive()
    }
}

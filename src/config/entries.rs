// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configured plug entries.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlugConfig;

/// A configured plug as the host persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Random identifier assigned at creation.
    pub entry_id: String,
    /// Duplicate-detection key; the device EUI.
    pub unique_id: String,
    /// Display title.
    pub title: String,
    /// Plug configuration.
    pub data: PlugConfig,
}

impl ConfigEntry {
    /// Creates an entry with a fresh id for `data`.
    #[must_use]
    pub fn new(data: PlugConfig) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            unique_id: data.device_eui.to_string(),
            title: data.title(),
            data,
        }
    }
}

/// The set of configured entries, keyed by entry id.
#[derive(Debug, Default)]
pub struct ConfigEntries {
    entries: RwLock<HashMap<String, ConfigEntry>>,
}

impl ConfigEntries {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing an entry with the same id.
    pub fn add(&self, entry: ConfigEntry) {
        self.entries.write().insert(entry.entry_id.clone(), entry);
    }

    /// Removes and returns the entry with `entry_id`.
    pub fn remove(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.write().remove(entry_id)
    }

    /// Returns the entry with `entry_id`.
    #[must_use]
    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.read().get(entry_id).cloned()
    }

    /// Returns true if an entry with `unique_id` exists.
    ///
    /// Unique ids are EUIs, so the comparison ignores case.
    #[must_use]
    pub fn contains_unique_id(&self, unique_id: &str) -> bool {
        self.entries
            .read()
            .values()
            .any(|entry| entry.unique_id.eq_ignore_ascii_case(unique_id))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

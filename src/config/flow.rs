// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-facing config flow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DeviceEui, Qos};

use super::{ConfigEntries, ConfigEntry, PlugConfig};

/// Form error key for the EUI field.
const FIELD_DEVICE_EUI: &str = "device_eui";
/// Form error key for the QoS field.
const FIELD_QOS: &str = "qos";

/// Values submitted through the setup form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserInput {
    pub device_eui: String,
    /// Omitted means the default, 2.
    #[serde(default)]
    pub qos: Option<i64>,
}

impl UserInput {
    /// Creates input for `device_eui` with the default QoS.
    #[must_use]
    pub fn new(device_eui: impl Into<String>) -> Self {
        Self {
            device_eui: device_eui.into(),
            qos: None,
        }
    }

    /// Sets the submitted QoS value.
    #[must_use]
    pub fn with_qos(mut self, qos: i64) -> Self {
        self.qos = Some(qos);
        self
    }
}

/// Why a flow ended without creating an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// An entry for this EUI exists.
    AlreadyConfigured,
}

/// Outcome of a flow step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    /// Show the form, with per-field error keys.
    ShowForm {
        errors: BTreeMap<&'static str, &'static str>,
    },
    /// Create the entry.
    CreateEntry(ConfigEntry),
    /// Stop the flow.
    Abort(AbortReason),
}

/// Config flow for adding a plug.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigFlow;

impl ConfigFlow {
    /// Creates a flow.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Handles the user step.
    ///
    /// Without input the empty form is shown. Invalid input shows the form
    /// again with `invalid_device_eui` / `invalid_qos` errors. An EUI that
    /// is already configured aborts the flow.
    #[must_use]
    pub fn step_user(&self, input: Option<UserInput>, existing: &ConfigEntries) -> FlowResult {
        let Some(input) = input else {
            return FlowResult::ShowForm {
                errors: BTreeMap::new(),
            };
        };

        let config = match Self::validate(&input) {
            Ok(config) => config,
            Err(errors) => return FlowResult::ShowForm { errors },
        };

        if existing.contains_unique_id(config.device_eui.as_str()) {
            tracing::debug!(eui = %config.device_eui, "Plug already configured");
            return FlowResult::Abort(AbortReason::AlreadyConfigured);
        }

        tracing::info!(eui = %config.device_eui, qos = %config.qos, "Creating plug entry");
        FlowResult::CreateEntry(ConfigEntry::new(config))
    }

    fn validate(input: &UserInput) -> Result<PlugConfig, BTreeMap<&'static str, &'static str>> {
        let mut errors = BTreeMap::new();

        let eui = DeviceEui::new(input.device_eui.as_str()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected device EUI");
            errors.insert(FIELD_DEVICE_EUI, "invalid_device_eui");
        });

        let qos = match input.qos {
            None => Ok(Qos::default()),
            Some(level) => u8::try_from(level)
                .ok()
                .and_then(|level| Qos::try_from(level).ok())
                .ok_or_else(|| {
                    tracing::debug!(level, "Rejected QoS");
                    errors.insert(FIELD_QOS, "invalid_qos");
                }),
        };

        match (eui, qos) {
            (Ok(eui), Ok(qos)) => Ok(PlugConfig::new(eui).with_qos(qos)),
            _ => Err(errors),
        }
    }
}

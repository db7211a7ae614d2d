// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smart plug builder.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::config::PlugConfig;
use crate::connection::{BackoffPolicy, ConnectionManager, StatusCallback};
use crate::protocol::Transport;
use crate::sensor::SensorRegistry;
use crate::state::PlugState;
use crate::types::{DeviceEui, Qos};

use super::{SmartPlug, mirror_status};

/// Builder for [`SmartPlug`].
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ws523_lib::config::PlugConfig;
/// use ws523_lib::connection::BackoffPolicy;
/// use ws523_lib::plug::SmartPlug;
/// use ws523_lib::protocol::MqttBroker;
/// use ws523_lib::types::{DeviceEui, Qos};
///
/// # async fn example() -> ws523_lib::Result<()> {
/// let broker = Arc::new(MqttBroker::builder().host("localhost").build().await?);
/// let config = PlugConfig::new(DeviceEui::new("24e124468d123456")?).with_qos(Qos::AtLeastOnce);
///
/// let plug = SmartPlug::builder(&config, broker)
///     .backoff(BackoffPolicy::default().with_max_delay(Duration::from_secs(60)))
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct SmartPlugBuilder<T: Transport> {
    eui: DeviceEui,
    qos: Qos,
    transport: Arc<T>,
    sensors: Option<Arc<SensorRegistry>>,
    backoff: BackoffPolicy,
}

impl<T: Transport> SmartPlugBuilder<T> {
    pub(crate) fn new(config: &PlugConfig, transport: Arc<T>) -> Self {
        Self {
            eui: config.device_eui.clone(),
            qos: config.qos,
            transport,
            sensors: None,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Sets the registry the plug forwards readings to.
    ///
    /// Without one the plug uses a private, empty registry.
    #[must_use]
    pub fn sensors(mut self, sensors: Arc<SensorRegistry>) -> Self {
        self.sensors = Some(sensors);
        self
    }

    /// Sets the retry backoff policy.
    #[must_use]
    pub fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Builds the plug. It stays idle until [`SmartPlug::attach`].
    #[must_use]
    pub fn build(self) -> SmartPlug<T> {
        let (uplink_tx, uplink_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(PlugState::default());
        let state = Arc::new(state);

        let mirror = Arc::clone(&state);
        let on_status: StatusCallback = Arc::new(move |status| mirror_status(&mirror, status));

        let connection = ConnectionManager::with_options(
            self.transport,
            self.eui.clone(),
            self.qos,
            uplink_tx,
            self.backoff,
            Some(on_status),
        );

        SmartPlug::from_parts(
            self.eui,
            connection,
            uplink_rx,
            self.sensors.unwrap_or_default(),
            state,
        )
    }
}

impl<T: Transport> std::fmt::Debug for SmartPlugBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartPlugBuilder")
            .field("eui", &self.eui)
            .field("qos", &self.qos)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

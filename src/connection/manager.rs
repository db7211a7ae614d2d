// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-plug connection state machine and retry loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::command::{Command, PlugCommand};
use crate::error::ProtocolError;
use crate::protocol::{Transport, UplinkSink};
use crate::types::{DeviceEui, Qos};

use super::{BackoffPolicy, RetryHandle};

/// Connection state of one plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not subscribed; a retry may be pending.
    #[default]
    Disconnected,
    /// A connection attempt is in progress or about to be retried.
    Connecting,
    /// Subscribed and the initial status query was accepted.
    Connected,
}

impl ConnectionState {
    /// Returns true if the plug is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Snapshot of the connection manager's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Current connection state.
    pub state: ConnectionState,
    /// Whether the plug is presented as available to the host.
    pub available: bool,
    /// Retries scheduled since the last successful connection.
    pub retry_count: u32,
}

/// Callback invoked whenever the [`ConnectionStatus`] changes.
///
/// Runs with the manager's status lock held, so calls arrive in order. It
/// must not call back into the manager.
pub type StatusCallback = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

/// Owns subscribe/publish for one plug and drives its retry loop.
///
/// Cloning is cheap and yields a handle to the same manager; the retry loop
/// holds such a clone while it runs.
pub struct ConnectionManager<T: Transport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: Arc<T>,
    eui: DeviceEui,
    qos: Qos,
    uplink_topic: String,
    downlink_topic: String,
    /// Handed to the transport on every subscribe.
    sink: UplinkSink,
    backoff: BackoffPolicy,
    status: Mutex<ConnectionStatus>,
    retry: Mutex<Option<RetryHandle>>,
    /// Set by `cancel()`; no retry loop is started afterwards.
    closed: AtomicBool,
    on_status: Option<StatusCallback>,
}

impl<T: Transport> Clone for ConnectionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a manager for `eui`. Uplinks are forwarded to `sink`.
    #[must_use]
    pub fn new(transport: Arc<T>, eui: DeviceEui, qos: Qos, sink: UplinkSink) -> Self {
        Self::with_options(transport, eui, qos, sink, BackoffPolicy::default(), None)
    }

    /// Creates a manager with a custom backoff policy and status callback.
    #[must_use]
    pub fn with_options(
        transport: Arc<T>,
        eui: DeviceEui,
        qos: Qos,
        sink: UplinkSink,
        backoff: BackoffPolicy,
        on_status: Option<StatusCallback>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                uplink_topic: eui.uplink_topic(),
                downlink_topic: eui.downlink_topic(),
                eui,
                qos,
                sink,
                backoff,
                status: Mutex::new(ConnectionStatus::default()),
                retry: Mutex::new(None),
                closed: AtomicBool::new(false),
                on_status,
            }),
        }
    }

    /// Returns the device EUI.
    #[must_use]
    pub fn eui(&self) -> &DeviceEui {
        &self.inner.eui
    }

    /// Returns the current status snapshot.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.lock()
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    /// Returns whether the plug is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status().available
    }

    /// Returns the number of retries since the last successful connection.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.status().retry_count
    }

    /// Returns true while a retry loop is running.
    #[must_use]
    pub fn is_retrying(&self) -> bool {
        self.inner
            .retry
            .lock()
            .as_ref()
            .is_some_and(RetryHandle::is_active)
    }

    /// Marks the plug available, e.g. after an uplink was received.
    pub fn mark_available(&self) {
        self.update(|status| status.available = true);
    }

    /// Subscribes to the uplink topic and sends an initial status query.
    ///
    /// On success the state becomes `Connected`, the plug available and the
    /// retry counter 0. On failure the state returns to `Disconnected`; the
    /// caller decides whether to [`schedule_retry`](Self::schedule_retry).
    ///
    /// # Errors
    ///
    /// Returns the transport error of the failed subscribe or publish.
    pub async fn connect(&self) -> Result<(), ProtocolError> {
        self.update(|status| status.state = ConnectionState::Connecting);

        match self.try_connect().await {
            Ok(()) => {
                self.update(|status| {
                    status.state = ConnectionState::Connected;
                    status.available = true;
                    status.retry_count = 0;
                });
                tracing::info!(eui = %self.inner.eui, topic = %self.inner.uplink_topic, "Plug connected");
                Ok(())
            }
            Err(e) => {
                self.update(|status| status.state = ConnectionState::Disconnected);
                tracing::error!(
                    eui = %self.inner.eui,
                    attempt = self.retry_count().saturating_add(1),
                    error = %e,
                    "Failed to connect plug"
                );
                Err(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<(), ProtocolError> {
        self.inner
            .transport
            .subscribe(&self.inner.uplink_topic, self.inner.qos, self.inner.sink.clone())
            .await?;
        self.send(PlugCommand::StatusQuery).await
    }

    /// Publishes `command` on the downlink topic.
    ///
    /// A failure marks the plug unavailable and starts the retry loop
    /// unless one is already running.
    ///
    /// # Errors
    ///
    /// Returns the transport error. The plug adapter logs it; the retry loop
    /// handles recovery.
    pub async fn publish(&self, command: PlugCommand) -> Result<(), ProtocolError> {
        match self.send(command).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    eui = %self.inner.eui,
                    command = command.name(),
                    error = %e,
                    "Failed to publish command"
                );
                self.connection_lost();
                Err(e)
            }
        }
    }

    /// Marks the plug unavailable and starts the retry loop unless one is
    /// already running.
    ///
    /// Runs on a failed publish and when the transport reports the uplink
    /// subscription lost.
    pub fn connection_lost(&self) {
        self.update(|status| {
            status.available = false;
            if status.state == ConnectionState::Connected {
                status.state = ConnectionState::Connecting;
            }
        });
        self.schedule_retry();
    }

    /// Drops the uplink subscription. A failure is only logged.
    pub async fn unsubscribe(&self) {
        if let Err(e) = self.inner.transport.unsubscribe(&self.inner.uplink_topic).await {
            tracing::warn!(
                eui = %self.inner.eui,
                topic = %self.inner.uplink_topic,
                error = %e,
                "Failed to unsubscribe plug"
            );
        }
    }

    async fn send(&self, command: PlugCommand) -> Result<(), ProtocolError> {
        let payload = command.to_downlink().to_json();
        tracing::debug!(
            eui = %self.inner.eui,
            command = command.name(),
            topic = %self.inner.downlink_topic,
            "Sending downlink"
        );
        self.inner
            .transport
            .publish(&self.inner.downlink_topic, self.inner.qos, payload)
            .await
    }

    /// Starts the retry loop unless one is already running.
    ///
    /// The loop waits [`BackoffPolicy::jittered_delay`] for the current
    /// retry count, then calls [`connect`](Self::connect). Each failed
    /// attempt increments the count; the loop ends on the first success.
    ///
    /// Returns `true` if a new loop was started.
    pub fn schedule_retry(&self) -> bool {
        let mut retry = self.inner.retry.lock();
        if self.inner.closed.load(Ordering::Acquire)
            || retry.as_ref().is_some_and(RetryHandle::is_active)
        {
            return false;
        }

        let manager = self.clone();
        *retry = Some(RetryHandle::new(tokio::spawn(manager.run_retry_loop())));
        true
    }

    async fn run_retry_loop(self) {
        loop {
            let attempt = self.retry_count();
            let delay = self.inner.backoff.jittered_delay(attempt);

            tracing::info!(
                eui = %self.inner.eui,
                attempt = attempt.saturating_add(1),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying plug connection"
            );
            tokio::time::sleep(delay).await;

            if self.connect().await.is_ok() {
                tracing::info!(eui = %self.inner.eui, retries = attempt, "Plug reconnected");
                return;
            }
            self.update(|status| status.retry_count = status.retry_count.saturating_add(1));
        }
    }

    /// Stops the retry loop, waiting until it has fully stopped.
    ///
    /// No further retry loop is started by this manager afterwards.
    pub async fn cancel(&self) {
        let handle = {
            let mut retry = self.inner.retry.lock();
            self.inner.closed.store(true, Ordering::Release);
            retry.take()
        };
        if let Some(handle) = handle {
            handle.cancel().await;
        }
    }

    fn update(&self, change: impl FnOnce(&mut ConnectionStatus)) {
        let mut status = self.inner.status.lock();
        let before = *status;
        change(&mut status);
        if *status != before
            && let Some(callback) = &self.inner.on_status
        {
            callback(*status);
        }
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("eui", &self.inner.eui)
            .field("qos", &self.inner.qos)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone MQTT connection to the network server's broker.
//!
//! One [`MqttBroker`] can carry any number of plugs: each plug subscribes
//! to its own `chirpstack/<eui>/upChannel` topic and the broker routes
//! incoming publishes to the matching sink by exact topic.
//!
//! When rumqttc re-establishes the session, every topic is subscribed again
//! from a separate task; a topic that cannot be restored is reported to its
//! sink as [`UplinkEvent::SubscriptionLost`].
//!
//! # Examples
//!
//! ```no_run
//! use ws523_lib::protocol::MqttBroker;
//!
//! # async fn example() -> ws523_lib::Result<()> {
//! let broker = MqttBroker::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! if broker.is_connected() {
//!     println!("Connected to MQTT broker");
//! }
//!
//! broker.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet};
use tokio::sync::{RwLock, oneshot};

use crate::error::ProtocolError;
use crate::protocol::{Transport, UplinkEvent, UplinkSink};
use crate::types::Qos;

/// Global counter for generating unique client IDs.
static BROKER_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Delay before polling the event loop again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the rumqttc request channel.
const REQUEST_CAPACITY: usize = 10;

/// Configuration for an MQTT broker connection.
#[derive(Debug, Clone)]
pub struct MqttBrokerConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
}

impl Default for MqttBrokerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

/// A topic subscription held by the broker.
struct TopicSubscription {
    qos: Qos,
    sink: UplinkSink,
}

/// An MQTT broker connection that can be shared across plugs.
///
/// `MqttBroker` is cheaply cloneable (via `Arc`).
#[derive(Clone)]
pub struct MqttBroker {
    inner: Arc<MqttBrokerInner>,
}

struct MqttBrokerInner {
    /// The MQTT async client for publishing.
    client: AsyncClient,
    /// Active subscriptions by exact topic.
    subscriptions: RwLock<HashMap<String, TopicSubscription>>,
    /// Configuration used for this connection.
    config: MqttBrokerConfig,
    /// Connection status.
    connected: AtomicBool,
}

impl MqttBroker {
    /// Creates a new builder for configuring an MQTT broker connection.
    #[must_use]
    pub fn builder() -> MqttBrokerBuilder {
        MqttBrokerBuilder::default()
    }

    fn from_client(client: AsyncClient, config: MqttBrokerConfig) -> Self {
        Self {
            inner: Arc::new(MqttBrokerInner {
                client,
                subscriptions: RwLock::new(HashMap::new()),
                config,
                connected: AtomicBool::new(false),
            }),
        }
    }

    /// Returns whether the broker is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns whether authentication is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.inner.config.credentials.is_some()
    }

    /// Returns the number of active topic subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.inner.subscriptions.read().await.len()
    }

    /// Routes an incoming message to the sink registered for its topic.
    async fn route_message(&self, topic: &str, payload: Vec<u8>) {
        let delivered = {
            let subscriptions = self.inner.subscriptions.read().await;
            let Some(sub) = subscriptions.get(topic) else {
                tracing::trace!(topic = %topic, "No subscriber for topic");
                return;
            };
            sub.sink.send(UplinkEvent::Message(payload)).is_ok()
        };

        if !delivered {
            // The plug behind this sink has been dropped.
            tracing::debug!(topic = %topic, "Dropping closed subscription");
            self.inner.subscriptions.write().await.remove(topic);
            // Runs on the event loop task, which must not wait on its own
            // request channel.
            if let Err(e) = self.inner.client.try_unsubscribe(topic) {
                tracing::warn!(topic = %topic, error = %e, "Failed to unsubscribe");
            }
        }
    }

    /// Re-issues every subscription after the broker session was re-established.
    ///
    /// Must run off the event loop task: each request waits for room in the
    /// request channel, which only the event loop drains.
    async fn resubscribe_all(self) {
        let topics: Vec<(String, Qos)> = self
            .inner
            .subscriptions
            .read()
            .await
            .iter()
            .map(|(topic, sub)| (topic.clone(), sub.qos))
            .collect();

        tracing::debug!(count = topics.len(), "Resubscribing topics");
        for (topic, qos) in topics {
            if let Err(e) = self.inner.client.subscribe(topic.as_str(), qos.into()).await {
                tracing::warn!(topic = %topic, error = %e, "Failed to resubscribe");
                self.drop_subscription(&topic).await;
            }
        }
    }

    /// Forgets `topic` and tells its sink that nothing more will arrive.
    async fn drop_subscription(&self, topic: &str) {
        let removed = self.inner.subscriptions.write().await.remove(topic);
        if let Some(sub) = removed {
            let _ = sub.sink.send(UplinkEvent::SubscriptionLost);
        }
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.subscriptions.write().await.clear();

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), ProtocolError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ProtocolError::TransportFailure(format!(
                "not connected to {}:{}",
                self.inner.config.host, self.inner.config.port
            )))
        }
    }
}

impl Transport for MqttBroker {
    async fn subscribe(&self, topic: &str, qos: Qos, sink: UplinkSink) -> Result<(), ProtocolError> {
        self.ensure_connected()?;

        self.inner
            .client
            .subscribe(topic, qos.into())
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner
            .subscriptions
            .write()
            .await
            .insert(topic.to_string(), TopicSubscription { qos, sink });

        tracing::debug!(topic = %topic, qos = %qos, "Subscribed to topic");
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ProtocolError> {
        if self.inner.subscriptions.write().await.remove(topic).is_none() {
            return Ok(());
        }

        tracing::debug!(topic = %topic, "Unsubscribing from topic");
        self.inner
            .client
            .unsubscribe(topic)
            .await
            .map_err(ProtocolError::Mqtt)
    }

    async fn publish(&self, topic: &str, qos: Qos, payload: String) -> Result<(), ProtocolError> {
        self.ensure_connected()?;

        tracing::debug!(topic = %topic, payload = %payload, "Publishing MQTT message");

        self.inner
            .client
            .publish(topic, qos.into(), false, payload)
            .await
            .map_err(ProtocolError::Mqtt)
    }
}

impl std::fmt::Debug for MqttBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBroker")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for creating an MQTT broker connection.
///
/// # Examples
///
/// ```no_run
/// use ws523_lib::protocol::MqttBroker;
/// use std::time::Duration;
///
/// # async fn example() -> ws523_lib::Result<()> {
/// let broker = MqttBroker::builder()
///     .url("mqtt://192.168.1.50:1883")?
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBrokerBuilder {
    config: MqttBrokerConfig,
}

impl MqttBrokerBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets host and port from a `mqtt://host:port`, `tcp://host:port` or
    /// bare `host[:port]` URL.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the port is not a number.
    pub fn url(mut self, url: &str) -> Result<Self, ProtocolError> {
        let (host, port) = parse_mqtt_url(url)?;
        self.config.host = host;
        self.config.port = port;
        Ok(self)
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Builds and connects to the MQTT broker.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> Result<MqttBroker, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let counter = BROKER_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("ws523_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);
        let broker = MqttBroker::from_client(client, self.config.clone());

        let broker_clone = broker.clone();
        let (connack_tx, connack_rx) = oneshot::channel();

        tokio::spawn(async move {
            handle_broker_events(event_loop, broker_clone, connack_tx).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                broker.inner.connected.store(true, Ordering::Release);
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        Ok(broker)
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    Ok((host, port))
}

/// Drives the rumqttc event loop for the broker connection.
///
/// Connection errors are retried by polling again; rumqttc reconnects on the
/// next poll. The loop ends when the client disconnects.
async fn handle_broker_events(
    mut event_loop: EventLoop,
    broker: MqttBroker,
    connack_tx: oneshot::Sender<()>,
) {
    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                broker.inner.connected.store(true, Ordering::Release);
                match connack_tx.take() {
                    Some(tx) => {
                        let _ = tx.send(());
                    }
                    None => {
                        tokio::spawn(broker.clone().resubscribe_all());
                    }
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(
                    topic = %publish.topic,
                    bytes = publish.payload.len(),
                    "MQTT message received"
                );
                broker
                    .route_message(&publish.topic, publish.payload.to_vec())
                    .await;
            }
            Ok(Event::Incoming(Packet::Disconnect) | Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                broker.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                broker.inner.connected.store(false, Ordering::Release);
                if connack_tx.is_some() {
                    tracing::error!(error = %e, "MQTT broker connection failed");
                    break;
                }
                tracing::warn!(error = %e, "MQTT broker event loop error, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

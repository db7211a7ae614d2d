// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messaging transport between the plug adapter and the network server.
//!
//! The adapter only needs two operations from the transport: subscribe to
//! the device uplink topic and publish downlinks. Hosts that already own an
//! MQTT connection implement [`Transport`] over it; otherwise
//! [`MqttBroker`] provides a standalone rumqttc-backed connection.
//!
//! Inbound payloads are delivered through an [`UplinkSink`], an unbounded
//! channel drained by the plug's message task, so the transport's event
//! loop never waits on uplink processing. A transport that loses a
//! subscription it cannot restore reports it on the same channel with
//! [`UplinkEvent::SubscriptionLost`]; the plug then goes unavailable and
//! retries.

#[cfg(feature = "mqtt")]
mod mqtt_broker;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "mqtt")]
pub use mqtt_broker::{MqttBroker, MqttBrokerBuilder, MqttBrokerConfig};

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::ProtocolError;
use crate::types::Qos;

/// Delivered by a transport to the sink of a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UplinkEvent {
    /// Raw payload published on the topic.
    Message(Vec<u8>),
    /// The subscription is gone; nothing more arrives until the topic is
    /// subscribed again.
    SubscriptionLost,
}

/// Channel that receives what a transport delivers for a subscribed topic.
pub type UplinkSink = mpsc::UnboundedSender<UplinkEvent>;

/// Publish/subscribe operations the plug adapter needs.
///
/// Implementations must be cheap to share: the adapter holds them in an
/// `Arc` and calls them from its retry and message tasks.
pub trait Transport: Send + Sync + 'static {
    /// Subscribes to `topic`, forwarding every payload to `sink`.
    ///
    /// Subscribing again to the same topic replaces the previous sink.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the subscription could not be issued.
    fn subscribe(
        &self,
        topic: &str,
        qos: Qos,
        sink: UplinkSink,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Stops forwarding `topic`. Unknown topics are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the unsubscribe could not be issued.
    fn unsubscribe(&self, topic: &str) -> impl Future<Output = Result<(), ProtocolError>> + Send;

    /// Publishes `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the message could not be handed to the
    /// broker.
    fn publish(
        &self,
        topic: &str,
        qos: Qos,
        payload: String,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

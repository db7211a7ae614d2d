// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::protocol::{Transport, UplinkEvent, UplinkSink};
use crate::types::Qos;

/// Records publishes and lets tests inject uplinks or force failures.
#[derive(Default)]
pub(crate) struct MockTransport {
    pub fail_subscribe: AtomicBool,
    pub fail_publish: AtomicBool,
    pub subscribe_calls: AtomicUsize,
    published: Mutex<Vec<(String, Qos, String)>>,
    sinks: Mutex<HashMap<String, UplinkSink>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Returns the `payload_raw` of every successful publish.
    pub fn published_commands(&self) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .map(|(_, _, payload)| {
                let value: serde_json::Value =
                    serde_json::from_str(payload).expect("downlink is JSON");
                value["payload_raw"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }

    pub fn published(&self) -> Vec<(String, Qos, String)> {
        self.published.lock().clone()
    }

    pub fn clear_published(&self) {
        self.published.lock().clear();
    }

    /// Delivers `payload` to the sink subscribed on `topic`.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        self.deliver(topic, UplinkEvent::Message(payload.to_vec()))
    }

    /// Drops the subscription on `topic` and tells its sink.
    pub fn lose_subscription(&self, topic: &str) -> bool {
        let sink = self.sinks.lock().remove(topic);
        sink.is_some_and(|sink| sink.send(UplinkEvent::SubscriptionLost).is_ok())
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.sinks.lock().contains_key(topic)
    }

    fn deliver(&self, topic: &str, event: UplinkEvent) -> bool {
        self.sinks
            .lock()
            .get(topic)
            .is_some_and(|sink| sink.send(event).is_ok())
    }
}

impl Transport for MockTransport {
    async fn subscribe(&self, topic: &str, _qos: Qos, sink: UplinkSink) -> Result<(), ProtocolError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ProtocolError::TransportFailure("subscribe refused".to_string()));
        }
        self.sinks.lock().insert(topic.to_string(), sink);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ProtocolError> {
        self.sinks.lock().remove(topic);
        Ok(())
    }

    async fn publish(&self, topic: &str, qos: Qos, payload: String) -> Result<(), ProtocolError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(ProtocolError::TransportFailure("publish refused".to_string()));
        }
        self.published.lock().push((topic.to_string(), qos, payload));
        Ok(())
    }
}

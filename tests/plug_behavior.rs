// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Behavior of the smart plug adapter against a scripted transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use ws523_lib::config::PlugConfig;
use ws523_lib::connection::{BackoffPolicy, ConnectionState};
use ws523_lib::entity::{SwitchCommand, SwitchEntity};
use ws523_lib::error::ProtocolError;
use ws523_lib::plug::SmartPlug;
use ws523_lib::protocol::{Transport, UplinkEvent, UplinkSink};
use ws523_lib::sensor::{Sensor, SensorRegistry};
use ws523_lib::state::{PlugState, RestoredState};
use ws523_lib::telemetry::TelemetryField;
use ws523_lib::types::{DeviceEui, PowerState, Qos};

const EUI: &str = "24E124468D00A1B2";
const TURN_ON: &str = "CAEA/w==";
const TURN_OFF: &str = "CAAA/w==";
const STATUS_QUERY: &str = "/yj/";

/// Transport that records downlinks and lets tests push uplinks.
#[derive(Default)]
struct ScriptedTransport {
    offline: AtomicBool,
    subscribes: AtomicUsize,
    downlinks: Mutex<Vec<(String, Qos, Value)>>,
    sinks: Mutex<HashMap<String, UplinkSink>>,
}

impl ScriptedTransport {
    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    fn payloads(&self) -> Vec<String> {
        self.downlinks
            .lock()
            .iter()
            .map(|(_, _, body)| body["payload_raw"].as_str().unwrap().to_string())
            .collect()
    }

    fn clear(&self) {
        self.downlinks.lock().clear();
    }

    fn uplink(&self, json: &str) {
        let topic = format!("chirpstack/{EUI}/upChannel");
        let sinks = self.sinks.lock();
        let sink = sinks.get(&topic).expect("plug subscribed");
        sink.send(UplinkEvent::Message(json.as_bytes().to_vec())).unwrap();
    }

    fn check_online(&self) -> Result<(), ProtocolError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ProtocolError::TransportFailure("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Transport for ScriptedTransport {
    async fn subscribe(&self, topic: &str, _qos: Qos, sink: UplinkSink) -> Result<(), ProtocolError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.sinks.lock().insert(topic.to_string(), sink);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), ProtocolError> {
        self.sinks.lock().remove(topic);
        Ok(())
    }

    async fn publish(&self, topic: &str, qos: Qos, payload: String) -> Result<(), ProtocolError> {
        self.check_online()?;
        let body = serde_json::from_str(&payload).unwrap();
        self.downlinks.lock().push((topic.to_string(), qos, body));
        Ok(())
    }
}

struct Fixture {
    transport: Arc<ScriptedTransport>,
    sensors: Arc<SensorRegistry>,
    plug: SmartPlug<ScriptedTransport>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_qos(Qos::ExactlyOnce)
    }

    fn with_qos(qos: Qos) -> Self {
        let transport = Arc::new(ScriptedTransport::default());
        let eui = DeviceEui::new(EUI).unwrap();
        let sensors = Arc::new(SensorRegistry::new());
        for sensor in Sensor::all_for(&eui) {
            sensors.register(Arc::new(sensor));
        }
        let plug = SmartPlug::builder(&PlugConfig::new(eui).with_qos(qos), Arc::clone(&transport))
            .sensors(Arc::clone(&sensors))
            .build();
        Self {
            transport,
            sensors,
            plug,
        }
    }

    fn sensor(&self, field: TelemetryField) -> Option<f64> {
        self.sensors
            .get(self.plug.eui(), field)
            .and_then(|sensor| sensor.native_value())
    }
}

async fn wait_for(rx: &mut watch::Receiver<PlugState>, predicate: impl FnMut(&PlugState) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state reached in time")
        .expect("plug alive");
}

fn restored(state: &str) -> RestoredState {
    RestoredState {
        state: state.to_string(),
        ..RestoredState::default()
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn envelope_and_topic() {
        let fx = Fixture::with_qos(Qos::AtLeastOnce);
        fx.plug.attach(None).await;

        let downlinks = fx.transport.downlinks.lock().clone();
        assert_eq!(downlinks.len(), 1);
        let (topic, qos, body) = &downlinks[0];
        assert_eq!(topic, &format!("chirpstack/{EUI}/dnChannel"));
        assert_eq!(*qos, Qos::AtLeastOnce);
        assert_eq!(
            *body,
            serde_json::json!({"payload_raw": STATUS_QUERY, "port": 85, "confirmed": true})
        );

        fx.plug.detach().await;
    }

    #[tokio::test]
    async fn payloads_do_not_depend_on_state() {
        for initial in ["on", "off", "unknown"] {
            let fx = Fixture::new();
            fx.plug.attach(Some(&restored(initial))).await;
            fx.transport.clear();

            fx.plug.turn_on().await;
            fx.plug.turn_on().await;
            fx.plug.turn_off().await;
            fx.plug.on_command(SwitchCommand::TurnOff).await;

            assert_eq!(
                fx.transport.payloads(),
                [TURN_ON, TURN_ON, TURN_OFF, TURN_OFF],
                "initial state {initial}"
            );
            fx.plug.detach().await;
        }
    }

    #[tokio::test]
    async fn state_follows_device_report_only() {
        let fx = Fixture::new();
        fx.plug.attach(Some(&restored("off"))).await;
        let mut rx = fx.plug.subscribe();

        fx.plug.turn_on().await;
        assert_eq!(fx.plug.state(), Some(PowerState::Off));

        fx.transport
            .uplink(r#"{"decoded":{"payload":{"socket_status":"open"}}}"#);
        wait_for(&mut rx, |state| state.power == Some(PowerState::On)).await;
        assert_eq!(fx.plug.state(), Some(PowerState::On));

        fx.plug.detach().await;
    }
}

// ============================================================================
// Uplinks
// ============================================================================

mod uplinks {
    use super::*;

    #[tokio::test]
    async fn closed_status_while_on_flips_and_queries_once() {
        let fx = Fixture::new();
        fx.plug.attach(Some(&restored("on"))).await;
        fx.transport.clear();
        let mut rx = fx.plug.subscribe();

        fx.transport
            .uplink(r#"{"decoded":{"payload":{"socket_status":"closed"}}}"#);
        wait_for(&mut rx, |state| state.power == Some(PowerState::Off)).await;

        assert_eq!(fx.transport.payloads(), [STATUS_QUERY]);
        fx.plug.detach().await;
    }

    #[tokio::test]
    async fn repeated_status_does_not_query() {
        let fx = Fixture::new();
        fx.plug.attach(Some(&restored("on"))).await;
        fx.transport.clear();

        fx.plug
            .handle_uplink(br#"{"decoded":{"payload":{"socket_status":"open"}}}"#)
            .await;

        assert_eq!(fx.plug.state(), Some(PowerState::On));
        assert!(fx.transport.payloads().is_empty());
        fx.plug.detach().await;
    }

    #[tokio::test]
    async fn partial_uplink_keeps_other_fields() {
        let fx = Fixture::new();
        let restored: RestoredState = serde_json::from_str(
            r#"{
                "state": "off",
                "attributes": {
                    "voltage": 221,
                    "current": 410,
                    "active_power": 88,
                    "power_consumption": 5120,
                    "power_factor": 96
                }
            }"#,
        )
        .unwrap();
        fx.plug.attach(Some(&restored)).await;

        fx.plug
            .handle_uplink(br#"{"decoded":{"payload":{"socket_status":"open","voltage":230}}}"#)
            .await;

        assert_eq!(fx.plug.state(), Some(PowerState::On));
        let attributes = fx.plug.attributes();
        assert_eq!(attributes["voltage"], Some(230.0));
        assert_eq!(attributes["current"], Some(410.0));
        assert_eq!(attributes["active_power"], Some(88.0));
        assert_eq!(attributes["power_consumption"], Some(5120.0));
        assert_eq!(attributes["power_factor"], Some(96.0));

        assert_eq!(fx.sensor(TelemetryField::Voltage), Some(230.0));
        assert_eq!(fx.sensor(TelemetryField::Current), None, "only reported fields are pushed");
        fx.plug.detach().await;
    }

    #[tokio::test]
    async fn missing_decoded_payload_changes_nothing() {
        let fx = Fixture::new();
        fx.plug.attach(Some(&restored("on"))).await;
        fx.plug
            .handle_uplink(br#"{"decoded":{"payload":{"voltage":229}}}"#)
            .await;
        fx.transport.clear();
        let before = fx.plug.snapshot();

        for payload in [
            r#"{"decoded":{}}"#,
            r#"{"payload":{"socket_status":"closed"}}"#,
            r#"{"decoded":{"payload":"socket_status=closed"}}"#,
            r#"["decoded"]"#,
            "{not json",
        ] {
            fx.plug.handle_uplink(payload.as_bytes()).await;
        }

        assert_eq!(fx.plug.snapshot(), before);
        assert!(fx.transport.payloads().is_empty());
        assert_eq!(fx.sensor(TelemetryField::Voltage), Some(229.0));
        fx.plug.detach().await;
    }

    #[tokio::test]
    async fn telemetry_reaches_all_sensors() {
        let fx = Fixture::new();
        fx.plug.attach(None).await;
        let mut rx = fx.plug.subscribe();

        fx.transport.uplink(
            r#"{"decoded":{"payload":{
                "voltage": 229.8,
                "current": 512,
                "active_power": 117,
                "power_consumption": 20480,
                "power_factor": 99
            }}}"#,
        );
        wait_for(&mut rx, |state| state.telemetry.get(TelemetryField::PowerFactor).is_some()).await;

        assert_eq!(fx.sensor(TelemetryField::Voltage), Some(229.8));
        assert_eq!(fx.sensor(TelemetryField::Current), Some(512.0));
        assert_eq!(fx.sensor(TelemetryField::ActivePower), Some(117.0));
        assert_eq!(fx.sensor(TelemetryField::PowerConsumption), Some(20480.0));
        assert_eq!(fx.sensor(TelemetryField::PowerFactor), Some(99.0));
        assert_eq!(fx.plug.state(), None);
        fx.plug.detach().await;
    }
}

// ============================================================================
// Connection and Retry
// ============================================================================

mod retry {
    use super::*;

    #[tokio::test]
    async fn successful_connect_resets_counter() {
        let fx = Fixture::new();
        fx.plug.attach(None).await;

        let snapshot = fx.plug.snapshot();
        assert_eq!(snapshot.connection.state, ConnectionState::Connected);
        assert_eq!(snapshot.connection.retry_count, 0);
        assert!(snapshot.is_available());
        fx.plug.detach().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_outage() {
        let fx = Fixture::new();
        fx.transport.set_offline(true);
        fx.plug.attach(None).await;
        assert!(!fx.plug.is_available());
        assert_eq!(fx.transport.subscribes(), 1);

        // First retry lands within 5 s ± 15 %, the second within 10 s ± 15 % after it.
        tokio::time::sleep(Duration::from_millis(5800)).await;
        assert_eq!(fx.transport.subscribes(), 2);
        assert_eq!(fx.plug.snapshot().connection.retry_count, 1);

        fx.transport.set_offline(false);
        tokio::time::sleep(Duration::from_millis(11_600)).await;
        assert_eq!(fx.transport.subscribes(), 3);
        assert!(fx.plug.is_available());
        assert_eq!(fx.plug.snapshot().connection.retry_count, 0);
        assert!(!fx.plug.connection().is_retrying());

        fx.plug.detach().await;
    }

    #[tokio::test(start_paused = true)]
    async fn publish_failure_starts_single_retry_loop() {
        let fx = Fixture::new();
        fx.plug.attach(None).await;
        assert_eq!(fx.transport.subscribes(), 1);

        fx.transport.set_offline(true);
        fx.plug.turn_on().await;
        fx.plug.turn_off().await;
        assert!(!fx.plug.is_available());
        assert_eq!(fx.plug.connection().state(), ConnectionState::Connecting);
        assert!(fx.plug.connection().is_retrying());

        fx.transport.set_offline(false);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fx.transport.subscribes(), 2, "one loop, one reconnect");
        assert!(fx.plug.is_available());

        fx.plug.detach().await;
    }

    #[tokio::test(start_paused = true)]
    async fn detach_during_retry_wait_stops_attempts() {
        let fx = Fixture::new();
        fx.transport.set_offline(true);
        fx.plug.attach(None).await;
        assert!(fx.plug.connection().is_retrying());

        tokio::time::sleep(Duration::from_secs(2)).await;
        fx.plug.detach().await;
        let attempts = fx.transport.subscribes();

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(fx.transport.subscribes(), attempts);
        assert!(!fx.plug.connection().is_retrying());
        assert!(!fx.plug.connection().schedule_retry());
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = BackoffPolicy::default();
        for n in 0..16 {
            let expected = (5.0 * 2f64.powi(n)).min(300.0);
            let base = policy.base_delay(n.unsigned_abs()).as_secs_f64();
            assert!((base - expected).abs() < 1e-9, "n={n}: {base} != {expected}");

            for _ in 0..50 {
                let jittered = policy.jittered_delay(n.unsigned_abs()).as_secs_f64();
                assert!(
                    jittered >= expected * 0.85 - 1e-6 && jittered <= expected * 1.15 + 1e-6,
                    "n={n}: {jittered} outside ±15 % of {expected}"
                );
            }
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the WS523 library.
//!
//! The hierarchy mirrors where a failure is contained:
//!
//! - [`ValueError`]: configuration-time validation (device EUI, QoS level)
//! - [`ParseError`]: uplink decoding; such messages are logged and dropped
//! - [`ProtocolError`]: transport failures; these flip availability and
//!   start the retry loop instead of propagating to the host

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding an uplink.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The requested config entry is not loaded.
    #[error("config entry not found: {0}")]
    EntryNotFound(String),

    /// The config entry is already set up.
    #[error("config entry already loaded: {0}")]
    EntryAlreadyLoaded(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The device EUI is not exactly 16 hexadecimal characters.
    #[error("invalid device EUI: {0:?}")]
    InvalidDeviceEui(String),

    /// The QoS level is not 0, 1 or 2.
    #[error("invalid QoS level {0}, expected 0, 1 or 2")]
    InvalidQos(u8),
}

/// Errors raised by the messaging transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// A subscribe or publish was rejected by the transport.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to decoding uplink messages.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The JSON does not have the expected `decoded.payload` object.
    #[error("unexpected uplink shape: {0}")]
    UnexpectedShape(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidQos(3);
        assert_eq!(err.to_string(), "invalid QoS level 3, expected 0, 1 or 2");
    }

    #[test]
    fn error_from_value_error() {
        let value_err = ValueError::InvalidDeviceEui("xyz".to_string());
        let err: Error = value_err.into();
        assert!(matches!(err, Error::Value(ValueError::InvalidDeviceEui(_))));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::UnexpectedShape("missing decoded.payload".to_string());
        assert_eq!(
            err.to_string(),
            "unexpected uplink shape: missing decoded.payload"
        );
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::TransportFailure("broker gone".to_string());
        assert_eq!(err.to_string(), "transport failure: broker gone");
    }
}

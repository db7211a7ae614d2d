// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection management for a single plug.
//!
//! The transport is shared and may not reconnect individual topic
//! subscriptions on its own, so each plug runs its own retry loop:
//!
//! ```text
//!   Disconnected ──connect()──▶ Connecting ──subscribe + status query ok──▶ Connected
//!        ▲                          │                                           │
//!        └──────── attempt fails ───┘◀──────────── publish fails ───────────────┘
//!                 (retry after backoff)           (retry loop started)
//! ```
//!
//! Retries are unbounded. Delays follow [`BackoffPolicy`]: `5s × 2^n`,
//! capped at 300 s, with ±15 % uniform jitter.

mod backoff;
mod manager;
mod retry;

pub use backoff::BackoffPolicy;
pub use manager::{ConnectionManager, ConnectionState, ConnectionStatus, StatusCallback};
pub use retry::RetryHandle;

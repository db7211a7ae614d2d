// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capped exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay schedule between connection attempts.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ws523_lib::connection::BackoffPolicy;
///
/// let policy = BackoffPolicy::default();
/// assert_eq!(policy.base_delay(0), Duration::from_secs(5));
/// assert_eq!(policy.base_delay(3), Duration::from_secs(40));
/// assert_eq!(policy.base_delay(10), Duration::from_secs(300));
///
/// let jittered = policy.jittered_delay(0);
/// assert!(jittered >= Duration::from_millis(4200) && jittered <= Duration::from_millis(5800));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay before jitter.
    pub max_delay: Duration,
    /// Maximum relative jitter, applied uniformly in `[-jitter, +jitter]`.
    pub jitter: f64,
}

impl BackoffPolicy {
    /// Creates a policy with the default schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound on the delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the relative jitter, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Returns `min(initial × 2^retry_count, max)`.
    #[must_use]
    pub fn base_delay(&self, retry_count: u32) -> Duration {
        2u32.checked_pow(retry_count)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Returns the base delay with uniform random jitter applied.
    #[must_use]
    pub fn jittered_delay(&self, retry_count: u32) -> Duration {
        let offset = rand::rng().random_range(-1.0..=1.0);
        self.apply_jitter(self.base_delay(retry_count), offset)
    }

    /// Scales `base` by `1 + jitter × offset`, where `offset` is in `[-1, 1]`.
    #[must_use]
    pub fn apply_jitter(&self, base: Duration, offset: f64) -> Duration {
        base.mul_f64(1.0 + self.jitter * offset.clamp(-1.0, 1.0))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            jitter: 0.15,
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Handle to a running retry loop.

use tokio::task::JoinHandle;

/// Handle to the background retry loop of one plug.
///
/// The loop ends on its own once a connection attempt succeeds; until
/// then it can only be stopped through [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct RetryHandle {
    task: JoinHandle<()>,
}

impl RetryHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Returns true while the loop has not finished.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Aborts the loop and waits until it has stopped.
    ///
    /// The resulting cancellation is expected and is not reported.
    pub async fn cancel(self) {
        self.task.abort();
        match self.task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Retry loop cancelled");
            }
            Err(e) => {
                tracing::error!(error = %e, "Retry loop panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_sleeping_task() {
        let handle = RetryHandle::new(tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }));
        assert!(handle.is_active());
        handle.cancel().await;
    }

    #[tokio::test]
    async fn finished_task_is_inactive() {
        let handle = RetryHandle::new(tokio::spawn(async {}));
        tokio::task::yield_now().await;
        while handle.is_active() {
            tokio::task::yield_now().await;
        }
        handle.cancel().await;
    }
}

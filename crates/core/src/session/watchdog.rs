//! Periodic expiry check
//!
//! Logs the session out as soon as its token expires, even when no request
//! is in flight to notice.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SessionContext;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);
const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Handle to the background expiry check; cancelled on drop
#[derive(Debug)]
pub struct ExpiryWatchdog {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ExpiryWatchdog {
    /// Returns true while the background task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the task and wait for it to finish.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        let Some(handle) = self.handle.take() else {
            return;
        };
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(Ok(())) => info!("Expiry watchdog stopped"),
            Ok(Err(e)) => warn!(error = %e, "Expiry watchdog task failed"),
            Err(_) => warn!("Expiry watchdog did not stop within timeout"),
        }
    }
}

impl Drop for ExpiryWatchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl SessionContext {
    /// Run [`check_expiration`] every `period` until the returned handle is
    /// stopped or dropped. The first check runs immediately.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// [`check_expiration`]: SessionContext::check_expiration
    pub fn spawn_expiry_watchdog(self: &Arc<Self>, period: Duration) -> ExpiryWatchdog {
        let cancel = CancellationToken::new();
        let session = Arc::clone(self);
        let token = cancel.clone();
        let period = period.max(MIN_PERIOD);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("Expiry watchdog cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        if session.check_expiration() {
                            info!("Expiry watchdog ended the session");
                        }
                    }
                }
            }
        });

        info!(period_secs = period.as_secs_f64(), "Expiry watchdog started");
        ExpiryWatchdog { cancel, handle: Some(handle) }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use serde_json::json;

    use super::*;
    use crate::session::token::tests::token_with;
    use crate::session::MemorySessionStorage;
    use crate::testing::FixedClock;

    #[tokio::test(start_paused = true)]
    async fn watchdog_logs_out_once_token_expires() {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let session = Arc::new(SessionContext::with_clock(
            Arc::new(MemorySessionStorage::new()),
            clock.clone(),
        ));
        session.set_token(token_with(&json!({"exp": start.timestamp() + 30})), None).unwrap();

        let mut watchdog = session.spawn_expiry_watchdog(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(session.is_authenticated());

        clock.advance(ChronoDuration::seconds(31));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!session.is_authenticated());

        watchdog.stop().await;
        assert!(!watchdog.is_running());
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels_the_task() {
        let session = Arc::new(SessionContext::new(Arc::new(MemorySessionStorage::new())));
        let watchdog = session.spawn_expiry_watchdog(Duration::from_millis(20));
        assert!(watchdog.is_running());
        drop(watchdog);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(Arc::strong_count(&session), 1);
    }
}

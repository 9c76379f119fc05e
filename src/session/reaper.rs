use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::store::SessionStore;

/// Periodically drops idle sessions until cancelled.
pub struct SessionReaper {
    task: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl SessionReaper {
    pub fn start(store: SessionStore, interval: Duration, cancel_token: CancellationToken) -> Self {
        let token = cancel_token.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Session reaper stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let expired = store.expire_idle();
                        debug!("Reaper pass expired {} sessions", expired.len());
                    }
                }
            }
        });
        Self { task, cancel_token }
    }

    pub async fn stop(self) {
        self.cancel_token.cancel();
        let _ = self.task.await;
    }
}

//! Periodic status polling.
//!
//! A single spawned task that hits `GET /get_status` on a fixed period and
//! reports each result to the app loop. No backoff, no retries: failures are
//! counted by the store, and the poller just keeps going until the channel
//! closes or the task is aborted.

use crate::app::AppMessage;
use crate::client::ProxyClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default seconds between status polls.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(5);

/// Spawn the status poll loop.
///
/// The first interval tick is consumed immediately (the initial status fetch
/// belongs to app startup); afterwards one poll goes out per period. The
/// task ends on its own when the receiving side of `tx` is gone.
pub fn spawn_status_poller(
    client: Arc<ProxyClient>,
    period: Duration,
    tx: UnboundedSender<AppMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            interval.tick().await;
            let result = client.get_status().await;
            if let Err(ref error) = result {
                debug!("status poll failed: {error}");
            }
            if tx.send(AppMessage::StatusFetched(result)).is_err() {
                break;
            }
        }
    })
}

use crate::commands::map::pump_sessions;
use crate::state::RuntimeState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Pumps every mounted map session once per frame until `shutdown` flips to
/// true or its sender is dropped.
pub fn spawn_frame_loop(
    state: Arc<RuntimeState>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = pump_sessions(&state) {
                        tracing::warn!("frame pump failed: {error}");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("frame loop stopped");
    })
}

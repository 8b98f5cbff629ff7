//! Fixed-interval runner for the background tick.

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::MonitorError;

/// Run `tick` every `period`, starting one period from now. Ticks run to
/// completion and never overlap; a slow tick delays the next one.
///
/// Returns only when a tick reports an error that is fatal to trust in the log.
pub async fn run_periodic<F, Fut>(name: &str, period: Duration, mut tick: F) -> MonitorError
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), MonitorError>>,
{
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("{} task scheduled every {:?}", name, period);

    loop {
        interval.tick().await;
        match tick().await {
            Ok(()) => {}
            Err(e) if e.is_fatal_to_trust() => {
                error!("{} task halted: {}", name, e);
                return e;
            }
            Err(e) => warn!("{} tick failed, retrying next interval: {}", name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_running_until_fatal() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = run_periodic("test", Duration::from_secs(30), move || {
            let counter = counter.clone();
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(()),
                    1 => Err(MonitorError::NetworkError("timeout".into())),
                    _ => Err(MonitorError::ConsistencyViolation {
                        previous: 100,
                        current: 90,
                    }),
                }
            }
        })
        .await;

        assert!(err.is_fatal_to_trust());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

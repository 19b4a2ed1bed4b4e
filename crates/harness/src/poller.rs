//! Deadline-bounded condition polling.
//!
//! Everything the harness waits for -- a service process appearing, a
//! mount releasing -- goes through [`wait_until`] rather than a fixed
//! sleep, so a condition that is already true costs one probe and a
//! condition that never comes true fails loudly with what was being
//! waited for.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use volharness_core::error::HarnessError;

/// Poll `probe` every `interval` until it returns true or `timeout`
/// elapses.
///
/// The probe is evaluated immediately, then once per interval. A probe
/// that never succeeds yields [`HarnessError::Timeout`] no earlier than
/// `timeout` after the call began. Probe errors are the probe's own
/// business; it reports only true or false.
pub async fn wait_until<F, Fut>(
    what: &str,
    interval: Duration,
    timeout: Duration,
    probe: F,
) -> Result<(), HarnessError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        trace!(what, attempts, "probing condition");
        if probe().await {
            debug!(what, attempts, elapsed = ?started.elapsed(), "condition met");
            return Ok(());
        }
        tokio::time::sleep(interval).await;
        if Instant::now() >= deadline {
            return Err(HarnessError::Timeout {
                what: what.to_owned(),
                waited: started.elapsed(),
            });
        }
    }
}

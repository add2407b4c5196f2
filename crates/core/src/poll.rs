//! Bounded fixed-interval polling.
//!
//! [`poll_until`] calls a probe, sleeps `interval` on the supplied [`Clock`],
//! and repeats until the probe reports [`PollState::Ready`], the probe
//! errors, or `max_wait` has elapsed. The probe result is always inspected
//! before the deadline, so a terminal state read in the last cycle wins
//! over the timeout. No probe is issued once `max_wait` has been reached.

use std::future::Future;
use std::time::Duration;

use crate::clock::Clock;

/// Outcome of one probe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    Ready(T),
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError<E> {
    /// The probe itself returned an error; polling stopped immediately.
    #[error("{0}")]
    Probe(E),

    #[error("gave up after {attempts} polls ({elapsed:?} elapsed)")]
    TimedOut { elapsed: Duration, attempts: u32 },
}

pub async fn poll_until<T, E, F, Fut>(
    clock: &dyn Clock,
    policy: PollPolicy,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollState<T>, E>>,
{
    let start = clock.now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if let PollState::Ready(value) = probe().await.map_err(PollError::Probe)? {
            return Ok(value);
        }

        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= policy.max_wait {
            return Err(PollError::TimedOut { elapsed, attempts });
        }

        // Never sleep past the deadline.
        clock
            .sleep(policy.interval.min(policy.max_wait - elapsed))
            .await;

        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= policy.max_wait {
            return Err(PollError::TimedOut { elapsed, attempts });
        }
    }
}

//! Bounded, rate-limited dispatch of remote requests.

use std::{
    future::Future,
    sync::Mutex,
    time::{Duration, Instant},
};

use futures::{StreamExt, TryStreamExt, stream};

/// Hands out dispatch slots at least `interval` apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait until this caller's slot comes up.
    pub async fn acquire(&self) {
        let delay = {
            let mut next_slot = match self.next_slot.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let slot = next_slot.map_or(now, |next| next.max(now));
            *next_slot = Some(slot + self.interval);
            slot.saturating_duration_since(now)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Runs jobs with at most `concurrency` in flight, each throttled.
///
/// Results come back in input order. The first error stops the queue and
/// drops every job still pending or in flight.
pub async fn run_queue<I, T, E, F, Fut>(
    items: I,
    concurrency: usize,
    interval: Duration,
    job: F,
) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let throttle = Throttle::new(interval);
    let throttle = &throttle;
    let job = &job;
    stream::iter(items)
        .map(|item| async move {
            throttle.acquire().await;
            job(item).await
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

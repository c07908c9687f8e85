use std::{collections::VecDeque, time::Duration};
use tokio::{
    sync::Mutex,
    time::{Instant, sleep},
};
use tracing::debug;

pub(crate) const WINDOW: Duration = Duration::from_millis(1000);
pub(crate) const SAFETY_MARGIN: Duration = Duration::from_millis(10);

/// Dispatch timestamps of the trailing window, oldest first.
///
/// Entries are only dropped once they are older than [`WINDOW`], never by
/// count, so runs sharing one window with different limits each see the full
/// history. Sequential and batched runs share this one policy.
#[derive(Debug, Default)]
pub(crate) struct Window {
    timestamps: VecDeque<Instant>,
}

fn is_inside(timestamp: &Instant, now: Instant) -> bool {
    now.saturating_duration_since(*timestamp) < WINDOW
}

impl Window {
    /// How long a dispatch at `now` has to wait. A `limit` of zero is unlimited.
    ///
    /// With `limit` or more dispatches inside the window, the next one has to
    /// wait for the `limit`-th most recent of them to leave it.
    pub fn delay(&self, limit: u32, now: Instant) -> Duration {
        let limit = limit as usize;

        if limit == 0 || self.timestamps.len() < limit {
            return Duration::ZERO;
        }

        let inside: Vec<&Instant> = self
            .timestamps
            .iter()
            .filter(|timestamp| is_inside(timestamp, now))
            .collect();

        if inside.len() < limit {
            return Duration::ZERO;
        }

        let blocking = inside[inside.len() - limit];

        (*blocking + WINDOW + SAFETY_MARGIN).saturating_duration_since(now)
    }

    pub fn record(&mut self, timestamp: Instant, now: Instant) {
        let at = self.timestamps.partition_point(|existing| existing <= &timestamp);
        self.timestamps.insert(at, timestamp);

        while self
            .timestamps
            .front()
            .is_some_and(|oldest| !is_inside(oldest, now))
        {
            self.timestamps.pop_front();
        }
    }

    pub fn in_window(&self, now: Instant) -> usize {
        self.timestamps
            .iter()
            .filter(|timestamp| is_inside(timestamp, now))
            .count()
    }
}

/// Sliding-window throttle allowing at most `limit` dispatches in any
/// trailing second.
///
/// A standalone run owns a private limiter, a [`Pool`](crate::Pool) shares one
/// between every run started through it.
#[derive(Debug, Default)]
pub struct RateLimiter {
    window: Mutex<Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until a dispatch fits into the window and returns the time waited.
    ///
    /// Computing the delay and recording the dispatch happen under one lock:
    /// the reserved instant (`now + delay`) is recorded before sleeping, so
    /// concurrent callers queue up behind each other's reservations instead
    /// of all seeing spare capacity at once.
    pub async fn acquire(&self, limit: u32) -> Duration {
        if limit == 0 {
            return Duration::ZERO;
        }

        let delay = {
            let mut window = self.window.lock().await;
            let now = Instant::now();
            let delay = window.delay(limit, now);

            window.record(now + delay, now);

            delay
        };

        if !delay.is_zero() {
            debug!(?delay, limit, "rate limit reached, delaying dispatch");
            sleep(delay).await;
        }

        delay
    }

    /// Number of dispatches recorded inside the trailing window.
    pub async fn in_window(&self) -> usize {
        self.window.lock().await.in_window(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn unlimited_never_waits() {
        let limiter = RateLimiter::new();
        let mut window = Window::default();
        let now = Instant::now();

        for _ in 0..100 {
            assert_eq!(limiter.acquire(0).await, Duration::ZERO);
            window.record(now, now);
            assert_eq!(window.delay(0, now), Duration::ZERO);
        }

        assert_eq!(limiter.in_window().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_until_oldest_leaves_window() {
        let mut window = Window::default();
        let start = Instant::now();

        for _ in 0..3 {
            assert_eq!(window.delay(3, start), Duration::ZERO);
            window.record(start, start);
        }

        assert_eq!(window.delay(3, start), WINDOW + SAFETY_MARGIN);

        let later = start + Duration::from_millis(400);
        assert_eq!(
            window.delay(3, later),
            Duration::from_millis(600) + SAFETY_MARGIN
        );

        let expired = start + WINDOW;
        assert_eq!(window.delay(3, expired), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn prunes_by_age_only() {
        let mut window = Window::default();
        let start = Instant::now();

        for _ in 0..10 {
            window.record(start, start);
        }
        assert_eq!(window.in_window(start), 10);

        let later = start + Duration::from_millis(1500);
        window.record(later, later);
        assert_eq!(window.timestamps.len(), 1);
        assert_eq!(window.in_window(later), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_limit_th_most_recent() {
        let mut window = Window::default();
        let start = Instant::now();

        for millis in [0, 100, 200, 300] {
            let at = start + Duration::from_millis(millis);
            window.record(at, at);
        }

        let now = start + Duration::from_millis(300);
        assert_eq!(
            window.delay(2, now),
            Duration::from_millis(900) + SAFETY_MARGIN
        );
        assert_eq!(
            window.delay(4, now),
            Duration::from_millis(700) + SAFETY_MARGIN
        );
        assert_eq!(window.delay(5, now), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn reservations_stay_sorted() {
        let mut window = Window::default();
        let start = Instant::now();

        window.record(start + Duration::from_millis(900), start);
        window.record(start, start);
        window.record(start + Duration::from_millis(100), start);

        let ordered = window.timestamps.iter().is_sorted();
        assert!(ordered);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_spaces_dispatches() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        let mut passed = Vec::new();

        for _ in 0..6 {
            limiter.acquire(3).await;
            passed.push(Instant::now().duration_since(start));
        }

        assert!(passed[..3].iter().all(Duration::is_zero));
        assert!(passed[3..].iter().all(|passed| *passed >= WINDOW));
        assert!(passed[5] < WINDOW * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_do_not_overshoot() {
        let limiter = Arc::new(RateLimiter::new());
        let start = Instant::now();

        let mut passed = join_all((0..9).map(|_| {
            let limiter = limiter.clone();
            async move {
                limiter.acquire(3).await;
                Instant::now().duration_since(start).as_secs()
            }
        }))
        .await;

        passed.sort();

        assert_eq!(passed, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn smaller_limit_keeps_larger_limit_history() {
        let limiter = &RateLimiter::new();
        let start = Instant::now();

        for _ in 0..10 {
            limiter.acquire(10).await;
        }

        let (slow, fast) = tokio::join!(
            async {
                limiter.acquire(2).await;
                Instant::now().duration_since(start)
            },
            join_all((0..10).map(|_| async move {
                limiter.acquire(10).await;
                Instant::now().duration_since(start)
            }))
        );

        assert!(slow >= WINDOW);
        assert!(fast.iter().all(|passed| *passed >= WINDOW));
        assert_eq!(fast.iter().filter(|passed| **passed < WINDOW * 2).count(), 9);
    }
}

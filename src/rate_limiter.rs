//! Request pacing.
//!
//! Two layers keep the run under the catalog service's abuse threshold:
//!
//! * [`RateLimiter`] sits inside the HTTP client and enforces a minimum gap
//!   between individual requests, widening it after failures.
//! * [`BatchPacer`] sits in the orchestrator and pauses the whole run for a
//!   random interval after every few artists.

use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

/// Minimum interval between requests, with adaptive backoff on failures.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    last_request: Option<Instant>,
    current_interval: Duration,
    base_interval: Duration,
    max_interval: Duration,
    success_count: u32,
    successes_to_reduce: u32,
    hold_until: Option<Instant>,
}

impl RateLimiter {
    /// * `name` - label for log messages
    /// * `base_interval` - minimum time between requests
    /// * `max_interval` - upper bound after repeated failures
    /// * `successes_to_reduce` - consecutive successes before the interval is halved
    ///   (0 disables the reduction)
    pub fn new(name: &str, base_interval: Duration, max_interval: Duration, successes_to_reduce: u32) -> Self {
        RateLimiter {
            name: name.to_string(),
            last_request: None,
            current_interval: base_interval,
            base_interval,
            max_interval,
            success_count: 0,
            successes_to_reduce,
            hold_until: None,
        }
    }

    /// Max interval = 16× base (at least one second), reduce after 10 successes.
    pub fn from_millis(name: &str, millis: u64) -> Self {
        let base = Duration::from_millis(millis);
        let max = (base * 16).max(Duration::from_secs(1));
        Self::new(name, base, max, 10)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Sleep if not enough time has elapsed since the last request.
    /// Must be called *before* making a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(until) = self.hold_until.take() {
            let now = Instant::now();
            if until > now {
                log::debug!("[{}] holding off {:.2}s as requested by the service", self.name, (until - now).as_secs_f64());
                thread::sleep(until - now);
            }
        }
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.current_interval {
                let wait_time = self.current_interval - elapsed;
                log::debug!("[{}] waiting {:.2}s before next request", self.name, wait_time.as_secs_f64());
                thread::sleep(wait_time);
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// After enough consecutive successes the interval is halved, down to the base.
    pub fn report_success(&mut self) {
        if self.successes_to_reduce == 0 {
            return;
        }

        self.success_count += 1;

        if self.success_count >= self.successes_to_reduce && self.current_interval > self.base_interval {
            self.current_interval = (self.current_interval / 2).max(self.base_interval);
            log::debug!(
                "[{}] request interval reduced to {:.2}s after {} successes",
                self.name,
                self.current_interval.as_secs_f64(),
                self.success_count
            );
            self.success_count = 0;
        }
    }

    /// Doubles the interval, up to the max.
    pub fn report_failure(&mut self) {
        self.current_interval = (self.current_interval * 2).min(self.max_interval);
        log::info!(
            "[{}] request interval increased to {:.2}s due to error",
            self.name,
            self.current_interval.as_secs_f64()
        );
        self.success_count = 0;
    }

    /// The service asked us to hold off (e.g. a `Retry-After` header).
    /// The next [`wait_if_needed`](Self::wait_if_needed) will wait at least `delay`.
    pub fn defer(&mut self, delay: Duration) {
        self.report_failure();
        self.hold_until = Some(Instant::now() + delay);
    }
}

/// Pauses the run for a random interval after every `batch_size` ticks.
#[derive(Debug)]
pub struct BatchPacer {
    batch_size: u32,
    pause_min: Duration,
    pause_max: Duration,
    ticks: u32,
}

impl BatchPacer {
    /// A `batch_size` of 0 disables pausing. `pause_min` must not exceed `pause_max`.
    pub fn new(batch_size: u32, pause_min: Duration, pause_max: Duration) -> Self {
        BatchPacer {
            batch_size,
            pause_min,
            pause_max: pause_max.max(pause_min),
            ticks: 0,
        }
    }

    /// Pacer that counts batches but never sleeps.
    pub fn without_pauses(batch_size: u32) -> Self {
        Self::new(batch_size, Duration::ZERO, Duration::ZERO)
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Record one unit of work. Returns the pause taken, if this tick closed a batch.
    pub fn tick(&mut self) -> Option<Duration> {
        self.ticks += 1;
        if self.batch_size == 0 || self.ticks % self.batch_size != 0 {
            return None;
        }

        let pause = self.sample_pause();
        if !pause.is_zero() {
            log::info!("Pausing {:.1}s after {} artists", pause.as_secs_f64(), self.ticks);
            thread::sleep(pause);
        }
        Some(pause)
    }

    fn sample_pause(&self) -> Duration {
        if self.pause_min == self.pause_max {
            return self.pause_min;
        }
        let secs = rand::thread_rng().gen_range(self.pause_min.as_secs_f64()..=self.pause_max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

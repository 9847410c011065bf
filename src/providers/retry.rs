use rand::Rng;
use std::fmt::Display;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_JITTER: Duration = Duration::from_secs(1);

type BackoffFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Runs a fallible operation up to `max_attempts` times, sleeping between
/// attempts for whatever the backoff function returns.
///
/// The backoff function receives the number of the attempt that just failed
/// (starting at 1). When every attempt fails, the error of the last attempt is
/// returned unchanged.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<BackoffFn>,
}

impl RetryPolicy {
    pub fn new<F>(max_attempts: u32, backoff: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
        }
    }

    /// Fixed `base` delay plus a uniform random share of `jitter`.
    pub fn jittered(max_attempts: u32, base: Duration, jitter: Duration) -> Self {
        Self::new(max_attempts, move |_| jittered_delay(base, jitter))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay applied after `attempt` fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    pub fn run<T, E, F>(&self, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => {
                    warn!(attempt, error = %err, "giving up after final attempt");
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::jittered(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY, DEFAULT_JITTER)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// `base + uniform[0, jitter)`, drawn at nanosecond resolution.
pub fn jittered_delay(base: Duration, jitter: Duration) -> Duration {
    let jitter_nanos = u64::try_from(jitter.as_nanos()).unwrap_or(u64::MAX);
    if jitter_nanos == 0 {
        return base;
    }
    base + Duration::from_nanos(rand::thread_rng().gen_range(0..jitter_nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, |_| Duration::ZERO)
    }

    #[test]
    fn test_returns_first_success() {
        let mut calls = 0;
        let result: Result<&str, String> = no_wait(5).run(|_| {
            calls += 1;
            Ok("done")
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_stops_after_max_attempts_with_last_error() {
        let mut seen = Vec::new();
        let result: Result<(), String> = no_wait(5).run(|attempt| {
            seen.push(attempt);
            Err(format!("failure {}", attempt))
        });
        assert_eq!(result, Err("failure 5".to_string()));
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_succeeds_on_third_attempt() {
        let mut attempts = 0;
        let result: Result<u32, String> = no_wait(5).run(|attempt| {
            attempts += 1;
            if attempt < 3 {
                Err("not yet".to_string())
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_backoff_called_between_attempts_only() {
        let delays = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = delays.clone();
        let policy = RetryPolicy::new(3, move |attempt| {
            recorded.lock().unwrap().push(attempt);
            Duration::ZERO
        });

        let result: Result<(), &str> = policy.run(|_| Err("boom"));
        assert_eq!(result, Err("boom"));
        assert_eq!(*delays.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = no_wait(0);
        assert_eq!(policy.max_attempts(), 1);

        let mut calls = 0;
        let _: Result<(), &str> = policy.run(|_| {
            calls += 1;
            Err("nope")
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_default_delay_is_between_one_and_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        for attempt in 1..=200 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= Duration::from_secs(1), "delay {:?} too short", delay);
            assert!(delay < Duration::from_secs(2), "delay {:?} too long", delay);
        }
    }

    #[test]
    fn test_jittered_delay_without_jitter_is_fixed() {
        let base = Duration::from_millis(250);
        assert_eq!(jittered_delay(base, Duration::ZERO), base);
    }
}

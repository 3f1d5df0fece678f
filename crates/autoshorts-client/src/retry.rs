//! Retry bookkeeping for the status poll loop.
//!
//! A failed poll is retried after a fixed delay until the optional cap on
//! consecutive failures is reached. Only the first few failures of a streak
//! are worth a warning; the rest are counted silently until the next success.

use std::time::Duration;

use crate::poller::PollConfig;

/// Failures in a streak that are reported before going quiet.
const LOGGED_FAILURES: u32 = 3;

/// What the poll loop should do after a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Poll again after `delay`. `log` is false once the streak went quiet.
    Retry { attempt: u32, delay: Duration, log: bool },
    /// The cap was reached.
    GiveUp { attempts: u32 },
}

/// Consecutive failure streak of one poll loop.
#[derive(Debug, Clone)]
pub struct PollRetry {
    streak: u32,
    retry_delay: Duration,
    max_consecutive: Option<u32>,
}

impl PollRetry {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            streak: 0,
            retry_delay: config.retry_delay,
            max_consecutive: config.max_consecutive_failures,
        }
    }

    /// Decide the next step after a failed poll.
    pub fn on_failure(&mut self) -> RetryDecision {
        self.streak += 1;
        if self.max_consecutive.is_some_and(|max| self.streak >= max) {
            return RetryDecision::GiveUp {
                attempts: self.streak,
            };
        }
        RetryDecision::Retry {
            attempt: self.streak,
            delay: self.retry_delay,
            log: self.streak <= LOGGED_FAILURES,
        }
    }

    /// End the streak. Returns its length when failures went unreported.
    pub fn on_success(&mut self) -> Option<u32> {
        let quiet = (self.streak > LOGGED_FAILURES).then_some(self.streak);
        self.streak = 0;
        quiet
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max: Option<u32>) -> PollConfig {
        PollConfig {
            retry_delay: Duration::from_secs(5),
            max_consecutive_failures: max,
            ..Default::default()
        }
    }

    #[test]
    fn test_uncapped_streak_goes_quiet_after_three() {
        let mut retry = PollRetry::new(&config(None));

        for attempt in 1..=3 {
            assert_eq!(
                retry.on_failure(),
                RetryDecision::Retry {
                    attempt,
                    delay: Duration::from_secs(5),
                    log: true
                }
            );
        }
        assert!(matches!(
            retry.on_failure(),
            RetryDecision::Retry { attempt: 4, log: false, .. }
        ));
        assert_eq!(retry.streak(), 4);

        assert_eq!(retry.on_success(), Some(4));
        assert_eq!(retry.streak(), 0);
        assert!(matches!(
            retry.on_failure(),
            RetryDecision::Retry { attempt: 1, log: true, .. }
        ));
    }

    #[test]
    fn test_short_streak_recovers_without_notice() {
        let mut retry = PollRetry::new(&config(None));
        retry.on_failure();
        assert_eq!(retry.on_success(), None);
    }

    #[test]
    fn test_cap_gives_up_on_the_capped_attempt() {
        let mut retry = PollRetry::new(&config(Some(2)));
        assert!(matches!(retry.on_failure(), RetryDecision::Retry { attempt: 1, .. }));
        assert_eq!(retry.on_failure(), RetryDecision::GiveUp { attempts: 2 });
    }

    #[test]
    fn test_success_resets_the_cap() {
        let mut retry = PollRetry::new(&config(Some(2)));
        retry.on_failure();
        retry.on_success();
        assert!(matches!(retry.on_failure(), RetryDecision::Retry { attempt: 1, .. }));
    }
}

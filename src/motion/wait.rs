//! Polling budget for blocking waits.

use crate::config::WaitConfig;
use crate::error::MotionError;

/// Tracks how long a wait has polled and enforces its deadline.
///
/// Elapsed time is the sum of poll delays handed out; bus round trips are not
/// counted.
#[derive(Debug, Clone, Copy)]
pub struct WaitBudget {
    config: WaitConfig,
    axis: Option<u8>,
    waited_ms: u32,
}

impl WaitBudget {
    /// Budget for waiting on one axis, or on every axis when `axis` is `None`.
    pub fn new(config: WaitConfig, axis: Option<u8>) -> Self {
        Self {
            config,
            axis,
            waited_ms: 0,
        }
    }

    /// Milliseconds spent in poll delays so far.
    #[inline]
    pub fn waited_ms(&self) -> u32 {
        self.waited_ms
    }

    /// Delay to sleep before the next poll.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::WaitTimeout` once the deadline has been reached.
    pub fn next_delay_ms(&mut self) -> Result<u32, MotionError> {
        if let Some(timeout) = self.config.timeout_ms {
            if self.waited_ms >= timeout {
                return Err(MotionError::WaitTimeout {
                    axis: self.axis,
                    waited_ms: self.waited_ms,
                });
            }
        }
        let interval = self.config.poll_interval_ms.max(1);
        self.waited_ms = self.waited_ms.saturating_add(interval);
        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_wait_never_expires() {
        let mut budget = WaitBudget::new(WaitConfig::default(), Some(0));
        for _ in 0..1000 {
            assert_eq!(budget.next_delay_ms(), Ok(20));
        }
        assert_eq!(budget.waited_ms(), 20_000);
    }

    #[test]
    fn test_deadline() {
        let config = WaitConfig {
            poll_interval_ms: 10,
            timeout_ms: Some(25),
        };
        let mut budget = WaitBudget::new(config, None);

        assert!(budget.next_delay_ms().is_ok());
        assert!(budget.next_delay_ms().is_ok());
        assert!(budget.next_delay_ms().is_ok());
        assert_eq!(
            budget.next_delay_ms(),
            Err(MotionError::WaitTimeout {
                axis: None,
                waited_ms: 30
            })
        );
    }
}

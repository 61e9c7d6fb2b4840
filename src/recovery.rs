use std::time::Duration;
use tokio::time::sleep;

/// Reconnection backoff configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Capped exponential backoff between resubscription attempts
///
/// Each `wait` sleeps for the current delay and doubles it up to the cap;
/// `reset` returns to the initial delay after a successful operation.
#[derive(Debug)]
pub struct Backoff {
    config: RetryConfig,
    current: Duration,
}

impl Backoff {
    pub fn new(config: RetryConfig) -> Self {
        let current = config.initial_delay;
        Self { config, current }
    }

    /// Sleep for the current delay, then increase it
    pub async fn wait(&mut self) {
        sleep(self.current).await;
        self.advance();
    }

    /// Current delay without sleeping
    pub fn delay(&self) -> Duration {
        self.current
    }

    /// Return to the initial delay
    pub fn reset(&mut self) {
        self.current = self.config.initial_delay;
    }

    fn advance(&mut self) {
        let next = self.current.mul_f64(self.config.multiplier);
        self.current = next.min(self.config.max_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let mut backoff = Backoff::new(RetryConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            multiplier: 2.0,
        });

        assert_eq!(backoff.delay(), Duration::from_millis(100));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_millis(200));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_millis(350));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_millis(350));
    }

    #[test]
    fn test_backoff_reset() {
        let mut backoff = Backoff::new(RetryConfig::default());
        backoff.advance();
        backoff.advance();
        assert!(backoff.delay() > RetryConfig::default().initial_delay);

        backoff.reset();
        assert_eq!(backoff.delay(), RetryConfig::default().initial_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_then_advances() {
        let mut backoff = Backoff::new(RetryConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        });

        let before = tokio::time::Instant::now();
        backoff.wait().await;
        assert_eq!(before.elapsed(), Duration::from_millis(100));
        assert_eq!(backoff.delay(), Duration::from_millis(200));
    }
}

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Randomized delay taken before every fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    min_ms: u64,
    max_ms: u64,
}

impl Politeness {
    /// Bounds are reordered if given the wrong way round
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.delay_min_ms, config.delay_max_ms)
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draws a delay uniformly from `[min, max]`
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

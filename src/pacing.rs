use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::trace;

use crate::config::AppConfig;

/// Points in a fetch run where the provider must be given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Before a freshly issued next-page token is redeemed.
    PageToken,
    /// Between two category queries.
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessPolicy {
    pub page_token_delay: Duration,
    pub category_delay: Duration,
}

impl PolitenessPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_token_delay: config.page_token_delay(),
            category_delay: config.category_delay(),
        }
    }

    pub fn immediate() -> Self {
        Self {
            page_token_delay: Duration::ZERO,
            category_delay: Duration::ZERO,
        }
    }

    pub fn interval(&self, pause: Pause) -> Duration {
        match pause {
            Pause::PageToken => self.page_token_delay,
            Pause::Category => self.category_delay,
        }
    }
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, pause: Pause);
}

pub struct SleepPacer {
    policy: PolitenessPolicy,
}

impl SleepPacer {
    pub fn new(policy: PolitenessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PolitenessPolicy {
        self.policy
    }
}

#[async_trait]
impl Pacer for SleepPacer {
    async fn pause(&self, pause: Pause) {
        let interval = self.policy.interval(pause);
        if interval.is_zero() {
            return;
        }
        trace!(?pause, ?interval, "pacing places api");
        sleep(interval).await;
    }
}

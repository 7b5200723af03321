use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 投递重试策略
///
/// `max_attempts` 包含首次尝试；第 n 次重试前等待 `n * base_delay`
/// (线性退避)，最后一次尝试之后不再等待。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// 第 retry 次重试 (1 起始) 前的等待时间
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// 尝试次数下限为 1，配置为 0 时仍执行一次
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

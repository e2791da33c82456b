use std::time::Duration;

use crate::engine::DEFAULT_CHANNEL_CAPACITY;
use crate::recovery::RecoveryPolicy;

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Per-topic work engine buffer.
    pub channel_capacity: usize,

    /// Upper bound on a single job; a job still running past this is
    /// recorded as failed rather than left in progress forever.
    pub job_timeout: Duration,

    /// Poll interval while a synchronous request waits inline for its job.
    pub sync_poll_interval: Duration,

    /// When false, bind/unbind are computed inline without a bundle job.
    pub launch_bundle_on_bind: bool,

    /// When true, requests skip the authorization hook entirely.
    pub auto_escalate: bool,

    /// Enables the development capability (spec push/remove).
    pub dev_broker: bool,

    pub recovery: RecoveryPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            job_timeout: Duration::from_secs(300),
            sync_poll_interval: Duration::from_millis(200),
            launch_bundle_on_bind: false,
            auto_escalate: false,
            dev_broker: false,
            recovery: RecoveryPolicy::FailStale,
        }
    }
}

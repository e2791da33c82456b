use openbroker_core::BrokerError;

/// Exit codes for CI/automation.
pub const SUCCESS: i32 = 0;
pub const REQUEST_REJECTED: i32 = 2;
pub const JOB_FAILED: i32 = 3;
pub const RUNTIME_ERROR: i32 = 4;

pub fn for_broker_error(err: &BrokerError) -> i32 {
    match err {
        // Idempotent replay of a finished provision is a success.
        BrokerError::AlreadyProvisioned => SUCCESS,
        BrokerError::JobFailed(_) => JOB_FAILED,
        BrokerError::Store(_) => RUNTIME_ERROR,
        _ => REQUEST_REJECTED,
    }
}

use thiserror::Error;

/// The OSB surface a status code is being computed for. The same error maps
/// to different codes depending on the verb (a missing instance is 410 on
/// delete paths, 404 on reads, 400 where the id was caller-supplied input).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Catalog,
    Provision,
    Deprovision,
    Update,
    Bind,
    Unbind,
    LastOperation,
    GetInstance,
    GetBinding,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Resource id already exists with conflicting attributes.
    #[error("resource already exists with different attributes")]
    Duplicate,

    /// Idempotent provision retry: the instance exists with identical
    /// attributes and a terminal success state.
    #[error("instance is already provisioned")]
    AlreadyProvisioned,

    #[error("provision already in progress for this instance")]
    ProvisionInProgress,

    #[error("deprovision already in progress for this instance")]
    DeprovisionInProgress,

    #[error("update already in progress for this instance")]
    UpdateInProgress,

    #[error("bind already in progress for this binding")]
    BindInProgress,

    #[error("unbind already in progress for this binding")]
    UnbindInProgress,

    #[error("resource not found")]
    NotFound,

    /// Deprovision refused while bindings are still live.
    #[error("service instance has active bindings")]
    BindingExists,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Work engine backpressure; transient, safe to retry.
    #[error("work engine saturated, retry later")]
    EngineSaturated,

    /// Job outcome surfaced inline on a synchronous request. Asynchronous
    /// callers see the failure through last_operation instead.
    #[error("job execution failed: {0}")]
    JobFailed(String),

    #[error("store error: {0}")]
    Store(String),
}

impl BrokerError {
    /// HTTP status the OSB edge sends for this error on the given verb.
    /// This table is the broker's half of the protocol contract; the HTTP
    /// layer only frames it.
    pub fn status_code(&self, verb: Verb) -> u16 {
        match self {
            BrokerError::InvalidRequest(_) => 400,
            BrokerError::Duplicate => 409,
            BrokerError::AlreadyProvisioned => 200,
            BrokerError::ProvisionInProgress
            | BrokerError::DeprovisionInProgress
            | BrokerError::UpdateInProgress
            | BrokerError::BindInProgress
            | BrokerError::UnbindInProgress => 202,
            BrokerError::NotFound => match verb {
                Verb::Deprovision | Verb::Unbind | Verb::LastOperation => 410,
                Verb::GetInstance | Verb::GetBinding => 404,
                _ => 400,
            },
            BrokerError::BindingExists => match verb {
                // A bind retry that hits existing identical credentials is a
                // success replay, not a conflict.
                Verb::Bind => 200,
                _ => 400,
            },
            BrokerError::Unauthorized(_) => 403,
            BrokerError::EngineSaturated => 503,
            BrokerError::JobFailed(_) => 500,
            BrokerError::Store(_) => 500,
        }
    }
}

use async_trait::async_trait;

use openbroker_core::UserContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization check failed: {0}")]
    Backend(String),
}

/// Pluggable pre-flight check: may this user act in this namespace? Invoked
/// by the orchestrator before any state mutation when auto-escalation is
/// disabled.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, user: &UserContext, namespace: &str) -> Result<Decision, AuthError>;
}

pub struct AllowAllAuthorizer;

#[async_trait]
impl Authorizer for AllowAllAuthorizer {
    async fn authorize(
        &self,
        _user: &UserContext,
        _namespace: &str,
    ) -> Result<Decision, AuthError> {
        Ok(Decision::Allow)
    }
}

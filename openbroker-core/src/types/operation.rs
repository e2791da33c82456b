use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five lifecycle verbs a broker executes asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Provision,
    Deprovision,
    Update,
    Bind,
    Unbind,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Provision => "provision",
            OperationKind::Deprovision => "deprovision",
            OperationKind::Update => "update",
            OperationKind::Bind => "bind",
            OperationKind::Unbind => "unbind",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provision" => Ok(OperationKind::Provision),
            "deprovision" => Ok(OperationKind::Deprovision),
            "update" => Ok(OperationKind::Update),
            "bind" => Ok(OperationKind::Bind),
            "unbind" => Ok(OperationKind::Unbind),
            other => Err(format!("unknown operation kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    NotStarted,
    InProgress,
    Succeeded,
    Failed,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::NotStarted => "not_started",
            OperationState::InProgress => "in_progress",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
        }
    }

    /// Wire form for last_operation responses. OSB only knows three states,
    /// so a queued-but-not-started operation reports as in progress.
    pub fn osb_state(&self) -> &'static str {
        match self {
            OperationState::NotStarted | OperationState::InProgress => "in progress",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Succeeded | OperationState::Failed)
    }
}

impl std::str::FromStr for OperationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(OperationState::NotStarted),
            "in_progress" => Ok(OperationState::InProgress),
            "succeeded" => Ok(OperationState::Succeeded),
            "failed" => Ok(OperationState::Failed),
            other => Err(format!("unknown operation state: {other}")),
        }
    }
}

/// Per-resource progress marker. Exactly one of these may be non-terminal
/// for a given resource at any time; the orchestrator's concurrency guard
/// enforces that before a new one is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub token: Uuid,
    pub kind: OperationKind,
    pub state: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Operation {
    /// Fresh in-progress descriptor with a newly minted polling token.
    pub fn begin(kind: OperationKind) -> Self {
        Self {
            token: Uuid::new_v4(),
            kind,
            state: OperationState::InProgress,
            description: None,
        }
    }

    pub fn succeeded(mut self, description: Option<String>) -> Self {
        self.state = OperationState::Succeeded;
        self.description = description;
        self
    }

    pub fn failed(mut self, description: impl Into<String>) -> Self {
        self.state = OperationState::Failed;
        self.description = Some(description.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

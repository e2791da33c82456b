use openbroker_core::OperationKind;

/// Static registry key for one class of asynchronous work. Each topic has
/// exactly one subscriber and one dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkTopic {
    Provision,
    Deprovision,
    Update,
    Bind,
    Unbind,
}

impl WorkTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkTopic::Provision => "provision",
            WorkTopic::Deprovision => "deprovision",
            WorkTopic::Update => "update",
            WorkTopic::Bind => "bind",
            WorkTopic::Unbind => "unbind",
        }
    }

    pub fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Provision => WorkTopic::Provision,
            OperationKind::Deprovision => WorkTopic::Deprovision,
            OperationKind::Update => WorkTopic::Update,
            OperationKind::Bind => WorkTopic::Bind,
            OperationKind::Unbind => WorkTopic::Unbind,
        }
    }
}

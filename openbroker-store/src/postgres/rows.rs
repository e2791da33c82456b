use uuid::Uuid;

use openbroker_core::{Operation, OperationKind, OperationState};

use crate::store::StoreError;

/// Rebuild an operation descriptor from its flattened row columns. All four
/// columns are written together, so a row with a token but an unparsable
/// kind/state is corrupt, not absent.
pub(crate) fn decode_operation(
    token: Option<Uuid>,
    kind: Option<String>,
    state: Option<String>,
    description: Option<String>,
) -> Result<Option<Operation>, StoreError> {
    let Some(token) = token else {
        return Ok(None);
    };

    let kind: OperationKind = kind
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(StoreError::Other)?;
    let state: OperationState = state
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(StoreError::Other)?;

    Ok(Some(Operation {
        token,
        kind,
        state,
        description,
    }))
}

/// Flattened column values for an optional operation descriptor, in bind
/// order (token, kind, state, description).
pub(crate) fn operation_columns(
    op: Option<&Operation>,
) -> (
    Option<Uuid>,
    Option<&'static str>,
    Option<&'static str>,
    Option<String>,
) {
    match op {
        Some(op) => (
            Some(op.token),
            Some(op.kind.as_str()),
            Some(op.state.as_str()),
            op.description.clone(),
        ),
        None => (None, None, None, None),
    }
}

//! crates/course_admin_core/src/result.rs
//!
//! The `{ success, message, data? }` envelope every public service operation
//! returns. Errors never cross the service boundary; they are logged where
//! they are caught and folded into this shape.

use serde::{Deserialize, Serialize};

use crate::ports::PortError;

/// Coarse category of a failed operation, for callers that need more than
/// the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    NotFound,
    Validation,
    Conflict,
    Unauthorized,
    Store,
}

impl From<&PortError> for FailureKind {
    fn from(error: &PortError) -> Self {
        match error {
            PortError::NotFound(_) => FailureKind::NotFound,
            PortError::Validation(_) => FailureKind::Validation,
            PortError::Conflict(_) => FailureKind::Conflict,
            PortError::Unauthorized => FailureKind::Unauthorized,
            PortError::Unexpected(_) => FailureKind::Store,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
}

impl<T> OperationResult<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(kind),
        }
    }

    /// A failure whose message is the error's own detail. Used for the
    /// expected outcomes (not found, invalid input, conflicts) where the
    /// detail is the user-facing text.
    pub fn rejected(error: &PortError) -> Self {
        let message = match error {
            PortError::NotFound(m) | PortError::Validation(m) | PortError::Conflict(m) => m.clone(),
            other => other.to_string(),
        };
        Self::failure(error.into(), message)
    }

    /// A failure reported as `"<context>: <detail>"`.
    pub fn from_error(context: &str, error: &PortError) -> Self {
        match error {
            PortError::Unexpected(detail) => {
                Self::failure(FailureKind::Store, format!("{context}: {detail}"))
            }
            expected => Self::rejected(expected),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.error
    }
}

impl OperationResult<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

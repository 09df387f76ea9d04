//! JSON envelope for controllers.
//!
//! ```json
//! { "status": "error", "message": "Leave cannot start or end on a weekend (2026-03-07)",
//!   "error": "eligibility", "retryable": false }
//! ```
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::{LeaveError, LeaveResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// Machine readable error kind, see [`LeaveError::kind`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl<T> Outcome<T> {
    pub fn success(result: T, message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
            result: Some(result),
            error: None,
            retryable: false,
        }
    }

    pub fn failure(err: &LeaveError) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: err.to_string(),
            result: None,
            error: Some(err.kind().to_string()),
            retryable: err.is_retryable(),
        }
    }

    pub fn from_result(result: LeaveResult<T>, message: impl Into<String>) -> Self {
        match result {
            Ok(value) => Self::success(value, message),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

impl LeaveError {
    pub fn kind(&self) -> &'static str {
        match self {
            LeaveError::Validation(_) => "validation",
            LeaveError::Eligibility(_) => "eligibility",
            LeaveError::InsufficientCredit { .. } => "insufficient_credit",
            LeaveError::NotFound(_) => "not_found",
            LeaveError::AlreadyDecided { .. } => "already_decided",
            LeaveError::AlreadyConverted(_) => "already_converted",
            LeaveError::Unauthorized(_) => "unauthorized",
            LeaveError::Ledger(_) => "ledger",
            LeaveError::ConcurrencyConflict(_) => "concurrency_conflict",
            LeaveError::Persistence(_) => "persistence",
        }
    }
}

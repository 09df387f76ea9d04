//! Error kinds returned by the ledger and the leave workflow.
//!
//! Business-rule failures ([`EligibilityError`], [`LeaveError::InsufficientCredit`],
//! ...) never change state. Store failures ([`StoreError`]) roll the whole unit
//! of work back; only [`StoreError::Conflict`] is worth retrying.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::leave_transaction::LeaveStatus;

/// Failures raised by the persistence collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Lock wait timeout or deadlock.
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Calendar and leave-type rule rejections.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EligibilityError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Leave cannot start or end on a weekend ({0})")]
    WeekendBoundary(NaiveDate),
    #[error("This leave type must be used within {0}")]
    OutOfYearRange(i32),
    #[error("This leave type requires {required} day(s) notice, got {actual}")]
    InsufficientNotice { required: i32, actual: i64 },
    #[error("This leave type can only be filed for today")]
    SameDayOnly,
    #[error("Leave cannot be filed for a past date")]
    PastDate,
    #[error("This leave type can only be filed up to {0} day(s) back")]
    BackdateWindow(u32),
    #[error("Leave start and end date must differ")]
    ZeroLengthLeave,
    #[error("Requested {requested} day(s) exceeds the maximum of {max}")]
    ExceedsMaxDuration { requested: u32, max: Decimal },
}

/// Lot-level ledger failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Credit lot {0} not found")]
    LotNotFound(u64),
    #[error("Employee {0} has no lot with remaining credit")]
    NoDeductibleLot(u64),
    #[error("Credit lot {lot_id} holds {available}, cannot deduct {requested}")]
    InsufficientLotBalance {
        lot_id: u64,
        available: Decimal,
        requested: Decimal,
    },
    #[error("Invalid credit amount: {0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top level error kind for every exposed operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeaveError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
    #[error("Insufficient leave credit: {available} available, {required} required")]
    InsufficientCredit { available: Decimal, required: Decimal },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Leave transaction {id} is already {status}")]
    AlreadyDecided { id: u64, status: LeaveStatus },
    #[error("Attendance {0} has already been converted to credit")]
    AlreadyConverted(u64),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Ledger(LedgerError),
    #[error("Concurrent update conflict, please retry: {0}")]
    ConcurrencyConflict(String),
    #[error("Something went wrong, contact the system admin")]
    Persistence(String),
}

impl LeaveError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeaveError::ConcurrencyConflict(_))
    }
}

impl From<StoreError> for LeaveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => LeaveError::ConcurrencyConflict(msg),
            StoreError::Persistence(msg) => LeaveError::Persistence(msg),
        }
    }
}

impl From<LedgerError> for LeaveError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(store) => store.into(),
            other => LeaveError::Ledger(other),
        }
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;

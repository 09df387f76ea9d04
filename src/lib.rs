//! Leave credit ledger and leave eligibility engine.
//!
//! Credit lives in per-employee lots (`credit_lots`). Grants and overtime add
//! lots; approved leave and short attendance days draw them down. Every write
//! operation runs as one unit of work on a [`store::LeaveStore`].
pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod response;
pub mod store;
pub mod utils;

pub use crate::api::attendance::{AttendanceCredit, convert_attendance, record_attendance_credit};
pub use crate::api::credit::{balances_by_role, employee_balance, grant_credit, run_yearly_accrual};
pub use crate::api::leave_request::{decide_leave, file_leave};
pub use crate::engine::eligibility::{Eligibility, validate};
pub use crate::engine::ledger::{AccrualSummary, total_balance};
pub use crate::error::{EligibilityError, LedgerError, LeaveError, LeaveResult, StoreError};
pub use crate::response::Outcome;

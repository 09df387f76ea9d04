use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// Terminal state requested for a pending transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
    Cancelled,
}

impl From<Decision> for LeaveStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => LeaveStatus::Approved,
            Decision::Rejected => LeaveStatus::Rejected,
            Decision::Cancelled => LeaveStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveTransaction {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub status: LeaveStatus,
    pub start_date: NaiveDate,
    /// Possibly clamped to the filing date for backdated leave.
    pub end_date: NaiveDate,
    /// Business days requested.
    pub total_leave: Decimal,
    pub reason: String,
    /// Set when someone files on the employee's behalf.
    pub rewarded_by_id: Option<u64>,
    pub approved_by_id: Option<u64>,
    pub filed_date: NaiveDate,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLeaveTransaction {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_leave: Decimal,
    pub reason: String,
    pub rewarded_by_id: Option<u64>,
    pub filed_date: NaiveDate,
    pub year: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LeaveTransactionRow {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_leave: Decimal,
    pub reason: String,
    pub rewarded_by_id: Option<u64>,
    pub approved_by_id: Option<u64>,
    pub filed_date: NaiveDate,
    pub year: i32,
}

impl TryFrom<LeaveTransactionRow> for LeaveTransaction {
    type Error = String;

    fn try_from(row: LeaveTransactionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<LeaveStatus>()
            .map_err(|_| format!("leave transaction {} has unknown status {}", row.id, row.status))?;

        Ok(LeaveTransaction {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_id: row.leave_type_id,
            status,
            start_date: row.start_date,
            end_date: row.end_date,
            total_leave: row.total_leave,
            reason: row.reason,
            rewarded_by_id: row.rewarded_by_id,
            approved_by_id: row.approved_by_id,
            filed_date: row.filed_date,
            year: row.year,
        })
    }
}

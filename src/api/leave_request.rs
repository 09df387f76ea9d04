//! Leave transaction workflow: `Pending -> Approved | Rejected | Cancelled`.
use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::finish;
use crate::engine::{eligibility, ledger};
use crate::error::{EligibilityError, LeaveError, LeaveResult};
use crate::model::{
    employee::Employee,
    leave_request::LeaveRequest,
    leave_transaction::{Decision, LeaveStatus, LeaveTransaction, NewLeaveTransaction},
};
use crate::store::{LeaveStore, LedgerTx};

/* =========================
File a leave request
========================= */
/// Validate a filing and store it as Pending.
///
/// `filed_by` is the session identity; when it differs from the employee the
/// filer must be an admin and is recorded as `rewarded_by_id`. Nothing is
/// written unless the employee's balance covers the requested business days.
#[instrument(
    name = "file_leave",
    skip(store, request, now),
    fields(employee_id = ?request.employee_id, leave_type_id = ?request.leave_type_id)
)]
pub async fn file_leave<S: LeaveStore>(
    store: &S,
    request: LeaveRequest,
    filed_by: u64,
    now: NaiveDateTime,
) -> LeaveResult<LeaveTransaction> {
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(EligibilityError::MissingFields(missing).into());
    }

    let mut tx = store.begin().await?;
    let result = file_in(&mut tx, &request, filed_by, now).await;
    finish(tx, result).await
}

async fn file_in<T: LedgerTx>(
    tx: &mut T,
    request: &LeaveRequest,
    filed_by: u64,
    now: NaiveDateTime,
) -> LeaveResult<LeaveTransaction> {
    let (Some(employee_id), Some(leave_type_id)) = (request.employee_id, request.leave_type_id)
    else {
        return Err(EligibilityError::MissingFields(request.missing_fields()).into());
    };

    require_employee(tx, employee_id).await?;

    let rewarded_by_id = if filed_by == employee_id {
        None
    } else {
        let filer = require_employee(tx, filed_by).await?;
        if !filer.role.can_decide_leave() {
            return Err(LeaveError::Unauthorized(
                "Only an admin can file leave on behalf of another employee".into(),
            ));
        }
        Some(filed_by)
    };

    let leave_type = tx
        .leave_type(leave_type_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Leave type {leave_type_id}")))?;

    let today = now.date();
    let eligibility = eligibility::validate(request, &leave_type, today)?;

    let required = Decimal::from(eligibility.duration_days);
    let available = ledger::total_balance(tx, employee_id).await?;
    if available <= Decimal::ZERO || available < required {
        return Err(LeaveError::InsufficientCredit {
            available,
            required,
        });
    }

    let leave = tx
        .insert_leave(&NewLeaveTransaction {
            employee_id,
            leave_type_id,
            start_date: eligibility.start_date,
            end_date: eligibility.adjusted_end_date,
            total_leave: required,
            reason: request.reason.clone().unwrap_or_default().trim().to_string(),
            rewarded_by_id,
            filed_date: today,
            year: today.year(),
        })
        .await?;

    info!(
        leave_id = leave.id,
        total_leave = %leave.total_leave,
        "Leave request filed"
    );
    Ok(leave)
}

/* =========================
Decide a pending leave
========================= */
/// Move a Pending transaction to a terminal state.
///
/// Approval re-checks the balance and deducts `total_leave` from the newest
/// lot holding credit, in the same unit of work as the status change. A
/// transaction that is no longer Pending is rejected, so a repeated call can
/// never deduct twice.
#[instrument(name = "decide_leave", skip(store))]
pub async fn decide_leave<S: LeaveStore>(
    store: &S,
    leave_id: u64,
    decision: Decision,
    approver_id: u64,
) -> LeaveResult<LeaveTransaction> {
    let mut tx = store.begin().await?;
    let result = decide_in(&mut tx, leave_id, decision, approver_id).await;
    finish(tx, result).await
}

async fn decide_in<T: LedgerTx>(
    tx: &mut T,
    leave_id: u64,
    decision: Decision,
    approver_id: u64,
) -> LeaveResult<LeaveTransaction> {
    let mut leave = tx
        .lock_leave(leave_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Leave transaction {leave_id}")))?;

    if leave.status.is_terminal() {
        return Err(LeaveError::AlreadyDecided {
            id: leave_id,
            status: leave.status,
        });
    }

    let approver = require_employee(tx, approver_id).await?;
    let allowed = match decision {
        Decision::Approved | Decision::Rejected => approver.role.can_decide_leave(),
        Decision::Cancelled => approver.id == leave.employee_id || approver.role.can_decide_leave(),
    };
    if !allowed {
        return Err(LeaveError::Unauthorized(format!(
            "Employee {approver_id} may not mark leave {leave_id} as {decision}"
        )));
    }

    if decision == Decision::Approved {
        let available = ledger::total_balance(tx, leave.employee_id).await?;
        if available < leave.total_leave {
            return Err(LeaveError::InsufficientCredit {
                available,
                required: leave.total_leave,
            });
        }

        if leave.total_leave > Decimal::ZERO {
            let lot = ledger::select_deductible_lot(tx, leave.employee_id).await?;
            ledger::deduct(tx, lot.id, leave.total_leave, Some(leave.id)).await?;
        }
    }

    let status = LeaveStatus::from(decision);
    let approved_by_id = match decision {
        Decision::Approved | Decision::Rejected => Some(approver_id),
        Decision::Cancelled => None,
    };
    tx.update_leave_status(leave_id, status, approved_by_id).await?;

    leave.status = status;
    leave.approved_by_id = approved_by_id;

    info!(leave_id, %status, approver_id, "Leave decided");
    Ok(leave)
}

async fn require_employee<T: LedgerTx>(tx: &mut T, employee_id: u64) -> LeaveResult<Employee> {
    tx.employee(employee_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Employee {employee_id}")))
}

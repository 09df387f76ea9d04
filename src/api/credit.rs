use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use super::finish;
use crate::engine::ledger::{self, AccrualSummary};
use crate::error::{LeaveError, LeaveResult};
use crate::model::{
    credit_lot::{CreditLot, LotSource, NewCreditLot},
    employee::EmployeeBalance,
    role::Role,
};
use crate::store::{LeaveStore, LedgerTx};

/// Sum of `latest_credit` over every lot the employee holds.
#[instrument(name = "employee_balance", skip(store))]
pub async fn employee_balance<S: LeaveStore>(store: &S, employee_id: u64) -> LeaveResult<Decimal> {
    let mut tx = store.begin().await?;
    let result = balance_in(&mut tx, employee_id).await;
    finish(tx, result).await
}

async fn balance_in<T: LedgerTx>(tx: &mut T, employee_id: u64) -> LeaveResult<Decimal> {
    tx.employee(employee_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Employee {employee_id}")))?;
    Ok(ledger::total_balance(tx, employee_id).await?)
}

/// Per-employee balances, optionally for a single role.
#[instrument(name = "balances_by_role", skip(store))]
pub async fn balances_by_role<S: LeaveStore>(
    store: &S,
    role: Option<Role>,
) -> LeaveResult<Vec<EmployeeBalance>> {
    let mut tx = store.begin().await?;
    let result = ledger::balances_by_role(&mut tx, role)
        .await
        .map_err(LeaveError::from);
    finish(tx, result).await
}

/* =========================
Manual grant
========================= */
/// Admin-only grant of `amount` days as a `manual` lot.
#[instrument(name = "grant_credit", skip(store, now))]
pub async fn grant_credit<S: LeaveStore>(
    store: &S,
    employee_id: u64,
    leave_type_id: Option<u64>,
    amount: Decimal,
    granted_by: u64,
    now: NaiveDateTime,
) -> LeaveResult<CreditLot> {
    if amount <= Decimal::ZERO {
        return Err(LeaveError::Validation(format!(
            "Granted credit must be positive, got {amount}"
        )));
    }

    let mut tx = store.begin().await?;
    let result = grant_in(&mut tx, employee_id, leave_type_id, amount, granted_by, now).await;
    finish(tx, result).await
}

async fn grant_in<T: LedgerTx>(
    tx: &mut T,
    employee_id: u64,
    leave_type_id: Option<u64>,
    amount: Decimal,
    granted_by: u64,
    now: NaiveDateTime,
) -> LeaveResult<CreditLot> {
    let granter = tx
        .employee(granted_by)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Employee {granted_by}")))?;
    if !granter.role.can_decide_leave() {
        return Err(LeaveError::Unauthorized("Only an admin can grant leave credit".into()));
    }

    tx.employee(employee_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Employee {employee_id}")))?;

    let mut lot = NewCreditLot::earned(employee_id, LotSource::Manual, amount, now);
    if let Some(leave_type_id) = leave_type_id {
        tx.leave_type(leave_type_id)
            .await?
            .ok_or_else(|| LeaveError::NotFound(format!("Leave type {leave_type_id}")))?;
        lot = lot.with_leave_type(leave_type_id);
    }

    let lot = ledger::create_lot(tx, lot).await?;
    info!(
        lot_id = lot.id,
        employee_id,
        granted_by,
        %amount,
        balance = %lot.current_credit,
        "Leave credit granted"
    );
    Ok(lot)
}

/* =========================
Yearly accrual
========================= */
/// Grant every admin and regular employee this year's carry-over credit.
///
/// Interns are not eligible. Safe to re-run: employees that already hold a
/// yearly lot for the year of `now` are reported as skipped.
#[instrument(name = "run_yearly_accrual", skip(store))]
pub async fn run_yearly_accrual<S: LeaveStore>(
    store: &S,
    now: NaiveDateTime,
) -> LeaveResult<AccrualSummary> {
    let mut tx = store.begin().await?;
    let result = accrue_in(&mut tx, now).await;
    finish(tx, result).await
}

async fn accrue_in<T: LedgerTx>(tx: &mut T, now: NaiveDateTime) -> LeaveResult<AccrualSummary> {
    let eligible: Vec<Role> = [Role::Admin, Role::Employee, Role::Intern]
        .into_iter()
        .filter(|r| r.accrues_yearly())
        .collect();

    let employees = tx.employees_by_role(&eligible).await?;
    let leave_types = tx.carry_over_leave_types().await?;

    Ok(ledger::accrue_yearly(tx, &employees, &leave_types, now).await?)
}

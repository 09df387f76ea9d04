//! Credit lot ledger.
//!
//! Every function runs inside the caller's unit of work and never commits.
//! Lots are only ever inserted or have their credit fields moved:
//!
//! - leave approval moves `amount` from `latest_credit` to `used_credit`,
//! - an attendance deficit moves it to `deducted_credit`.
//!
//! Both keep `latest_credit == earned_credit - used_credit - deducted_credit`
//! and refuse to take `latest_credit` below zero.
use chrono::{Datelike, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::model::{
    credit_lot::{CreditLot, LotSource, NewCreditLot},
    employee::{Employee, EmployeeBalance},
    leave_type::LeaveType,
    role::Role,
};
use crate::store::LedgerTx;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccrualSummary {
    pub year: i32,
    pub amount: Decimal,
    pub granted: Vec<CreditLot>,
    /// Employees that already received this year's grant.
    pub skipped: Vec<u64>,
}

pub async fn total_balance<T: LedgerTx>(tx: &mut T, employee_id: u64) -> Result<Decimal, LedgerError> {
    Ok(tx.total_balance(employee_id).await?)
}

pub async fn balances_by_role<T: LedgerTx>(
    tx: &mut T,
    role: Option<Role>,
) -> Result<Vec<EmployeeBalance>, LedgerError> {
    Ok(tx.balances(role).await?)
}

/// Newest lot that still holds credit, locked for the rest of the unit of work.
///
/// Selection is LIFO: a fresh grant is spent before older ones.
pub async fn select_deductible_lot<T: LedgerTx>(
    tx: &mut T,
    employee_id: u64,
) -> Result<CreditLot, LedgerError> {
    tx.lock_deductible_lot(employee_id)
        .await?
        .ok_or(LedgerError::NoDeductibleLot(employee_id))
}

/// Spend `amount` of a single lot on a leave transaction.
pub async fn deduct<T: LedgerTx>(
    tx: &mut T,
    lot_id: u64,
    amount: Decimal,
    leave_transaction_id: Option<u64>,
) -> Result<CreditLot, LedgerError> {
    let mut lot = tx
        .lock_lot(lot_id)
        .await?
        .ok_or(LedgerError::LotNotFound(lot_id))?;

    apply_usage(&mut lot, amount)?;
    if leave_transaction_id.is_some() {
        lot.leave_transaction_id = leave_transaction_id;
    }
    tx.update_lot(&lot).await?;

    debug!(lot_id, %amount, latest_credit = %lot.latest_credit, "Lot deducted");
    Ok(lot)
}

/// Charge an attendance deficit against open lots, newest first.
///
/// Returns the amount actually charged; whatever the open lots cannot cover
/// is forgiven.
pub async fn charge_deficit<T: LedgerTx>(
    tx: &mut T,
    employee_id: u64,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    require_positive(amount)?;

    let mut remaining = amount;
    for mut lot in tx.lock_open_lots(employee_id).await? {
        if remaining.is_zero() {
            break;
        }
        let part = remaining.min(lot.latest_credit);
        apply_deduction(&mut lot, part)?;
        tx.update_lot(&lot).await?;
        remaining -= part;
    }

    if remaining > Decimal::ZERO {
        warn!(employee_id, %amount, uncovered = %remaining, "Deficit exceeds balance, remainder forgiven");
    }

    Ok(amount - remaining)
}

/// Insert a lot after checking its credit fields.
pub async fn create_lot<T: LedgerTx>(tx: &mut T, lot: NewCreditLot) -> Result<CreditLot, LedgerError> {
    for (field, value) in [
        ("earned_credit", lot.earned_credit),
        ("used_credit", lot.used_credit),
        ("deducted_credit", lot.deducted_credit),
    ] {
        if value < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!("{field} must not be negative, got {value}")));
        }
    }

    let opening = lot.opening_balance();
    if opening < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "lot would open with a negative balance of {opening}"
        )));
    }

    let current_credit = tx.total_balance(lot.employee_id).await? + opening;
    let created = tx.insert_lot(&lot, current_credit).await?;

    debug!(
        lot_id = created.id,
        employee_id = created.employee_id,
        source = %created.source,
        %opening,
        "Credit lot created"
    );
    Ok(created)
}

/// One `yearly` lot per employee worth the sum of carry-over base values.
///
/// Employees already holding a yearly lot created in the same year are skipped.
pub async fn accrue_yearly<T: LedgerTx>(
    tx: &mut T,
    employees: &[Employee],
    carry_over_types: &[LeaveType],
    created_at: NaiveDateTime,
) -> Result<AccrualSummary, LedgerError> {
    let year = created_at.year();
    let amount: Decimal = carry_over_types
        .iter()
        .filter(|t| t.is_carried_over)
        .map(|t| t.base_value)
        .sum();

    let mut summary = AccrualSummary {
        year,
        amount,
        granted: Vec::new(),
        skipped: Vec::new(),
    };

    if amount <= Decimal::ZERO {
        warn!(year, "No carry-over credit to accrue");
        return Ok(summary);
    }

    for employee in employees {
        if tx.has_yearly_lot(employee.id, year).await? {
            summary.skipped.push(employee.id);
            continue;
        }

        let lot = create_lot(
            tx,
            NewCreditLot::earned(employee.id, LotSource::Yearly, amount, created_at),
        )
        .await?;
        summary.granted.push(lot);
    }

    info!(
        year,
        %amount,
        granted = summary.granted.len(),
        skipped = summary.skipped.len(),
        "Yearly accrual applied"
    );
    Ok(summary)
}

fn require_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn require_available(lot: &CreditLot, amount: Decimal) -> Result<(), LedgerError> {
    require_positive(amount)?;
    if lot.latest_credit < amount {
        return Err(LedgerError::InsufficientLotBalance {
            lot_id: lot.id,
            available: lot.latest_credit,
            requested: amount,
        });
    }
    Ok(())
}

fn apply_usage(lot: &mut CreditLot, amount: Decimal) -> Result<(), LedgerError> {
    require_available(lot, amount)?;
    lot.used_credit += amount;
    lot.latest_credit -= amount;
    Ok(())
}

fn apply_deduction(lot: &mut CreditLot, amount: Decimal) -> Result<(), LedgerError> {
    require_available(lot, amount)?;
    lot.deducted_credit += amount;
    lot.latest_credit -= amount;
    Ok(())
}

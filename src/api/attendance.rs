use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use super::finish;
use crate::engine::{ledger, work_hour};
use crate::error::{LeaveError, LeaveResult};
use crate::model::credit_lot::{CreditLot, LotSource, NewCreditLot};
use crate::store::{LeaveStore, LedgerTx};

pub use crate::engine::work_hour::{CreditConversion, convert_attendance};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceCredit {
    pub attendance_id: u64,
    pub employee_id: u64,
    pub conversion: CreditConversion,
    /// Work-hour lot linked to the attendance; absent for a neutral day.
    pub lot: Option<CreditLot>,
    /// Deficit actually charged against existing lots.
    pub charged: Decimal,
    pub balance: Decimal,
}

/* =========================
Credit a completed attendance
========================= */
/// Convert a clocked-out attendance into ledger credit.
///
/// Overtime becomes a new `work_hour` lot. Undertime is charged against the
/// employee's open lots newest first; the day is still recorded as an empty
/// `work_hour` lot carrying the resulting balance.
#[instrument(name = "record_attendance_credit", skip(store))]
pub async fn record_attendance_credit<S: LeaveStore>(
    store: &S,
    attendance_id: u64,
) -> LeaveResult<AttendanceCredit> {
    let mut tx = store.begin().await?;
    let result = record_in(&mut tx, attendance_id).await;
    finish(tx, result).await
}

async fn record_in<T: LedgerTx>(tx: &mut T, attendance_id: u64) -> LeaveResult<AttendanceCredit> {
    let attendance = tx
        .lock_attendance(attendance_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Attendance {attendance_id}")))?;

    if attendance.work_hour.is_some() {
        return Err(LeaveError::AlreadyConverted(attendance_id));
    }
    let time_out: NaiveDateTime = attendance.time_out.ok_or_else(|| {
        LeaveError::Validation(format!("Attendance {attendance_id} has no time out yet"))
    })?;

    let employee_id = attendance.employee_id;
    let balance = ledger::total_balance(tx, employee_id).await?;
    let conversion = work_hour::convert_attendance(attendance.time_in, time_out, balance);

    tx.set_work_hour(attendance_id, conversion.deviation).await?;

    let mut charged = Decimal::ZERO;
    let lot = if conversion.earned > Decimal::ZERO {
        let lot = NewCreditLot::earned(employee_id, LotSource::WorkHour, conversion.earned, time_out)
            .with_attendance(attendance_id);
        Some(ledger::create_lot(tx, lot).await?)
    } else if conversion.deducted > Decimal::ZERO {
        charged = ledger::charge_deficit(tx, employee_id, conversion.deducted).await?;
        let marker = NewCreditLot::earned(employee_id, LotSource::WorkHour, Decimal::ZERO, time_out)
            .with_attendance(attendance_id);
        Some(ledger::create_lot(tx, marker).await?)
    } else {
        None
    };

    let balance = ledger::total_balance(tx, employee_id).await?;

    info!(
        attendance_id,
        employee_id,
        deviation = %conversion.deviation,
        earned = %conversion.earned,
        %charged,
        %balance,
        "Attendance credited"
    );

    Ok(AttendanceCredit {
        attendance_id,
        employee_id,
        conversion,
        lot,
        charged,
        balance,
    })
}

//! In-process store.
//!
//! Each unit of work holds the store mutex for its whole lifetime and edits a
//! private copy of the state, which replaces the shared state on commit. That
//! serializes writers the same way row locks do and makes rollback a drop.
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LeaveStore, LedgerTx, StoreResult};
use crate::error::StoreError;
use crate::model::{
    attendance::Attendance,
    credit_lot::{CreditLot, LotSource, NewCreditLot},
    employee::{Employee, EmployeeBalance},
    leave_transaction::{LeaveStatus, LeaveTransaction, NewLeaveTransaction},
    leave_type::LeaveType,
    role::Role,
};

/// Write that should fail on its next execution.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailPoint {
    InsertLot,
    UpdateLot,
    InsertLeave,
    UpdateLeaveStatus,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    employees: BTreeMap<u64, Employee>,
    leave_types: BTreeMap<u64, LeaveType>,
    lots: BTreeMap<u64, CreditLot>,
    leaves: BTreeMap<u64, LeaveTransaction>,
    attendance: BTreeMap<u64, Attendance>,
    next_lot_id: u64,
    next_leave_id: u64,
    armed_failure: Option<(FailPoint, StoreError)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_employee(&self, employee: Employee) {
        self.state.lock().await.employees.insert(employee.id, employee);
    }

    pub async fn add_leave_type(&self, leave_type: LeaveType) {
        self.state
            .lock()
            .await
            .leave_types
            .insert(leave_type.id, leave_type);
    }

    pub async fn add_attendance(&self, attendance: Attendance) {
        self.state
            .lock()
            .await
            .attendance
            .insert(attendance.id, attendance);
    }

    pub async fn attendance(&self, attendance_id: u64) -> Option<Attendance> {
        self.state.lock().await.attendance.get(&attendance_id).cloned()
    }

    pub async fn lot(&self, lot_id: u64) -> Option<CreditLot> {
        self.state.lock().await.lots.get(&lot_id).cloned()
    }

    pub async fn lots_of(&self, employee_id: u64) -> Vec<CreditLot> {
        self.state
            .lock()
            .await
            .lots
            .values()
            .filter(|lot| lot.employee_id == employee_id)
            .cloned()
            .collect()
    }

    pub async fn leave(&self, leave_id: u64) -> Option<LeaveTransaction> {
        self.state.lock().await.leaves.get(&leave_id).cloned()
    }

    pub async fn leave_count(&self) -> usize {
        self.state.lock().await.leaves.len()
    }

    /// Make the next `point` write (or commit) fail with `error`.
    pub async fn fail_next(&self, point: FailPoint, error: StoreError) {
        self.state.lock().await.armed_failure = Some((point, error));
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx { guard, work })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

impl MemoryTx {
    fn trip(&mut self, point: FailPoint) -> StoreResult<()> {
        if !matches!(&self.guard.armed_failure, Some((armed, _)) if *armed == point) {
            return Ok(());
        }

        // one-shot: disarm the shared state too, it survives a rollback
        self.work.armed_failure = None;
        match self.guard.armed_failure.take() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn sorted_newest_first(mut lots: Vec<CreditLot>) -> Vec<CreditLot> {
        lots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        lots
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn employee(&mut self, employee_id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.work.employees.get(&employee_id).cloned())
    }

    async fn employees_by_role(&mut self, roles: &[Role]) -> StoreResult<Vec<Employee>> {
        Ok(self
            .work
            .employees
            .values()
            .filter(|e| roles.contains(&e.role))
            .cloned()
            .collect())
    }

    async fn leave_type(&mut self, leave_type_id: u64) -> StoreResult<Option<LeaveType>> {
        Ok(self.work.leave_types.get(&leave_type_id).cloned())
    }

    async fn carry_over_leave_types(&mut self) -> StoreResult<Vec<LeaveType>> {
        Ok(self
            .work
            .leave_types
            .values()
            .filter(|t| t.is_carried_over)
            .cloned()
            .collect())
    }

    async fn total_balance(&mut self, employee_id: u64) -> StoreResult<Decimal> {
        Ok(self
            .work
            .lots
            .values()
            .filter(|lot| lot.employee_id == employee_id)
            .map(|lot| lot.latest_credit)
            .sum())
    }

    async fn balances(&mut self, role: Option<Role>) -> StoreResult<Vec<EmployeeBalance>> {
        let lots = &self.work.lots;
        Ok(self
            .work
            .employees
            .values()
            .filter(|e| role.is_none_or(|r| r == e.role))
            .map(|e| EmployeeBalance {
                employee_id: e.id,
                role: e.role,
                balance: lots
                    .values()
                    .filter(|lot| lot.employee_id == e.id)
                    .map(|lot| lot.latest_credit)
                    .sum(),
            })
            .collect())
    }

    async fn lots(&mut self, employee_id: u64) -> StoreResult<Vec<CreditLot>> {
        let lots = self
            .work
            .lots
            .values()
            .filter(|lot| lot.employee_id == employee_id)
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(lots))
    }

    async fn lock_deductible_lot(&mut self, employee_id: u64) -> StoreResult<Option<CreditLot>> {
        Ok(self.lock_open_lots(employee_id).await?.into_iter().next())
    }

    async fn lock_open_lots(&mut self, employee_id: u64) -> StoreResult<Vec<CreditLot>> {
        let lots = self
            .work
            .lots
            .values()
            .filter(|lot| lot.employee_id == employee_id && lot.latest_credit > Decimal::ZERO)
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(lots))
    }

    async fn lock_lot(&mut self, lot_id: u64) -> StoreResult<Option<CreditLot>> {
        Ok(self.work.lots.get(&lot_id).cloned())
    }

    async fn update_lot(&mut self, lot: &CreditLot) -> StoreResult<()> {
        self.trip(FailPoint::UpdateLot)?;
        let stored = self
            .work
            .lots
            .get_mut(&lot.id)
            .ok_or_else(|| StoreError::Persistence(format!("credit lot {} vanished", lot.id)))?;

        stored.used_credit = lot.used_credit;
        stored.deducted_credit = lot.deducted_credit;
        stored.latest_credit = lot.latest_credit;
        stored.leave_transaction_id = lot.leave_transaction_id;
        Ok(())
    }

    async fn insert_lot(
        &mut self,
        lot: &NewCreditLot,
        current_credit: Decimal,
    ) -> StoreResult<CreditLot> {
        self.trip(FailPoint::InsertLot)?;
        self.work.next_lot_id += 1;
        let created = CreditLot {
            id: self.work.next_lot_id,
            employee_id: lot.employee_id,
            leave_type_id: lot.leave_type_id,
            attendance_id: lot.attendance_id,
            leave_transaction_id: None,
            source: lot.source,
            earned_credit: lot.earned_credit,
            used_credit: lot.used_credit,
            deducted_credit: lot.deducted_credit,
            current_credit,
            latest_credit: lot.opening_balance(),
            created_at: lot.created_at,
        };
        self.work.lots.insert(created.id, created.clone());
        Ok(created)
    }

    async fn has_yearly_lot(&mut self, employee_id: u64, year: i32) -> StoreResult<bool> {
        use chrono::Datelike;

        Ok(self.work.lots.values().any(|lot| {
            lot.employee_id == employee_id
                && lot.source == LotSource::Yearly
                && lot.created_at.year() == year
        }))
    }

    async fn insert_leave(&mut self, leave: &NewLeaveTransaction) -> StoreResult<LeaveTransaction> {
        self.trip(FailPoint::InsertLeave)?;
        self.work.next_leave_id += 1;
        let created = LeaveTransaction {
            id: self.work.next_leave_id,
            employee_id: leave.employee_id,
            leave_type_id: leave.leave_type_id,
            status: LeaveStatus::Pending,
            start_date: leave.start_date,
            end_date: leave.end_date,
            total_leave: leave.total_leave,
            reason: leave.reason.clone(),
            rewarded_by_id: leave.rewarded_by_id,
            approved_by_id: None,
            filed_date: leave.filed_date,
            year: leave.year,
        };
        self.work.leaves.insert(created.id, created.clone());
        Ok(created)
    }

    async fn lock_leave(&mut self, leave_id: u64) -> StoreResult<Option<LeaveTransaction>> {
        Ok(self.work.leaves.get(&leave_id).cloned())
    }

    async fn update_leave_status(
        &mut self,
        leave_id: u64,
        status: LeaveStatus,
        approved_by_id: Option<u64>,
    ) -> StoreResult<()> {
        self.trip(FailPoint::UpdateLeaveStatus)?;
        let leave = self
            .work
            .leaves
            .get_mut(&leave_id)
            .ok_or_else(|| StoreError::Persistence(format!("leave transaction {leave_id} vanished")))?;

        leave.status = status;
        leave.approved_by_id = approved_by_id;
        Ok(())
    }

    async fn lock_attendance(&mut self, attendance_id: u64) -> StoreResult<Option<Attendance>> {
        Ok(self.work.attendance.get(&attendance_id).cloned())
    }

    async fn set_work_hour(&mut self, attendance_id: u64, work_hour: Decimal) -> StoreResult<()> {
        let attendance = self
            .work
            .attendance
            .get_mut(&attendance_id)
            .ok_or_else(|| StoreError::Persistence(format!("attendance {attendance_id} vanished")))?;

        attendance.work_hour = Some(work_hour);
        Ok(())
    }

    async fn commit(mut self) -> StoreResult<()> {
        self.trip(FailPoint::Commit)?;
        *self.guard = self.work;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

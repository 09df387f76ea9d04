//! Persistence seam.
//!
//! A [`LeaveStore`] opens a [`LedgerTx`], one unit of work with
//! commit/rollback semantics. Every `lock_*` method is a select-and-lock:
//! the returned row stays locked until the unit of work ends, so a balance
//! check followed by a deduction cannot interleave with another writer.
//! Dropping a `LedgerTx` without committing rolls it back.
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::model::{
    attendance::Attendance,
    credit_lot::{CreditLot, NewCreditLot},
    employee::{Employee, EmployeeBalance},
    leave_transaction::{LeaveStatus, LeaveTransaction, NewLeaveTransaction},
    leave_type::LeaveType,
    role::Role,
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait LeaveStore: Send + Sync {
    type Tx: LedgerTx;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}

#[async_trait]
pub trait LedgerTx: Send + Sized {
    // ---- accounts and policy (read-only collaborators) ----
    async fn employee(&mut self, employee_id: u64) -> StoreResult<Option<Employee>>;
    async fn employees_by_role(&mut self, roles: &[Role]) -> StoreResult<Vec<Employee>>;
    async fn leave_type(&mut self, leave_type_id: u64) -> StoreResult<Option<LeaveType>>;
    async fn carry_over_leave_types(&mut self) -> StoreResult<Vec<LeaveType>>;

    // ---- credit lots ----
    async fn total_balance(&mut self, employee_id: u64) -> StoreResult<Decimal>;
    async fn balances(&mut self, role: Option<Role>) -> StoreResult<Vec<EmployeeBalance>>;
    async fn lots(&mut self, employee_id: u64) -> StoreResult<Vec<CreditLot>>;
    /// Newest lot with `latest_credit > 0`, locked.
    async fn lock_deductible_lot(&mut self, employee_id: u64) -> StoreResult<Option<CreditLot>>;
    /// Every lot with `latest_credit > 0`, newest first, locked.
    async fn lock_open_lots(&mut self, employee_id: u64) -> StoreResult<Vec<CreditLot>>;
    async fn lock_lot(&mut self, lot_id: u64) -> StoreResult<Option<CreditLot>>;
    /// Persist the credit fields and transaction link of an existing lot.
    async fn update_lot(&mut self, lot: &CreditLot) -> StoreResult<()>;
    async fn insert_lot(&mut self, lot: &NewCreditLot, current_credit: Decimal)
    -> StoreResult<CreditLot>;
    /// Locks the employee's yearly grant, so two accrual runs cannot both
    /// see "no lot yet" for the same year.
    async fn has_yearly_lot(&mut self, employee_id: u64, year: i32) -> StoreResult<bool>;

    // ---- leave transactions ----
    async fn insert_leave(&mut self, leave: &NewLeaveTransaction) -> StoreResult<LeaveTransaction>;
    async fn lock_leave(&mut self, leave_id: u64) -> StoreResult<Option<LeaveTransaction>>;
    async fn update_leave_status(
        &mut self,
        leave_id: u64,
        status: LeaveStatus,
        approved_by_id: Option<u64>,
    ) -> StoreResult<()>;

    // ---- attendance ----
    async fn lock_attendance(&mut self, attendance_id: u64) -> StoreResult<Option<Attendance>>;
    async fn set_work_hour(&mut self, attendance_id: u64, work_hour: Decimal) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;
    async fn rollback(self) -> StoreResult<()>;
}

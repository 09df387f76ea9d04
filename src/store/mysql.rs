use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use super::{LeaveStore, LedgerTx, StoreResult};
use crate::model::{
    attendance::Attendance,
    credit_lot::{CreditLot, CreditLotRow, LotSource, NewCreditLot},
    employee::{Employee, EmployeeBalance, EmployeeRow},
    leave_transaction::{LeaveStatus, LeaveTransaction, LeaveTransactionRow, NewLeaveTransaction},
    leave_type::{LeaveType, LeaveTypeRow},
    role::Role,
};
use crate::utils::db_utils::{decode_row, decode_rows, map_sqlx_error};

const EMPLOYEE_SELECT: &str = r#"
    SELECT e.id, e.employee_code, e.first_name, e.last_name, u.role_id
    FROM employees e
    JOIN users u ON u.employee_id = e.id
"#;

const LEAVE_TYPE_SELECT: &str = r#"
    SELECT id, name, is_carried_over, notice_day, rule_id, base_value, grant_type
    FROM leave_types
"#;

const LOT_SELECT: &str = r#"
    SELECT id, employee_id, leave_type_id, attendance_id, leave_transaction_id, source,
           earned_credit, used_credit, deducted_credit, current_credit, latest_credit,
           created_at
    FROM credit_lots
"#;

const LEAVE_SELECT: &str = r#"
    SELECT id, employee_id, leave_type_id, status, start_date, end_date, total_leave,
           reason, rewarded_by_id, approved_by_id, filed_date, year
    FROM leave_transactions
"#;

#[derive(sqlx::FromRow)]
struct BalanceRow {
    employee_id: u64,
    role_id: u8,
    balance: Decimal,
}

impl TryFrom<BalanceRow> for EmployeeBalance {
    type Error = String;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        let role = Role::from_id(row.role_id).ok_or_else(|| {
            format!("employee {} has unknown role id {}", row.employee_id, row.role_id)
        })?;

        Ok(EmployeeBalance {
            employee_id: row.employee_id,
            role,
            balance: row.balance,
        })
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    type Tx = MySqlTx;

    async fn begin(&self) -> StoreResult<MySqlTx> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(MySqlTx { tx })
    }
}

pub struct MySqlTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl LedgerTx for MySqlTx {
    async fn employee(&mut self, employee_id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(employee_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn employees_by_role(&mut self, roles: &[Role]) -> StoreResult<Vec<Employee>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; roles.len()].join(", ");
        let sql = format!("{EMPLOYEE_SELECT} WHERE u.role_id IN ({placeholders}) ORDER BY e.id");

        let mut query = sqlx::query_as::<_, EmployeeRow>(&sql);
        for role in roles {
            query = query.bind(role.id());
        }

        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        decode_rows(rows)
    }

    async fn leave_type(&mut self, leave_type_id: u64) -> StoreResult<Option<LeaveType>> {
        let sql = format!("{LEAVE_TYPE_SELECT} WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveTypeRow>(&sql)
            .bind(leave_type_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn carry_over_leave_types(&mut self) -> StoreResult<Vec<LeaveType>> {
        let sql = format!("{LEAVE_TYPE_SELECT} WHERE is_carried_over = TRUE ORDER BY id");
        let rows = sqlx::query_as::<_, LeaveTypeRow>(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        decode_rows(rows)
    }

    async fn total_balance(&mut self, employee_id: u64) -> StoreResult<Decimal> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(latest_credit), 0) FROM credit_lots WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn balances(&mut self, role: Option<Role>) -> StoreResult<Vec<EmployeeBalance>> {
        let mut where_sql = String::new();
        if role.is_some() {
            where_sql.push_str(" WHERE u.role_id = ?");
        }

        let sql = format!(
            r#"
            SELECT e.id AS employee_id, u.role_id, COALESCE(SUM(c.latest_credit), 0) AS balance
            FROM employees e
            JOIN users u ON u.employee_id = e.id
            LEFT JOIN credit_lots c ON c.employee_id = e.id
            {where_sql}
            GROUP BY e.id, u.role_id
            ORDER BY e.id
            "#
        );

        let mut query = sqlx::query_as::<_, BalanceRow>(&sql);
        if let Some(role) = role {
            query = query.bind(role.id());
        }

        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        decode_rows(rows)
    }

    async fn lots(&mut self, employee_id: u64) -> StoreResult<Vec<CreditLot>> {
        let sql = format!("{LOT_SELECT} WHERE employee_id = ? ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, CreditLotRow>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        decode_rows(rows)
    }

    async fn lock_deductible_lot(&mut self, employee_id: u64) -> StoreResult<Option<CreditLot>> {
        let sql = format!(
            "{LOT_SELECT} WHERE employee_id = ? AND latest_credit > 0 \
             ORDER BY created_at DESC, id DESC LIMIT 1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, CreditLotRow>(&sql)
            .bind(employee_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn lock_open_lots(&mut self, employee_id: u64) -> StoreResult<Vec<CreditLot>> {
        let sql = format!(
            "{LOT_SELECT} WHERE employee_id = ? AND latest_credit > 0 \
             ORDER BY created_at DESC, id DESC FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, CreditLotRow>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        decode_rows(rows)
    }

    async fn lock_lot(&mut self, lot_id: u64) -> StoreResult<Option<CreditLot>> {
        let sql = format!("{LOT_SELECT} WHERE id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, CreditLotRow>(&sql)
            .bind(lot_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn update_lot(&mut self, lot: &CreditLot) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE credit_lots
            SET used_credit = ?, deducted_credit = ?, latest_credit = ?, leave_transaction_id = ?
            WHERE id = ?
            "#,
        )
        .bind(lot.used_credit)
        .bind(lot.deducted_credit)
        .bind(lot.latest_credit)
        .bind(lot.leave_transaction_id)
        .bind(lot.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn insert_lot(
        &mut self,
        lot: &NewCreditLot,
        current_credit: Decimal,
    ) -> StoreResult<CreditLot> {
        let latest_credit = lot.opening_balance();

        let result = sqlx::query(
            r#"
            INSERT INTO credit_lots
                (employee_id, leave_type_id, attendance_id, source, earned_credit, used_credit,
                 deducted_credit, current_credit, latest_credit, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(lot.employee_id)
        .bind(lot.leave_type_id)
        .bind(lot.attendance_id)
        .bind(lot.source.as_ref())
        .bind(lot.earned_credit)
        .bind(lot.used_credit)
        .bind(lot.deducted_credit)
        .bind(current_credit)
        .bind(latest_credit)
        .bind(lot.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(CreditLot {
            id: result.last_insert_id(),
            employee_id: lot.employee_id,
            leave_type_id: lot.leave_type_id,
            attendance_id: lot.attendance_id,
            leave_transaction_id: None,
            source: lot.source,
            earned_credit: lot.earned_credit,
            used_credit: lot.used_credit,
            deducted_credit: lot.deducted_credit,
            current_credit,
            latest_credit,
            created_at: lot.created_at,
        })
    }

    async fn has_yearly_lot(&mut self, employee_id: u64, year: i32) -> StoreResult<bool> {
        // overlapping accrual runs queue on the employee row
        sqlx::query("SELECT id FROM employees WHERE id = ? FOR UPDATE")
            .bind(employee_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        // locking read: sees lots committed by a run we waited on
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM credit_lots
            WHERE employee_id = ? AND source = ? AND YEAR(created_at) = ?
            FOR UPDATE
            "#,
        )
        .bind(employee_id)
        .bind(LotSource::Yearly.as_ref())
        .bind(year)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count > 0)
    }

    async fn insert_leave(&mut self, leave: &NewLeaveTransaction) -> StoreResult<LeaveTransaction> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_transactions
                (employee_id, leave_type_id, status, start_date, end_date, total_leave, reason,
                 rewarded_by_id, filed_date, year)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.leave_type_id)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.total_leave)
        .bind(&leave.reason)
        .bind(leave.rewarded_by_id)
        .bind(leave.filed_date)
        .bind(leave.year)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(LeaveTransaction {
            id: result.last_insert_id(),
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
        })
    }

    async fn lock_leave(&mut self, leave_id: u64) -> StoreResult<Option<LeaveTransaction>> {
        let sql = format!("{LEAVE_SELECT} WHERE id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, LeaveTransactionRow>(&sql)
            .bind(leave_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(decode_row).transpose()
    }

    async fn update_leave_status(
        &mut self,
        leave_id: u64,
        status: LeaveStatus,
        approved_by_id: Option<u64>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE leave_transactions
            SET status = ?, approved_by_id = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.as_ref())
        .bind(approved_by_id)
        .bind(leave_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn lock_attendance(&mut self, attendance_id: u64) -> StoreResult<Option<Attendance>> {
        sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, employee_id, time_in, time_out, work_hour
            FROM attendance
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(attendance_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn set_work_hour(&mut self, attendance_id: u64, work_hour: Decimal) -> StoreResult<()> {
        sqlx::query("UPDATE attendance SET work_hour = ? WHERE id = ?")
            .bind(work_hour)
            .bind(attendance_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LotSource {
    Manual,
    Yearly,
    WorkHour,
}

/// One accrual event and its running usage. Rows are never deleted.
///
/// `latest_credit == earned_credit - used_credit - deducted_credit` and
/// `latest_credit >= 0` hold for every persisted lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLot {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: Option<u64>,
    pub attendance_id: Option<u64>,
    pub leave_transaction_id: Option<u64>,
    pub source: LotSource,
    pub earned_credit: Decimal,
    /// Consumed by approved leave.
    pub used_credit: Decimal,
    /// Charged by short attendance days.
    pub deducted_credit: Decimal,
    /// Employee balance right after this lot was created.
    pub current_credit: Decimal,
    pub latest_credit: Decimal,
    pub created_at: NaiveDateTime,
}

impl CreditLot {
    pub fn is_balanced(&self) -> bool {
        self.latest_credit == self.earned_credit - self.used_credit - self.deducted_credit
            && self.latest_credit >= Decimal::ZERO
    }
}

/// Insert payload; `latest_credit` and `current_credit` are derived by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCreditLot {
    pub employee_id: u64,
    pub leave_type_id: Option<u64>,
    pub attendance_id: Option<u64>,
    pub source: LotSource,
    pub earned_credit: Decimal,
    pub used_credit: Decimal,
    pub deducted_credit: Decimal,
    pub created_at: NaiveDateTime,
}

impl NewCreditLot {
    pub fn earned(
        employee_id: u64,
        source: LotSource,
        amount: Decimal,
        created_at: NaiveDateTime,
    ) -> Self {
        NewCreditLot {
            employee_id,
            leave_type_id: None,
            attendance_id: None,
            source,
            earned_credit: amount,
            used_credit: Decimal::ZERO,
            deducted_credit: Decimal::ZERO,
            created_at,
        }
    }

    pub fn with_leave_type(mut self, leave_type_id: u64) -> Self {
        self.leave_type_id = Some(leave_type_id);
        self
    }

    pub fn with_attendance(mut self, attendance_id: u64) -> Self {
        self.attendance_id = Some(attendance_id);
        self
    }

    pub fn opening_balance(&self) -> Decimal {
        self.earned_credit - self.used_credit - self.deducted_credit
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct CreditLotRow {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: Option<u64>,
    pub attendance_id: Option<u64>,
    pub leave_transaction_id: Option<u64>,
    pub source: String,
    pub earned_credit: Decimal,
    pub used_credit: Decimal,
    pub deducted_credit: Decimal,
    pub current_credit: Decimal,
    pub latest_credit: Decimal,
    pub created_at: NaiveDateTime,
}

impl TryFrom<CreditLotRow> for CreditLot {
    type Error = String;

    fn try_from(row: CreditLotRow) -> Result<Self, Self::Error> {
        let source = row
            .source
            .parse::<LotSource>()
            .map_err(|_| format!("credit lot {} has unknown source {}", row.id, row.source))?;

        Ok(CreditLot {
            id: row.id,
            employee_id: row.employee_id,
            leave_type_id: row.leave_type_id,
            attendance_id: row.attendance_id,
            leave_transaction_id: row.leave_transaction_id,
            source,
            earned_credit: row.earned_credit,
            used_credit: row.used_credit,
            deducted_credit: row.deducted_credit,
            current_credit: row.current_credit,
            latest_credit: row.latest_credit,
            created_at: row.created_at,
        })
    }
}

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub time_in: NaiveDateTime,
    pub time_out: Option<NaiveDateTime>,
    /// Signed deviation from the 8 hour day, set once credit is recorded.
    pub work_hour: Option<Decimal>,
}

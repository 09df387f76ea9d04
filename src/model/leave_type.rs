use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// `rule_id` value for leave that may only be filed for today.
pub const SAME_DAY_ONLY_RULE: i32 = 3;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GrantType {
    Default,
    Special,
    Rewarded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    /// Unused balance survives the end of the calendar year.
    pub is_carried_over: bool,
    /// `> 0` advance notice in days, `0` same-day or no past dates,
    /// `< 0` backdating window in days.
    pub notice_day: i32,
    pub rule_id: i32,
    /// Per-request day cap and yearly accrual amount.
    pub base_value: Decimal,
    pub grant_type: GrantType,
}

impl LeaveType {
    pub fn is_same_day_only(&self) -> bool {
        self.notice_day == 0 && self.rule_id == SAME_DAY_ONLY_RULE
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct LeaveTypeRow {
    pub id: u64,
    pub name: String,
    pub is_carried_over: bool,
    pub notice_day: i32,
    pub rule_id: i32,
    pub base_value: Decimal,
    pub grant_type: String,
}

impl TryFrom<LeaveTypeRow> for LeaveType {
    type Error = String;

    fn try_from(row: LeaveTypeRow) -> Result<Self, Self::Error> {
        let grant_type = row
            .grant_type
            .parse::<GrantType>()
            .map_err(|_| format!("leave type {} has unknown grant type {}", row.id, row.grant_type))?;

        Ok(LeaveType {
            id: row.id,
            name: row.name,
            is_carried_over: row.is_carried_over,
            notice_day: row.notice_day,
            rule_id: row.rule_id,
            base_value: row.base_value,
            grant_type,
        })
    }
}

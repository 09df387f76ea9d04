use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Employee = 2,
    Intern = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Employee),
            3 => Some(Role::Intern),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Interns are paid per hour and never receive the yearly grant.
    pub fn accrues_yearly(self) -> bool {
        matches!(self, Role::Admin | Role::Employee)
    }

    pub fn can_decide_leave(self) -> bool {
        self == Role::Admin
    }
}

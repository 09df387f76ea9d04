use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Read-only view of an account owned by the account-management side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, sqlx::FromRow)]
pub struct EmployeeRow {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: u8,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = String;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role = Role::from_id(row.role_id)
            .ok_or_else(|| format!("employee {} has unknown role id {}", row.id, row.role_id))?;

        Ok(Employee {
            id: row.id,
            employee_code: row.employee_code,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
        })
    }
}

/// One line of the admin-wide balance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeBalance {
    pub employee_id: u64,
    pub role: Role,
    pub balance: rust_decimal::Decimal,
}

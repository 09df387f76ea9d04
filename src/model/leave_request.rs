use serde::{Deserialize, Serialize};

/// Raw leave filing as submitted by a form; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub employee_id: Option<u64>,
    pub leave_type_id: Option<u64>,
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub reason: Option<String>,
}

impl LeaveRequest {
    /// Names of fields that are absent or blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map(str::trim).is_none_or(str::is_empty)
        }

        let mut missing = Vec::new();
        if self.employee_id.is_none() {
            missing.push("employee_id");
        }
        if self.leave_type_id.is_none() {
            missing.push("leave_type_id");
        }
        if blank(&self.start_date) {
            missing.push("start_date");
        }
        if blank(&self.end_date) {
            missing.push("end_date");
        }
        if blank(&self.reason) {
            missing.push("reason");
        }
        missing
    }
}

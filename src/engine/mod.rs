pub mod eligibility;
pub mod ledger;
pub mod work_hour;

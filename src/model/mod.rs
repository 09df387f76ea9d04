pub mod attendance;
pub mod credit_lot;
pub mod employee;
pub mod leave_request;
pub mod leave_transaction;
pub mod leave_type;
pub mod role;

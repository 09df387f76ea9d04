//! Operations exposed to the controller layer.
//!
//! Each call opens exactly one unit of work on the store and either commits
//! everything it did or rolls all of it back.
use tracing::{error, warn};

use crate::error::{LeaveError, LeaveResult};
use crate::store::LedgerTx;

pub mod attendance;
pub mod credit;
pub mod leave_request;

/// Commit on success, roll back on failure.
pub(crate) async fn finish<T: LedgerTx, R>(tx: T, result: LeaveResult<R>) -> LeaveResult<R> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                let err = LeaveError::from(e);
                log_store_failure(&err);
                err
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            log_store_failure(&err);
            Err(err)
        }
    }
}

fn log_store_failure(err: &LeaveError) {
    match err {
        LeaveError::Persistence(detail) => {
            error!(error = %detail, "Unit of work rolled back after a store failure")
        }
        LeaveError::ConcurrencyConflict(detail) => {
            warn!(error = %detail, "Unit of work rolled back after a lock conflict")
        }
        _ => {}
    }
}

use sqlx::mysql::MySqlDatabaseError;

use crate::error::StoreError;

/// MySQL `ER_LOCK_WAIT_TIMEOUT`
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
/// MySQL `ER_LOCK_DEADLOCK`
const ER_LOCK_DEADLOCK: u16 = 1213;
/// SQLSTATE for serialization failures
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// ===============================
/// Classify a driver error
/// ===============================
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let lock_conflict = db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| matches!(e.number(), ER_LOCK_WAIT_TIMEOUT | ER_LOCK_DEADLOCK));

        if lock_conflict || db_err.code().as_deref() == Some(SQLSTATE_SERIALIZATION_FAILURE) {
            tracing::warn!(error = %err, "Lock conflict, unit of work rolled back");
            return StoreError::Conflict(db_err.message().to_string());
        }
    }

    tracing::error!(error = %err, "Store operation failed");
    StoreError::Persistence(err.to_string())
}

/// ===============================
/// Convert a raw row into its model
/// ===============================
pub fn decode_row<R, T>(row: R) -> Result<T, StoreError>
where
    T: TryFrom<R, Error = String>,
{
    T::try_from(row).map_err(|msg| {
        tracing::error!(error = %msg, "Corrupt row");
        StoreError::Persistence(msg)
    })
}

pub fn decode_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter().map(decode_row).collect()
}

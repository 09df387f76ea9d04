use anyhow::Context;
use chrono::Local;
use tracing::{error, info};
use tracing_appender::rolling;

use hrm_leave_ledger::config::Config;
use hrm_leave_ledger::db::init_db;
use hrm_leave_ledger::run_yearly_accrual;
use hrm_leave_ledger::store::MySqlStore;

/// Yearly accrual trigger, meant to be run by cron on January 1st.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "accrual.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Yearly accrual starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let store = MySqlStore::new(pool);

    let now = Local::now().naive_local();
    match run_yearly_accrual(&store, now).await {
        Ok(summary) => {
            info!(
                year = summary.year,
                amount = %summary.amount,
                granted = summary.granted.len(),
                skipped = summary.skipped.len(),
                "Yearly accrual finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, retryable = e.is_retryable(), "Yearly accrual failed");
            Err(e).context("Yearly accrual failed")
        }
    }
}

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::sync::Mutex;

use crate::quota::QuotaStore;

/// Next occurrence of the configured wall-clock instant strictly after `now`.
pub fn next_reset_after(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Clears every group counter once a day at the configured instant. Runs as a
/// spawned task for the life of the process; the loop never exits on its own.
/// Lazy per-access reset stamps the same calendar date, so the two mechanisms
/// never double-reset.
pub async fn run_daily_reset(quotas: Arc<Mutex<QuotaStore>>, hour: u32, minute: u32) {
    loop {
        let now = Utc::now();
        let next = next_reset_after(now, hour, minute);
        let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
        tracing::info!(
            hours_until = wait.as_secs_f64() / 3600.0,
            "group quota reset scheduled"
        );
        tokio::time::sleep(wait).await;

        let today = Utc::now().date_naive();
        quotas.lock().await.reset_all_groups(today);
        tracing::info!("daily group like limits reset");
    }
}

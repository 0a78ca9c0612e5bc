//! Schedule reminder loop
//!
//! Polls wall-clock time against the stored schedule. Exact "HH:MM"
//! string match, so a reminder fires only during the scheduled minute
//! and at most once per poll tick regardless of duplicate entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::db::StoreHandle;
use crate::session::SessionState;
use crate::voice::VoiceSink;

/// Spoken when a scheduled time matches the current minute
pub const REMINDER_LINE: &str = "It's time for your scheduled activity.";

/// Whether the schedule contains the current "HH:MM" minute
#[must_use]
pub fn schedule_due(schedule: &[String], now_hhmm: &str) -> bool {
    schedule.iter().any(|entry| entry == now_hhmm)
}

/// Run one poll tick against the given wall-clock minute
pub async fn alarm_tick(
    store: &StoreHandle,
    session: &SessionState,
    sink: &VoiceSink,
    now_hhmm: &str,
) {
    let patient = session.patient();

    match store.select(&patient).await {
        Ok(Some(record)) => {
            if schedule_due(&record.schedule, now_hhmm) {
                tracing::info!(patient = %patient, time = now_hhmm, "alarm triggered");
                if let Err(e) = sink.speak(REMINDER_LINE).await {
                    tracing::error!(error = %e, "reminder speech enqueue failed");
                }
            }
        }
        Ok(None) => {
            tracing::debug!(patient = %patient, "no record for alarm check, skipping");
        }
        Err(e) => {
            tracing::error!(error = %e, "alarm schedule lookup failed");
        }
    }
}

/// Run the alarm loop until shutdown
pub async fn run_alarm_loop(
    store: StoreHandle,
    session: Arc<SessionState>,
    sink: VoiceSink,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let now = chrono::Local::now().format("%H:%M").to_string();
        alarm_tick(&store, &session, &sink, &now).await;

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("alarm loop shutting down");
                    break;
                }
            }
            () = tokio::time::sleep(interval) => {}
        }
    }
}

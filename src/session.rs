//! Shared session state for one monitoring run
//!
//! One `SessionState` is shared by every monitoring loop. Counters are
//! atomics so the status path can read them while the intake path
//! increments; the active patient name changes only through an explicit
//! transition, never by re-reading mutable input fields mid-session.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Mutable state shared across the monitoring loops of one session
#[derive(Debug, Default)]
pub struct SessionState {
    food: AtomicU64,
    water: AtomicU64,
    active: AtomicBool,
    patient: RwLock<String>,
}

impl SessionState {
    /// Create a new, inactive session with zeroed counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session for `patient`: zero both counters and mark active
    pub fn begin(&self, patient: &str) {
        self.food.store(0, Ordering::SeqCst);
        self.water.store(0, Ordering::SeqCst);
        self.set_patient(patient);
        self.active.store(true, Ordering::SeqCst);
    }

    /// Mark the session inactive
    pub fn end(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Whether a session is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Record one food intake, returning the running count
    pub fn record_food(&self) -> u64 {
        self.food.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record one water intake, returning the running count
    pub fn record_water(&self) -> u64 {
        self.water.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current food intake count
    #[must_use]
    pub fn food_count(&self) -> u64 {
        self.food.load(Ordering::SeqCst)
    }

    /// Current water intake count
    #[must_use]
    pub fn water_count(&self) -> u64 {
        self.water.load(Ordering::SeqCst)
    }

    /// The active patient name
    ///
    /// Captured at submission; a poisoned lock falls back to empty, which
    /// downstream lookups treat as record-not-found.
    #[must_use]
    pub fn patient(&self) -> String {
        self.patient
            .read()
            .map(|name| name.clone())
            .unwrap_or_default()
    }

    /// Explicit patient hand-off: retarget subsequent store lookups
    pub fn set_patient(&self, name: &str) {
        if let Ok(mut patient) = self.patient.write() {
            *patient = name.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_begin_resets_counters() {
        let session = SessionState::new();
        session.record_food();
        session.record_water();

        session.begin("ada");
        assert_eq!(session.food_count(), 0);
        assert_eq!(session.water_count(), 0);
        assert_eq!(session.patient(), "ada");
        assert!(session.is_active());
    }

    #[test]
    fn test_counters_increment_independently() {
        let session = SessionState::new();
        session.begin("ada");

        assert_eq!(session.record_food(), 1);
        assert_eq!(session.record_food(), 2);
        assert_eq!(session.record_water(), 1);
        assert_eq!(session.food_count(), 2);
        assert_eq!(session.water_count(), 1);
    }

    #[test]
    fn test_patient_changes_only_on_explicit_transition() {
        let session = SessionState::new();
        session.begin("ada");

        session.record_food();
        assert_eq!(session.patient(), "ada");

        // Hand-off retargets subsequent operations
        session.set_patient("grace");
        assert_eq!(session.patient(), "grace");
        // Counters carry over; only begin() resets them
        assert_eq!(session.food_count(), 1);
    }

    #[test]
    fn test_concurrent_reads_never_observe_torn_counts() {
        let session = Arc::new(SessionState::new());
        session.begin("ada");

        let writer = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    session.record_food();
                }
            })
        };

        let mut last = 0;
        for _ in 0..1000 {
            let seen = session.food_count();
            assert!(seen >= last, "counter went backwards: {seen} < {last}");
            assert!(seen <= 1000);
            last = seen;
        }

        writer.join().unwrap();
        assert_eq!(session.food_count(), 1000);
    }
}

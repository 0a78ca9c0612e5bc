//! Single-writer store queue worker
//!
//! Every monitoring loop talks to the patient store by enqueuing a
//! [`StoreRequest`]; one worker task drains the queue and applies each
//! request as its own committed statement. That single consumer is the
//! whole write-race story: nothing else holds a connection at runtime.
//!
//! Selects carry their own reply channel, so concurrent lookups from the
//! speech and alarm loops can never consume each other's responses.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::patient::{PatientRecord, PatientRepo};
use crate::{Error, Result};

/// Depth of the request queue; enqueuers briefly backpressure when full
const QUEUE_DEPTH: usize = 64;

/// A request for the store worker
#[derive(Debug)]
pub enum StoreRequest {
    /// Insert (or replace) a patient record
    Insert(PatientRecord),
    /// Set the stored food intake count for a patient
    UpdateFood { count: i64, name: String },
    /// Set the stored water intake count for a patient
    UpdateWater { count: i64, name: String },
    /// Look up a patient by name; `None` means not found
    Select {
        name: String,
        reply: oneshot::Sender<Option<PatientRecord>>,
    },
}

/// Cloneable handle for enqueuing store requests
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreRequest>,
}

impl StoreHandle {
    /// Enqueue an insert (fire-and-forget)
    ///
    /// # Errors
    ///
    /// Returns error if the worker has shut down
    pub async fn insert(&self, record: PatientRecord) -> Result<()> {
        self.send(StoreRequest::Insert(record)).await
    }

    /// Enqueue a food count update (fire-and-forget)
    ///
    /// # Errors
    ///
    /// Returns error if the worker has shut down
    pub async fn update_food(&self, count: i64, name: &str) -> Result<()> {
        self.send(StoreRequest::UpdateFood {
            count,
            name: name.to_string(),
        })
        .await
    }

    /// Enqueue a water count update (fire-and-forget)
    ///
    /// # Errors
    ///
    /// Returns error if the worker has shut down
    pub async fn update_water(&self, count: i64, name: &str) -> Result<()> {
        self.send(StoreRequest::UpdateWater {
            count,
            name: name.to_string(),
        })
        .await
    }

    /// Look up a patient record by name
    ///
    /// `Ok(None)` is the normal not-found outcome, never an error.
    ///
    /// # Errors
    ///
    /// Returns error if the worker has shut down
    pub async fn select(&self, name: &str) -> Result<Option<PatientRecord>> {
        let (reply, rx) = oneshot::channel();
        self.send(StoreRequest::Select {
            name: name.to_string(),
            reply,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Channel("store worker dropped select reply".to_string()))
    }

    async fn send(&self, request: StoreRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| Error::Channel("store worker queue closed".to_string()))
    }
}

/// Spawn the store worker task
///
/// The worker owns all store access until the shutdown watch flips; it
/// then drops the queue and exits. Request failures are logged and the
/// worker keeps draining - a bad request never kills persistence.
#[must_use]
pub fn spawn_store_worker(
    repo: PatientRepo,
    mut shutdown: watch::Receiver<bool>,
) -> (StoreHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(QUEUE_DEPTH);

    let handle = tokio::spawn(async move {
        tracing::debug!("store worker started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender means shutdown can never arrive; stop too
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("store worker shutting down");
                        break;
                    }
                }
                request = rx.recv() => {
                    let Some(request) = request else {
                        tracing::debug!("store queue closed");
                        break;
                    };
                    apply(&repo, request);
                }
            }
        }
    });

    (StoreHandle { tx }, handle)
}

/// Apply one request against the store
fn apply(repo: &PatientRepo, request: StoreRequest) {
    match request {
        StoreRequest::Insert(record) => {
            let name = record.name.clone();
            match repo.insert(&record) {
                Ok(()) => tracing::debug!(patient = %name, "record inserted"),
                Err(e) => tracing::error!(patient = %name, error = %e, "insert failed"),
            }
        }
        StoreRequest::UpdateFood { count, name } => {
            if let Err(e) = repo.update_food(count, &name) {
                tracing::error!(patient = %name, error = %e, "food update failed");
            }
        }
        StoreRequest::UpdateWater { count, name } => {
            if let Err(e) = repo.update_water(count, &name) {
                tracing::error!(patient = %name, error = %e, "water update failed");
            }
        }
        StoreRequest::Select { name, reply } => {
            let record = match repo.find(&name) {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(patient = %name, error = %e, "select failed");
                    None
                }
            };
            // Requester may have timed out and dropped the receiver
            let _ = reply.send(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory;

    fn sample_record(name: &str) -> PatientRecord {
        PatientRecord {
            name: name.to_string(),
            age: 70,
            disease: "diabetes".to_string(),
            allergic_foods: vec!["peanut".to_string()],
            schedule: vec!["09:00".to_string()],
            food_intake: 0,
            water_intake: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_then_select() {
        let repo = PatientRepo::new(init_memory().unwrap());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (store, worker) = spawn_store_worker(repo, shutdown_rx);

        let record = sample_record("ada");
        store.insert(record.clone()).await.unwrap();

        let found = store.select("ada").await.unwrap().unwrap();
        assert_eq!(found, record);

        drop(store);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_select_unknown_is_none_and_worker_survives() {
        let repo = PatientRepo::new(init_memory().unwrap());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (store, worker) = spawn_store_worker(repo, shutdown_rx);

        assert!(store.select("nobody").await.unwrap().is_none());

        // Worker still serves requests afterwards
        store.insert(sample_record("ada")).await.unwrap();
        assert!(store.select("ada").await.unwrap().is_some());

        drop(store);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_update_converges_within_one_hop() {
        let repo = PatientRepo::new(init_memory().unwrap());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (store, worker) = spawn_store_worker(repo, shutdown_rx);

        store.insert(sample_record("ada")).await.unwrap();
        for count in 1..=4_i64 {
            store.update_food(count, "ada").await.unwrap();
        }

        // FIFO queue: the select observes every earlier update
        let found = store.select("ada").await.unwrap().unwrap();
        assert_eq!(found.food_intake, 4);

        drop(store);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_worker() {
        let repo = PatientRepo::new(init_memory().unwrap());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (store, worker) = spawn_store_worker(repo, shutdown_rx);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), worker)
            .await
            .expect("worker did not stop within bound")
            .unwrap();

        // Handle now reports the queue as closed
        assert!(store.select("ada").await.is_err());
    }
}

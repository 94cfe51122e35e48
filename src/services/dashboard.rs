use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::Reservation;
use crate::services::display::{self, ReservationView};
use crate::services::policy;
use crate::services::store::{ReservationStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("reservation {0} can no longer be cancelled from the dashboard")]
    NotEligible(String),

    #[error("an action on reservation {0} is already in progress")]
    Busy(String),

    #[error("deleting a reservation must be confirmed")]
    ConfirmationRequired,

    #[error("reservation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub reservations: Vec<ReservationView>,
    pub active_count: usize,
    pub stale: bool,
}

#[derive(Default)]
struct Snapshot {
    reservations: Vec<Reservation>,
    loaded: bool,
    stale: bool,
    /// Generation of the fetch the list came from.
    applied: u64,
}

/// Reservation dashboard for one session. Holds the last list fetched from
/// the store and the ids that currently have an action in flight.
pub struct ReservationDashboard {
    store: Arc<dyn ReservationStore>,
    snapshot: Mutex<Snapshot>,
    busy: Mutex<HashSet<String>>,
    generation: AtomicU64,
}

/// Marks an id busy for as long as it is alive.
struct BusyGuard<'a> {
    busy: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.lock().unwrap().remove(&self.id);
    }
}

impl ReservationDashboard {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self {
            store,
            snapshot: Mutex::new(Snapshot::default()),
            busy: Mutex::new(HashSet::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Re-fetches the list. On failure the previous list stays in place and
    /// is flagged stale.
    ///
    /// Fetches may overlap; a response only replaces the list when it was
    /// requested after the one currently shown.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match self.store.list_mine().await {
            Ok(mut reservations) => {
                policy::sort_for_display(&mut reservations);
                let mut snapshot = self.snapshot.lock().unwrap();
                if generation <= snapshot.applied {
                    tracing::debug!(generation, "discarding out-of-order reservation list");
                    return Ok(());
                }
                snapshot.reservations = reservations;
                snapshot.loaded = true;
                snapshot.stale = false;
                snapshot.applied = generation;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load reservations, keeping previous list");
                let mut snapshot = self.snapshot.lock().unwrap();
                if generation > snapshot.applied {
                    snapshot.stale = true;
                }
                Err(e)
            }
        }
    }

    /// Whether a list was ever loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.snapshot.lock().unwrap().loaded
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.snapshot.lock().unwrap().reservations.clone()
    }

    pub fn active_count(&self) -> usize {
        policy::active_count(&self.snapshot.lock().unwrap().reservations)
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.busy.lock().unwrap().contains(id)
    }

    pub fn view(&self, now: NaiveDateTime) -> DashboardView {
        let snapshot = self.snapshot.lock().unwrap();
        let busy = self.busy.lock().unwrap();
        DashboardView {
            reservations: snapshot
                .reservations
                .iter()
                .map(|r| display::reservation_view(r, now, busy.contains(&r.id)))
                .collect(),
            active_count: policy::active_count(&snapshot.reservations),
            stale: snapshot.stale,
        }
    }

    fn acquire(&self, id: &str) -> Result<BusyGuard<'_>, DashboardError> {
        let mut busy = self.busy.lock().unwrap();
        if !busy.insert(id.to_string()) {
            return Err(DashboardError::Busy(id.to_string()));
        }
        Ok(BusyGuard {
            busy: &self.busy,
            id: id.to_string(),
        })
    }

    fn find(&self, id: &str) -> Option<Reservation> {
        self.snapshot
            .lock()
            .unwrap()
            .reservations
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    async fn resync(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "re-fetch after reservation action failed");
        }
    }

    pub async fn request_cancel(&self, id: &str, now: NaiveDateTime) -> Result<(), DashboardError> {
        let _guard = self.acquire(id)?;

        let reservation = match self.find(id) {
            Some(r) => r,
            None => {
                self.refresh().await?;
                self.find(id)
                    .ok_or_else(|| DashboardError::NotFound(id.to_string()))?
            }
        };

        if !policy::can_cancel(&reservation, now) {
            return Err(DashboardError::NotEligible(id.to_string()));
        }

        let result = self.store.cancel(id).await;
        self.resync().await;

        match result {
            Ok(()) => {
                tracing::info!(reservation_id = %id, "reservation cancelled");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(reservation_id = %id, error = %e, "cancel rejected");
                Err(e.into())
            }
        }
    }

    pub async fn request_delete(&self, id: &str, confirmed: bool) -> Result<(), DashboardError> {
        if !confirmed {
            return Err(DashboardError::ConfirmationRequired);
        }
        let _guard = self.acquire(id)?;

        let result = self.store.delete(id).await;
        self.resync().await;

        match result {
            Ok(()) => {
                tracing::info!(reservation_id = %id, "reservation deleted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(reservation_id = %id, error = %e, "delete rejected");
                Err(e.into())
            }
        }
    }
}

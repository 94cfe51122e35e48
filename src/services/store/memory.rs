use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};

use super::{ReservationStore, StoreConnector, StoreError};
use crate::models::{Reservation, ReservationStatus, Session};
use crate::services::policy::CANCELLATION_LEAD_HOURS;

pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// In-process stand-in for the reservation API. Reservations are keyed by
/// session token and the cancel rules are enforced here the same way the
/// real backend enforces them.
pub struct MemoryBackend {
    reservations: Mutex<HashMap<String, Vec<Reservation>>>,
    clock: Clock,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_clock(local_now)
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            reservations: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Loads a fixture of the form `{"<token>": [<reservation>, ...]}`.
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let seed: HashMap<String, Vec<Reservation>> =
            serde_json::from_str(s).context("invalid reservation fixture")?;
        let backend = Self::new();
        *backend.reservations.lock().unwrap() = seed;
        Ok(backend)
    }

    pub fn insert(&self, token: &str, reservation: Reservation) {
        self.reservations
            .lock()
            .unwrap()
            .entry(token.to_string())
            .or_default()
            .push(reservation);
    }

    /// Moves a reservation to a new status out-of-band, the way the backend
    /// completes appointments on its own.
    pub fn set_status(&self, token: &str, id: &str, status: ReservationStatus) -> bool {
        let mut all = self.reservations.lock().unwrap();
        match all
            .get_mut(token)
            .and_then(|list| list.iter_mut().find(|r| r.id == id))
        {
            Some(r) => {
                r.status = status;
                true
            }
            None => false,
        }
    }

    fn list(&self, token: &str) -> Vec<Reservation> {
        self.reservations
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    fn cancel(&self, token: &str, id: &str) -> Result<(), StoreError> {
        let now = (self.clock)();
        let mut all = self.reservations.lock().unwrap();
        let reservation = all
            .get_mut(token)
            .and_then(|list| list.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if reservation.status.is_terminal() {
            return Err(StoreError::AlreadyTerminal);
        }
        if reservation.starts_at() <= now + Duration::hours(CANCELLATION_LEAD_HOURS) {
            return Err(StoreError::WindowClosed);
        }

        reservation.status = ReservationStatus::Cancelled;
        Ok(())
    }

    fn delete(&self, token: &str, id: &str) -> Result<(), StoreError> {
        let mut all = self.reservations.lock().unwrap();
        let list = all
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let before = list.len();
        list.retain(|r| r.id != id);
        if list.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

pub struct MemoryReservationStore {
    backend: Arc<MemoryBackend>,
    session: Session,
}

impl MemoryReservationStore {
    pub fn new(backend: Arc<MemoryBackend>, session: Session) -> Self {
        Self { backend, session }
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn list_mine(&self) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.backend.list(&self.session.token))
    }

    async fn cancel(&self, id: &str) -> Result<(), StoreError> {
        self.backend.cancel(&self.session.token, id)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.backend.delete(&self.session.token, id)
    }
}

pub struct MemoryConnector {
    backend: Arc<MemoryBackend>,
}

impl MemoryConnector {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self { backend }
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self, session: Session) -> Arc<dyn ReservationStore> {
        Arc::new(MemoryReservationStore::new(self.backend.clone(), session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-06-16 08:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn reservation(id: &str, at: &str, status: ReservationStatus) -> Reservation {
        let at = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap();
        Reservation {
            id: id.to_string(),
            reservation_date: at.date(),
            reservation_time: at.time(),
            status,
            meeting_type: None,
            message: None,
            created_at: None,
        }
    }

    fn store(backend: &Arc<MemoryBackend>, token: &str) -> MemoryReservationStore {
        MemoryReservationStore::new(backend.clone(), Session::new(token))
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_session() {
        let backend = Arc::new(MemoryBackend::with_clock(fixed_now));
        backend.insert("alice", reservation("1", "2025-06-20 10:00", ReservationStatus::Pending));
        backend.insert("bob", reservation("2", "2025-06-20 11:00", ReservationStatus::Pending));

        let mine = store(&backend, "alice").list_mine().await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "1");
        assert!(store(&backend, "carol").list_mine().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let backend = Arc::new(MemoryBackend::with_clock(fixed_now));
        backend.insert("alice", reservation("ok", "2025-06-20 10:00", ReservationStatus::Confirmed));
        backend.insert("alice", reservation("soon", "2025-06-16 09:00", ReservationStatus::Pending));
        backend.insert("alice", reservation("done", "2025-06-20 10:00", ReservationStatus::Completed));
        let s = store(&backend, "alice");

        s.cancel("ok").await.unwrap();
        assert!(matches!(s.cancel("ok").await, Err(StoreError::AlreadyTerminal)));
        assert!(matches!(s.cancel("soon").await, Err(StoreError::WindowClosed)));
        assert!(matches!(s.cancel("done").await, Err(StoreError::AlreadyTerminal)));
        assert!(matches!(s.cancel("missing").await, Err(StoreError::NotFound(_))));

        let list = s.list_mine().await.unwrap();
        let ok = list.iter().find(|r| r.id == "ok").unwrap();
        assert_eq!(ok.status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_delete_any_status() {
        let backend = Arc::new(MemoryBackend::with_clock(fixed_now));
        backend.insert("alice", reservation("1", "2025-06-20 10:00", ReservationStatus::Completed));
        let s = store(&backend, "alice");

        s.delete("1").await.unwrap();
        assert!(s.list_mine().await.unwrap().is_empty());
        assert!(matches!(s.delete("1").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store(&backend, "nobody").delete("1").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_from_json_fixture() {
        let backend = MemoryBackend::from_json(
            r#"{"tok": [{"id": 1, "reservation_date": "2025-06-20", "reservation_time": "10:00:00", "status": "pending"}]}"#,
        )
        .unwrap();
        assert_eq!(backend.list("tok").len(), 1);
        assert!(MemoryBackend::from_json("not json").is_err());
    }

    #[test]
    fn test_set_status() {
        let backend = MemoryBackend::with_clock(fixed_now);
        backend.insert("alice", reservation("1", "2025-06-20 10:00", ReservationStatus::Confirmed));
        assert!(backend.set_status("alice", "1", ReservationStatus::Completed));
        assert!(!backend.set_status("alice", "2", ReservationStatus::Completed));
        assert_eq!(backend.list("alice")[0].status, ReservationStatus::Completed);
    }
}

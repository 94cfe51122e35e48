pub mod http;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Reservation, Session};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reservation is already cancelled or completed")]
    AlreadyTerminal,

    #[error("reservation starts too soon to be cancelled")]
    WindowClosed,

    #[error("reservation not found: {0}")]
    NotFound(String),

    #[error("session is not authorized")]
    Unauthorized,

    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Access to the reservations owned by one session.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn list_mine(&self) -> Result<Vec<Reservation>, StoreError>;
    async fn cancel(&self, id: &str) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Binds a [`ReservationStore`] to a session.
pub trait StoreConnector: Send + Sync {
    fn connect(&self, session: Session) -> Arc<dyn ReservationStore>;
}

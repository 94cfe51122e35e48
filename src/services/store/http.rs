use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{ReservationStore, StoreConnector, StoreError};
use crate::models::{Reservation, Session};

/// Talks to the reservation API on behalf of a single session.
pub struct HttpReservationStore {
    base_url: Url,
    session: Session,
    client: reqwest::Client,
}

impl HttpReservationStore {
    pub fn new(base_url: Url, session: Session, client: reqwest::Client) -> Self {
        Self {
            base_url,
            session,
            client,
        }
    }

    /// Appends `segments` to the base path, each percent-encoded as a single
    /// path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid reservation API url: {raw}"))?;
    anyhow::ensure!(
        !url.cannot_be_a_base(),
        "reservation API url must be hierarchical: {raw}"
    );
    Ok(url)
}

// Dot segments are dropped when a path is built, so they can never name a
// reservation.
fn check_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(StoreError::NotFound(id.to_string()));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

async fn check_response(
    resp: reqwest::Response,
    id: Option<&str>,
) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(StoreError::Unauthorized),
        StatusCode::NOT_FOUND => {
            return Err(StoreError::NotFound(id.unwrap_or_default().to_string()))
        }
        _ => {}
    }

    let text = resp.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    match body.code.as_deref() {
        Some("already_terminal") => Err(StoreError::AlreadyTerminal),
        Some("window_closed") => Err(StoreError::WindowClosed),
        _ => Err(StoreError::Rejected {
            status: status.as_u16(),
            message: body.error.or(body.message).unwrap_or(text),
        }),
    }
}

#[async_trait]
impl ReservationStore for HttpReservationStore {
    async fn list_mine(&self) -> Result<Vec<Reservation>, StoreError> {
        let resp = self
            .client
            .get(self.url(&["reservations", "my"]))
            .bearer_auth(&self.session.token)
            .send()
            .await?;

        let reservations = check_response(resp, None)
            .await?
            .json::<Vec<Reservation>>()
            .await?;

        tracing::debug!(count = reservations.len(), "fetched reservations");
        Ok(reservations)
    }

    async fn cancel(&self, id: &str) -> Result<(), StoreError> {
        check_id(id)?;
        let resp = self
            .client
            .put(self.url(&["reservations", id, "cancel"]))
            .bearer_auth(&self.session.token)
            .send()
            .await?;

        check_response(resp, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        check_id(id)?;
        let resp = self
            .client
            .delete(self.url(&["reservations", id]))
            .bearer_auth(&self.session.token)
            .send()
            .await?;

        check_response(resp, Some(id)).await?;
        Ok(())
    }
}

/// Shares one connection pool between all sessions.
pub struct HttpConnector {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpConnector {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reservation API client")?;

        Ok(Self { base_url, client })
    }
}

impl StoreConnector for HttpConnector {
    fn connect(&self, session: Session) -> Arc<dyn ReservationStore> {
        Arc::new(HttpReservationStore::new(
            self.base_url.clone(),
            session,
            self.client.clone(),
        ))
    }
}

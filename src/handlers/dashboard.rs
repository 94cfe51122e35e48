use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Session;
use crate::services::dashboard::{DashboardView, ReservationDashboard};
use crate::services::store::StoreError;
use crate::state::AppState;

fn session_from(headers: &HeaderMap) -> Result<Session, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(Session::from_authorization)
        .ok_or(AppError::Unauthorized)
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

// Sessions the backend rejects are not kept around.
fn settle<T>(
    state: &AppState,
    session: &Session,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if matches!(result, Err(AppError::Unauthorized)) {
        state.forget(session);
    }
    result
}

// A failed reload still serves the previous list, unless there is none or
// the session itself was rejected.
async fn reload(dashboard: &ReservationDashboard) -> Result<(), AppError> {
    match dashboard.refresh().await {
        Ok(()) => Ok(()),
        Err(StoreError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) if !dashboard.is_loaded() => Err(e.into()),
        Err(_) => Ok(()),
    }
}

// GET /api/dashboard/reservations
pub async fn get_reservations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardView>, AppError> {
    let session = session_from(&headers)?;
    let dashboard = state.dashboard_for(&session);
    settle(&state, &session, reload(&dashboard).await)?;
    Ok(Json(dashboard.view(now())))
}

// GET /api/dashboard/stats
#[derive(Serialize)]
pub struct StatsResponse {
    active_reservations: usize,
    stale: bool,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let session = session_from(&headers)?;
    let dashboard = state.dashboard_for(&session);
    settle(&state, &session, reload(&dashboard).await)?;
    let view = dashboard.view(now());
    Ok(Json(StatsResponse {
        active_reservations: view.active_count,
        stale: view.stale,
    }))
}

#[derive(Serialize)]
pub struct ActionResponse {
    ok: bool,
    message: &'static str,
    dashboard: DashboardView,
}

// POST /api/dashboard/reservations/:id/cancel
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let session = session_from(&headers)?;
    let dashboard = state.dashboard_for(&session);
    let now = now();

    let result = dashboard.request_cancel(&id, now).await;
    settle(&state, &session, result.map_err(AppError::from))?;

    Ok(Json(ActionResponse {
        ok: true,
        message: "Reservation cancelled",
        dashboard: dashboard.view(now),
    }))
}

// DELETE /api/dashboard/reservations/:id?confirm=true
#[derive(Deserialize)]
pub struct DeleteQuery {
    pub confirm: Option<bool>,
}

pub async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ActionResponse>, AppError> {
    let session = session_from(&headers)?;
    let dashboard = state.dashboard_for(&session);

    let result = dashboard
        .request_delete(&id, query.confirm.unwrap_or(false))
        .await;
    settle(&state, &session, result.map_err(AppError::from))?;

    Ok(Json(ActionResponse {
        ok: true,
        message: "Reservation deleted",
        dashboard: dashboard.view(now()),
    }))
}

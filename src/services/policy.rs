use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::models::{Reservation, ReservationStatus};

/// Minimum gap between now and the appointment for a client cancellation.
pub const CANCELLATION_LEAD_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Warning,
    Success,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Clock,
    CheckCircle,
    XCircle,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: Tone,
    pub icon: Icon,
}

const PENDING_BADGE: StatusBadge = StatusBadge {
    label: "Pending",
    tone: Tone::Warning,
    icon: Icon::Clock,
};

/// Maps a status to its badge. Statuses this build does not recognise get
/// the pending badge.
pub fn status_badge(status: &ReservationStatus) -> StatusBadge {
    match status {
        ReservationStatus::Pending | ReservationStatus::Unknown(_) => PENDING_BADGE,
        ReservationStatus::Confirmed => StatusBadge {
            label: "Confirmed",
            tone: Tone::Success,
            icon: Icon::CheckCircle,
        },
        ReservationStatus::Cancelled => StatusBadge {
            label: "Cancelled",
            tone: Tone::Danger,
            icon: Icon::XCircle,
        },
        ReservationStatus::Completed => StatusBadge {
            label: "Completed",
            tone: Tone::Neutral,
            icon: Icon::CheckCircle,
        },
    }
}

/// Orders reservations most-future first. The sort is stable, so records
/// sharing an instant keep their relative order.
pub fn sort_for_display(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| b.starts_at().cmp(&a.starts_at()));
}

/// Whether the client may offer cancellation. The backend re-checks on
/// every cancel request; this only gates the action in the UI.
pub fn can_cancel(reservation: &Reservation, now: NaiveDateTime) -> bool {
    if reservation.status.is_terminal() {
        return false;
    }
    reservation.starts_at() > now + Duration::hours(CANCELLATION_LEAD_HOURS)
}

pub fn is_active(reservation: &Reservation) -> bool {
    !reservation.status.is_terminal()
}

pub fn active_count(reservations: &[Reservation]) -> usize {
    reservations.iter().filter(|r| is_active(r)).count()
}

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::{MeetingType, Reservation};
use crate::services::policy::{self, StatusBadge};

/// One reservation as the dashboard renders it, with the actions it may offer.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub id: String,
    pub status: String,
    pub badge: StatusBadge,
    pub can_cancel: bool,
    pub can_delete: bool,
    pub busy: bool,
    pub reservation_date: NaiveDate,
    pub date_label: String,
    pub day: u32,
    pub month_short: String,
    pub time_label: String,
    pub meeting_type: Option<&'static str>,
    pub meeting_label: Option<&'static str>,
    pub message: Option<String>,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%A %-d %B %Y").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn meeting_label(meeting_type: MeetingType) -> &'static str {
    match meeting_type {
        MeetingType::Visio => "Video call",
        MeetingType::InPerson => "In person",
    }
}

pub fn reservation_view(reservation: &Reservation, now: NaiveDateTime, busy: bool) -> ReservationView {
    let date = reservation.reservation_date;
    ReservationView {
        id: reservation.id.clone(),
        status: reservation.status.as_str().to_string(),
        badge: policy::status_badge(&reservation.status),
        can_cancel: policy::can_cancel(reservation, now),
        can_delete: true,
        busy,
        reservation_date: date,
        date_label: format_date(date),
        day: chrono::Datelike::day(&date),
        month_short: date.format("%b").to_string(),
        time_label: format_time(reservation.reservation_time),
        meeting_type: reservation.meeting_type.map(|m| m.as_str()),
        meeting_label: reservation.meeting_type.map(meeting_label),
        message: reservation.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReservationStatus;

    fn sample() -> Reservation {
        Reservation {
            id: "7".to_string(),
            reservation_date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            reservation_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            status: ReservationStatus::Confirmed,
            meeting_type: Some(MeetingType::InPerson),
            message: Some("Site vitrine".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_format_date_and_time() {
        let r = sample();
        assert_eq!(format_date(r.reservation_date), "Monday 16 June 2025");
        assert_eq!(format_time(r.reservation_time), "14:30");
    }

    #[test]
    fn test_view_for_upcoming_reservation() {
        let now = NaiveDateTime::parse_from_str("2025-06-10 09:00", "%Y-%m-%d %H:%M").unwrap();
        let view = reservation_view(&sample(), now, false);
        assert_eq!(view.status, "confirmed");
        assert_eq!(view.badge.label, "Confirmed");
        assert!(view.can_cancel);
        assert!(view.can_delete);
        assert!(!view.busy);
        assert_eq!(view.day, 16);
        assert_eq!(view.month_short, "Jun");
        assert_eq!(view.time_label, "14:30");
        assert_eq!(view.meeting_type, Some("in_person"));
        assert_eq!(view.meeting_label, Some("In person"));
    }

    #[test]
    fn test_view_for_unknown_status_keeps_raw_value() {
        let mut r = sample();
        r.status = ReservationStatus::parse("rescheduled");
        r.meeting_type = None;
        let now = NaiveDateTime::parse_from_str("2025-06-16 14:00", "%Y-%m-%d %H:%M").unwrap();
        let view = reservation_view(&r, now, true);
        assert_eq!(view.status, "rescheduled");
        assert_eq!(view.badge.label, "Pending");
        assert!(!view.can_cancel);
        assert!(view.busy);
        assert_eq!(view.meeting_label, None);
    }
}

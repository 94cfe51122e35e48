use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub reservation_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub reservation_time: NaiveTime,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: ReservationStatus,
    #[serde(default, deserialize_with = "lenient_meeting_type")]
    pub meeting_type: Option<MeetingType>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

impl Reservation {
    /// The wall-clock instant the appointment starts at.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.reservation_date.and_time(self.reservation_time)
    }
}

/// Lifecycle state as reported by the backend. Values this build does not
/// know about are kept verbatim in `Unknown` and behave like `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Unknown(String),
}

impl ReservationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Unknown(raw) => raw,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => ReservationStatus::Pending,
            "confirmed" => ReservationStatus::Confirmed,
            "cancelled" => ReservationStatus::Cancelled,
            "completed" => ReservationStatus::Completed,
            other => ReservationStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::Completed
        )
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Pending
    }
}

impl From<String> for ReservationStatus {
    fn from(s: String) -> Self {
        ReservationStatus::parse(&s)
    }
}

impl From<ReservationStatus> for String {
    fn from(status: ReservationStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    Visio,
    InPerson,
}

impl MeetingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Visio => "visio",
            MeetingType::InPerson => "in_person",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visio" => Some(MeetingType::Visio),
            "in_person" => Some(MeetingType::InPerson),
            _ => None,
        }
    }
}

// The backend hands ids out either as integers or strings.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// A record with a missing or malformed status still loads; anything that is
// not a string is kept as an unknown status.
fn lenient_status<'de, D>(deserializer: D) -> Result<ReservationStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => ReservationStatus::parse(&s),
        Value::Null => ReservationStatus::Pending,
        other => ReservationStatus::Unknown(other.to_string()),
    })
}

fn lenient_meeting_type<'de, D>(deserializer: D) -> Result<Option<MeetingType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => MeetingType::parse(&s),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| de::Error::custom(format!("invalid reservation_time: {raw}")))
    }
}

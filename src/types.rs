//! Notification records and the inbound envelope shape.
//!
//! Everything the push channel delivers arrives wrapped in an [`Envelope`]:
//!
//! ```text
//! { "type": "notification" | "heartbeat" | "error",
//!   "data"?: { "id", "type", "priority", "category", "title", "message",
//!              "createdAt"?, "actionUrl"?, "metadata"? },
//!   "timestamp"?: number }
//! ```
//!
//! Only `notification` envelopes carrying `data` produce a
//! [`NotificationRecord`]. The payload is kept as raw JSON inside the
//! envelope so a malformed body can be discarded without failing the
//! envelope parse.

// Rust guideline compliant 2026-02

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Origin channel of a notification. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Browser / desktop push.
    Push,
    /// Email delivery.
    Email,
    /// SMS delivery.
    Sms,
}

impl NotificationKind {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a notification.
///
/// Variants are declared in ascending order so the derived `Ord` sorts
/// `Low < Medium < High < Urgent`. There is no numeric meaning beyond that.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational.
    Low,
    /// Notable update.
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Urgent,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject area of a notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Platform / account messages.
    System,
    /// Single-instrument price news.
    Stock,
    /// Portfolio performance updates.
    Portfolio,
    /// User-configured alerts.
    Alert,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Self; 4] = [Self::System, Self::Stock, Self::Portfolio, Self::Alert];

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Stock => "stock",
            Self::Portfolio => "portfolio",
            Self::Alert => "alert",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification held by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Sender-assigned identifier, unique within a feed.
    pub id: String,
    /// Origin channel (`type` on the wire).
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Severity.
    pub priority: Priority,
    /// Subject area.
    pub category: Category,
    /// Display title.
    pub title: String,
    /// Display body.
    pub message: String,
    /// Creation time; receipt time when the sender omitted it.
    pub created_at: DateTime<Utc>,
    /// Whether the user has seen it. Only ever moves `false -> true`.
    pub read: bool,
    /// Optional link opened when the user acts on the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// Opaque sender metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl NotificationRecord {
    /// Short relative age label for list rendering.
    ///
    /// Buckets: under a minute is `just now`, then whole minutes, hours and
    /// days. Timestamps in the future count as `just now`.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let minutes = (now - self.created_at).num_minutes();
        if minutes < 1 {
            return "just now".to_string();
        }
        if minutes < 60 {
            return format!("{minutes}m ago");
        }
        let hours = minutes / 60;
        if hours < 24 {
            return format!("{hours}h ago");
        }
        format!("{}d ago", hours / 24)
    }
}

/// Envelope type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    /// Carries a notification payload in `data`.
    Notification,
    /// Keep-alive from the server.
    Heartbeat,
    /// Server-side error report.
    Error,
    /// Any type this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Outer message shape delivered by the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    /// Payload, only meaningful for `notification`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Sender timestamp in epoch milliseconds. Non-numeric values read as absent.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<f64>,
}

/// `timestamp` never decides whether an envelope is usable.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

impl Envelope {
    /// Parse an envelope from a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Build a `notification` envelope around a payload.
    pub fn notification(data: serde_json::Value) -> Self {
        Self {
            kind: EnvelopeKind::Notification,
            data: Some(data),
            timestamp: None,
        }
    }
}

/// Body of a `notification` envelope as sent on the wire.
///
/// Any `read` field the sender includes is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Sender-assigned identifier.
    pub id: String,
    /// Origin channel.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Severity.
    pub priority: Priority,
    /// Subject area.
    pub category: Category,
    /// Display title.
    pub title: String,
    /// Display body.
    pub message: String,
    /// RFC 3339 string or epoch milliseconds.
    #[serde(default)]
    pub created_at: Option<serde_json::Value>,
    /// Optional link.
    #[serde(default)]
    pub action_url: Option<String>,
    /// Opaque metadata.
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl NotificationPayload {
    /// Decode a payload from envelope `data`.
    pub fn from_value(data: serde_json::Value) -> Result<Self, EnvelopeError> {
        serde_json::from_value(data).map_err(|e| EnvelopeError::InvalidPayload(e.to_string()))
    }

    /// Turn the payload into an unread record, stamping `received_at` when
    /// the sender gave no usable creation time.
    pub fn into_record(self, received_at: DateTime<Utc>) -> NotificationRecord {
        let created_at = self
            .created_at
            .as_ref()
            .and_then(parse_created_at)
            .unwrap_or(received_at);

        NotificationRecord {
            id: self.id,
            kind: self.kind,
            priority: self.priority,
            category: self.category,
            title: self.title,
            message: self.message,
            created_at,
            read: false,
            action_url: self.action_url,
            metadata: self.metadata,
        }
    }
}

/// Interpret a wire `createdAt`. Empty strings and zero count as absent.
fn parse_created_at(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => parse_date_string(s),
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if millis == 0 {
                None
            } else {
                DateTime::from_timestamp_millis(millis)
            }
        }
        _ => None,
    }
}

/// RFC 3339, then offset-less date-time as UTC, then a bare date at UTC
/// midnight.
fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Why an inbound frame produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Frame was not a JSON envelope.
    Malformed(String),
    /// `data` did not match the notification payload shape.
    InvalidPayload(String),
}

impl std::fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "Malformed envelope: {msg}"),
            Self::InvalidPayload(msg) => write!(f, "Invalid notification payload: {msg}"),
        }
    }
}

impl std::error::Error for EnvelopeError {}

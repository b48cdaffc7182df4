//! Per-feed notification settings and partial updates.
//!
//! A [`Settings`] value is created with defaults when the feed is built and
//! lives as long as the feed. Callers change it with a [`SettingsPatch`]:
//! top-level keys replace, while `category_enabled`, `priority_enabled` and
//! `quiet_hours` merge one level deep so a patch touching `stock` leaves the
//! other categories alone.
//!
//! Quiet hours are stored and validated (`HH:MM`, 24-hour) but nothing in
//! the feed consults them.

// Rust guideline compliant 2026-02

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::types::{Category, Priority};

/// Default quiet-hours window start.
pub const DEFAULT_QUIET_START: &str = "22:00";

/// Default quiet-hours window end.
pub const DEFAULT_QUIET_END: &str = "08:00";

/// Quiet-hours window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Whether the window is active.
    pub enabled: bool,
    /// Window start, `HH:MM`.
    pub start: String,
    /// Window end, `HH:MM`. May be earlier than `start` (window spans midnight).
    pub end: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: DEFAULT_QUIET_START.to_string(),
            end: DEFAULT_QUIET_END.to_string(),
        }
    }
}

/// User notification preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Show a desktop notification for each new record (subject to permission).
    pub push_enabled: bool,
    /// Email delivery toggle.
    pub email_enabled: bool,
    /// SMS delivery toggle.
    pub sms_enabled: bool,
    /// Contact address for email delivery. Not validated.
    pub email_address: String,
    /// Contact number for SMS delivery. Not validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Per-category toggles.
    pub category_enabled: BTreeMap<Category, bool>,
    /// Per-priority toggles.
    pub priority_enabled: BTreeMap<Priority, bool>,
    /// Quiet-hours window.
    pub quiet_hours: QuietHours,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            push_enabled: true,
            email_enabled: false,
            sms_enabled: false,
            email_address: String::new(),
            phone_number: None,
            category_enabled: Category::ALL.iter().map(|c| (*c, true)).collect(),
            priority_enabled: Priority::ALL.iter().map(|p| (*p, true)).collect(),
            quiet_hours: QuietHours::default(),
        }
    }
}

impl Settings {
    /// Whether a category is toggled on. Missing entries count as on.
    pub fn is_category_enabled(&self, category: Category) -> bool {
        self.category_enabled.get(&category).copied().unwrap_or(true)
    }

    /// Whether a priority is toggled on. Missing entries count as on.
    pub fn is_priority_enabled(&self, priority: Priority) -> bool {
        self.priority_enabled.get(&priority).copied().unwrap_or(true)
    }

    /// Merge a partial update into these settings.
    ///
    /// Every supplied key is applied except quiet-hours times that fail
    /// validation; those are left unchanged and reported in the returned
    /// list so the caller can log them.
    pub fn merge(&mut self, patch: SettingsPatch) -> Vec<SettingsError> {
        let mut rejected = Vec::new();

        if let Some(v) = patch.push_enabled {
            self.push_enabled = v;
        }
        if let Some(v) = patch.email_enabled {
            self.email_enabled = v;
        }
        if let Some(v) = patch.sms_enabled {
            self.sms_enabled = v;
        }
        if let Some(v) = patch.email_address {
            self.email_address = v;
        }
        if let Some(v) = patch.phone_number {
            // An empty number clears the field.
            self.phone_number = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(toggles) = patch.category_enabled {
            self.category_enabled.extend(toggles);
        }
        if let Some(toggles) = patch.priority_enabled {
            self.priority_enabled.extend(toggles);
        }
        if let Some(quiet) = patch.quiet_hours {
            if let Some(enabled) = quiet.enabled {
                self.quiet_hours.enabled = enabled;
            }
            if let Some(start) = quiet.start {
                match validate_clock_time("quietHours.start", &start) {
                    Ok(()) => self.quiet_hours.start = start,
                    Err(e) => rejected.push(e),
                }
            }
            if let Some(end) = quiet.end {
                match validate_clock_time("quietHours.end", &end) {
                    Ok(()) => self.quiet_hours.end = end,
                    Err(e) => rejected.push(e),
                }
            }
        }

        rejected
    }
}

/// Partial quiet-hours update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHoursPatch {
    /// New enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// New start time, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// New end time, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Partial settings update. Unset keys are left untouched.
///
/// Deserializes from the same camelCase shape as [`Settings`] with every key
/// optional, and offers chained setters for building patches in code:
///
/// ```
/// use notification_feed::settings::SettingsPatch;
/// use notification_feed::types::Category;
///
/// let patch = SettingsPatch::new()
///     .push_enabled(false)
///     .category(Category::Stock, false);
/// assert_eq!(patch.push_enabled, Some(false));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New push toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,
    /// New email toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
    /// New SMS toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_enabled: Option<bool>,
    /// New email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// New phone number; empty clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Category toggles to overwrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_enabled: Option<BTreeMap<Category, bool>>,
    /// Priority toggles to overwrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_enabled: Option<BTreeMap<Priority, bool>>,
    /// Quiet-hours fields to overwrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_hours: Option<QuietHoursPatch>,
}

impl SettingsPatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the push toggle.
    #[must_use]
    pub fn push_enabled(mut self, enabled: bool) -> Self {
        self.push_enabled = Some(enabled);
        self
    }

    /// Set the email toggle.
    #[must_use]
    pub fn email_enabled(mut self, enabled: bool) -> Self {
        self.email_enabled = Some(enabled);
        self
    }

    /// Set the SMS toggle.
    #[must_use]
    pub fn sms_enabled(mut self, enabled: bool) -> Self {
        self.sms_enabled = Some(enabled);
        self
    }

    /// Set the email address.
    #[must_use]
    pub fn email_address(mut self, address: impl Into<String>) -> Self {
        self.email_address = Some(address.into());
        self
    }

    /// Set the phone number.
    #[must_use]
    pub fn phone_number(mut self, number: impl Into<String>) -> Self {
        self.phone_number = Some(number.into());
        self
    }

    /// Toggle one category.
    #[must_use]
    pub fn category(mut self, category: Category, enabled: bool) -> Self {
        self.category_enabled
            .get_or_insert_with(BTreeMap::new)
            .insert(category, enabled);
        self
    }

    /// Toggle one priority.
    #[must_use]
    pub fn priority(mut self, priority: Priority, enabled: bool) -> Self {
        self.priority_enabled
            .get_or_insert_with(BTreeMap::new)
            .insert(priority, enabled);
        self
    }

    /// Set the quiet-hours enabled flag.
    #[must_use]
    pub fn quiet_hours_enabled(mut self, enabled: bool) -> Self {
        self.quiet_hours.get_or_insert_with(QuietHoursPatch::default).enabled = Some(enabled);
        self
    }

    /// Set the quiet-hours window.
    #[must_use]
    pub fn quiet_hours_window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        let quiet = self.quiet_hours.get_or_insert_with(QuietHoursPatch::default);
        quiet.start = Some(start.into());
        quiet.end = Some(end.into());
        self
    }

    /// Check the patch without applying it.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(quiet) = &self.quiet_hours {
            if let Some(start) = &quiet.start {
                validate_clock_time("quietHours.start", start)?;
            }
            if let Some(end) = &quiet.end {
                validate_clock_time("quietHours.end", end)?;
            }
        }
        Ok(())
    }
}

/// A rejected settings value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Not a 24-hour `HH:MM` time.
    InvalidClockTime {
        /// Which field carried the value.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidClockTime { field, value } => {
                write!(f, "{field}: expected HH:MM, got '{value}'")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// Strict `HH:MM` check: two-digit hour 00-23, two-digit minute 00-59.
fn validate_clock_time(field: &'static str, value: &str) -> Result<(), SettingsError> {
    let well_formed = value.len() == 5
        && value.as_bytes()[2] == b':'
        && NaiveTime::parse_from_str(value, "%H:%M").is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(SettingsError::InvalidClockTime {
            field,
            value: value.to_string(),
        })
    }
}

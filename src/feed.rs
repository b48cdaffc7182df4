//! The notification feed: one session's inbox.
//!
//! [`NotificationFeed`] owns the notification list, the connection state and
//! the user's [`Settings`]. It is a plain synchronous state machine: every
//! operation takes `&mut self`, nothing blocks, nothing returns an error to
//! the caller. The session layer drives it from a single event context, so
//! there are no locks.
//!
//! # Invariants
//!
//! - `id` is unique within the list; a duplicate arrival is dropped, not merged.
//! - The list is in arrival order, newest first. `created_at` never reorders it.
//! - `read` only moves `false -> true`.
//! - [`unread_count`](NotificationFeed::unread_count) is computed from the
//!   list on every call.
//! - After [`dispose`](NotificationFeed::dispose) nothing mutates the feed.

// Rust guideline compliant 2026-02

use std::sync::Arc;

use chrono::Utc;

use crate::channel::{ChannelEvent, ConnectionState};
use crate::constants::DEFAULT_ICON;
use crate::desktop::{DesktopNotifier, Permission, Unsupported};
use crate::filter::FeedFilter;
use crate::settings::{Settings, SettingsPatch};
use crate::types::{Envelope, EnvelopeKind, NotificationPayload, NotificationRecord};

/// Session-scoped notification inbox.
#[derive(Debug)]
pub struct NotificationFeed {
    notifications: Vec<NotificationRecord>,
    settings: Settings,
    state: ConnectionState,
    notifier: Arc<dyn DesktopNotifier>,
    icon: String,
    disposed: bool,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(Arc::new(Unsupported))
    }
}

impl NotificationFeed {
    /// Empty, unconnected feed with default settings.
    pub fn new(notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self::with_settings(notifier, Settings::default())
    }

    /// Empty, unconnected feed with the given starting settings.
    pub fn with_settings(notifier: Arc<dyn DesktopNotifier>, settings: Settings) -> Self {
        Self {
            notifications: Vec::new(),
            settings,
            state: ConnectionState::Unconnected,
            notifier,
            icon: DEFAULT_ICON.to_string(),
            disposed: false,
        }
    }

    /// Icon reference passed to the desktop notifier.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Handle one raw text frame from the push channel.
    ///
    /// Unparseable frames are logged and dropped.
    pub fn receive(&mut self, raw: &str) {
        if self.disposed {
            log::debug!("Feed disposed; dropping inbound frame");
            return;
        }
        match Envelope::parse(raw) {
            Ok(envelope) => self.receive_envelope(envelope),
            Err(e) => log::warn!("Discarding push message: {e}"),
        }
    }

    /// Handle one decoded envelope.
    ///
    /// Only `notification` envelopes with `data` have any effect.
    pub fn receive_envelope(&mut self, envelope: Envelope) {
        if self.disposed {
            log::debug!("Feed disposed; dropping envelope");
            return;
        }

        let data = match (envelope.kind, envelope.data) {
            (EnvelopeKind::Notification, Some(data)) => data,
            (EnvelopeKind::Notification, None) => {
                log::debug!("Notification envelope without data ignored");
                return;
            }
            (kind, _) => {
                log::debug!("Ignoring {kind:?} envelope");
                return;
            }
        };

        let payload = match NotificationPayload::from_value(data) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Discarding push message: {e}");
                return;
            }
        };

        let record = payload.into_record(Utc::now());
        if self.contains(&record.id) {
            log::debug!("Duplicate notification {} dropped", record.id);
            return;
        }

        log::info!(
            "Notification {} [{} / {}] {}",
            record.id,
            record.category,
            record.priority,
            record.title
        );
        self.notifications.insert(0, record);
        self.emit_desktop();
    }

    /// Show the newest record on the desktop if settings and permission allow.
    fn emit_desktop(&self) {
        if !self.settings.push_enabled {
            return;
        }
        if self.notifier.current_permission() != Permission::Granted {
            return;
        }
        let Some(record) = self.notifications.first() else {
            return;
        };
        if let Err(e) = self.notifier.show(&record.title, &record.message, &self.icon) {
            log::warn!("Desktop notification for {} failed: {e:#}", record.id);
        }
    }

    /// Apply a channel lifecycle event.
    ///
    /// `Message` frames go through [`receive`](Self::receive); everything else
    /// moves the connection state machine. Events that do not fit the current
    /// state are logged and ignored.
    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        if self.disposed {
            log::debug!("Feed disposed; dropping channel event");
            return;
        }
        if let ChannelEvent::Message(raw) = &event {
            self.receive(raw);
            return;
        }
        match self.state.transition(&event) {
            Some(next) => {
                log::debug!("Connection {} -> {}", self.state, next);
                self.state = next;
            }
            None => log::debug!("Ignoring {event:?} while {}", self.state),
        }
    }

    // ------------------------------------------------------------------
    // User operations
    // ------------------------------------------------------------------

    /// Mark one record read. Unknown ids are ignored.
    pub fn mark_as_read(&mut self, id: &str) {
        if self.disposed {
            return;
        }
        if let Some(record) = self.notifications.iter_mut().find(|n| n.id == id) {
            record.read = true;
        }
    }

    /// Mark every record read.
    pub fn mark_all_as_read(&mut self) {
        if self.disposed {
            return;
        }
        for record in &mut self.notifications {
            record.read = true;
        }
    }

    /// Remove one record. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) {
        if self.disposed {
            return;
        }
        self.notifications.retain(|n| n.id != id);
    }

    /// Remove every record.
    pub fn clear_all(&mut self) {
        if self.disposed {
            return;
        }
        self.notifications.clear();
    }

    /// Merge a partial settings update. Takes effect for the next arrival.
    ///
    /// Invalid quiet-hours times are logged and skipped; the rest applies.
    pub fn update_settings(&mut self, patch: SettingsPatch) {
        if self.disposed {
            return;
        }
        for rejected in self.settings.merge(patch) {
            log::warn!("Settings update rejected: {rejected}");
        }
    }

    /// Apply the result of a desktop permission request.
    ///
    /// A granted request turns push on. Resolutions that arrive after
    /// disposal are dropped.
    pub fn apply_permission_outcome(&mut self, outcome: Permission) {
        if self.disposed {
            log::debug!("Feed disposed; ignoring permission outcome {outcome}");
            return;
        }
        if outcome.is_granted() {
            self.update_settings(SettingsPatch::new().push_enabled(true));
        }
    }

    /// Stop processing. Idempotent.
    pub fn dispose(&mut self) {
        if !self.disposed {
            log::info!("Notification feed disposed");
            self.disposed = true;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Records, newest first.
    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }

    /// Record by id.
    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Whether a record with `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.notifications.iter().any(|n| n.id == id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Number of unread records.
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Records matching `filter`, newest first.
    pub fn filtered(&self, filter: &FeedFilter) -> Vec<&NotificationRecord> {
        filter.apply(&self.notifications)
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current connection state.
    pub fn connection_state(&self) -> &ConnectionState {
        &self.state
    }

    /// Whether the push channel is open.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The injected desktop capability.
    pub fn notifier(&self) -> Arc<dyn DesktopNotifier> {
        Arc::clone(&self.notifier)
    }
}

//! Desktop notification capability.
//!
//! The feed never talks to a windowing system directly. Whoever builds the
//! feed injects a [`DesktopNotifier`] that answers two permission queries
//! and displays a notification. This keeps the feed testable without a real
//! host environment and lets headless deployments swap in a logger.
//!
//! # Permission flow
//!
//! ```text
//! Default ──request_permission()──> Granted | Denied
//! Unsupported (never changes)
//! ```
//!
//! The request is one-shot: [`request_push_permission`] only asks while the
//! permission is still `Default` and never retries.

// Rust guideline compliant 2026-02

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

/// Host permission to show desktop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// The user allowed notifications.
    Granted,
    /// The user refused notifications.
    Denied,
    /// The user has not been asked yet.
    Default,
    /// The environment cannot show notifications at all.
    Unsupported,
}

impl Permission {
    /// Returns `true` for [`Permission::Granted`].
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
            Self::Default => write!(f, "default"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Injected desktop-notification capability.
#[async_trait]
pub trait DesktopNotifier: Send + Sync + std::fmt::Debug {
    /// Current permission, without prompting.
    fn current_permission(&self) -> Permission;

    /// Prompt for permission once and report the outcome.
    async fn request_permission(&self) -> Permission;

    /// Display a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refused or failed to display it. The feed
    /// logs the error and carries on.
    fn show(&self, title: &str, body: &str, icon: &str) -> Result<()>;
}

/// Ask for permission if the user has not decided yet.
///
/// Returns the current permission unchanged when it is anything other than
/// `Default`.
pub async fn request_push_permission(notifier: &dyn DesktopNotifier) -> Permission {
    match notifier.current_permission() {
        Permission::Default => {
            let outcome = notifier.request_permission().await;
            log::info!("Desktop notification permission request resolved: {outcome}");
            outcome
        }
        other => other,
    }
}

/// Notifier for environments without desktop notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl DesktopNotifier for Unsupported {
    fn current_permission(&self) -> Permission {
        Permission::Unsupported
    }

    async fn request_permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn show(&self, _title: &str, _body: &str, _icon: &str) -> Result<()> {
        anyhow::bail!("desktop notifications are not supported in this environment")
    }
}

/// A notification handed to [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotification {
    /// Title line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Icon reference.
    pub icon: String,
}

/// Headless notifier that logs and keeps displayed notifications in memory.
///
/// The permission starts at whatever the caller chose; a request moves a
/// `Default` permission to the configured answer. Used by the CLI and by
/// presentation layers that render their own toasts.
///
/// `show` refuses (returns an error, records nothing) until the permission
/// is `Granted`; it is not a plain logger.
#[derive(Debug)]
pub struct MemoryNotifier {
    permission: Mutex<Permission>,
    answer: Permission,
    shown: Mutex<Vec<DesktopNotification>>,
}

impl MemoryNotifier {
    /// Notifier with a fixed starting permission. Requests are answered with
    /// `Granted`.
    pub fn new(permission: Permission) -> Self {
        Self::with_answer(permission, Permission::Granted)
    }

    /// Notifier whose permission request resolves to `answer`.
    pub fn with_answer(permission: Permission, answer: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            answer,
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Everything displayed so far, oldest first.
    pub fn shown(&self) -> Vec<DesktopNotification> {
        self.shown.lock().expect("shown lock poisoned").clone()
    }
}

#[async_trait]
impl DesktopNotifier for MemoryNotifier {
    fn current_permission(&self) -> Permission {
        *self.permission.lock().expect("permission lock poisoned")
    }

    async fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock().expect("permission lock poisoned");
        if *permission == Permission::Default {
            *permission = self.answer;
        }
        *permission
    }

    fn show(&self, title: &str, body: &str, icon: &str) -> Result<()> {
        if !self.current_permission().is_granted() {
            anyhow::bail!("desktop notification permission not granted");
        }
        log::info!("[Desktop] {title}: {body}");
        self.shown
            .lock()
            .expect("shown lock poisoned")
            .push(DesktopNotification {
                title: title.to_string(),
                body: body.to_string(),
                icon: icon.to_string(),
            });
        Ok(())
    }
}

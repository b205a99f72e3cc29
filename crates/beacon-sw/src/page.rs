//! Page-side glue: the deferred install prompt and the push subscription.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the push SDK.
#[derive(Error, Debug, Clone)]
pub enum PageError {
    #[error("Push SDK error: {0}")]
    Sdk(String),
}

// ==================== Install prompt ====================

/// What the user chose in the install dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

/// A deferred `beforeinstallprompt` event.
#[async_trait]
pub trait InstallPrompt: Send {
    /// Show the dialog and wait for the user's choice.
    async fn prompt(&mut self) -> InstallOutcome;
}

/// Holds at most one deferred prompt and hands it out once.
#[derive(Debug)]
pub struct InstallPromptSlot<P> {
    held: Option<P>,
    installed: bool,
}

impl<P> Default for InstallPromptSlot<P> {
    fn default() -> Self {
        Self {
            held: None,
            installed: false,
        }
    }
}

impl<P: InstallPrompt> InstallPromptSlot<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the browser's prompt for later; a newer prompt replaces an older one.
    pub fn capture(&mut self, prompt: P) {
        if self.installed {
            debug!("App already installed, ignoring install prompt");
            return;
        }
        self.held = Some(prompt);
    }

    /// The app is running standalone already.
    pub fn mark_installed(&mut self) {
        self.installed = true;
        self.held = None;
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Whether an install button should be offered.
    pub fn can_install(&self) -> bool {
        !self.installed && self.held.is_some()
    }

    /// Remove the held prompt without showing it.
    pub fn take(&mut self) -> Option<P> {
        self.held.take()
    }

    /// Show the held prompt. The slot is empty afterwards whatever the user chose.
    pub async fn prompt_install(&mut self) -> Option<InstallOutcome> {
        let mut prompt = self.held.take()?;
        let outcome = prompt.prompt().await;
        if outcome == InstallOutcome::Accepted {
            info!("User accepted the install prompt");
            self.installed = true;
        }
        Some(outcome)
    }
}

// ==================== Push subscription ====================

/// The vendor's browser SDK.
#[async_trait]
pub trait PushSdk: Send + Sync {
    async fn init(&self, app_id: &str) -> Result<(), PageError>;
    async fn user_id(&self) -> Result<Option<String>, PageError>;
    async fn show_native_prompt(&self) -> Result<(), PageError>;
    async fn set_subscription(&self, enabled: bool) -> Result<(), PageError>;
}

/// Local view of the push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Uninitialized,
    Unsubscribed,
    Subscribed {
        user_id: String,
    },
}

/// Tracks the SDK lifecycle: init, then user id on every subscription change.
pub struct SubscriptionTracker<S> {
    sdk: S,
    state: SubscriptionState,
}

impl<S: PushSdk> SubscriptionTracker<S> {
    pub fn new(sdk: S) -> Self {
        Self {
            sdk,
            state: SubscriptionState::Uninitialized,
        }
    }

    pub fn state(&self) -> &SubscriptionState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state != SubscriptionState::Uninitialized
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.state {
            SubscriptionState::Subscribed { user_id } => Some(user_id),
            _ => None,
        }
    }

    async fn refresh_user(&mut self) -> Result<(), PageError> {
        self.state = match self.sdk.user_id().await? {
            Some(user_id) if !user_id.is_empty() => SubscriptionState::Subscribed { user_id },
            _ => SubscriptionState::Unsubscribed,
        };
        Ok(())
    }

    /// Initialize the SDK and read the current user.
    pub async fn init(&mut self, app_id: &str) -> Result<&SubscriptionState, PageError> {
        self.sdk.init(app_id).await?;
        self.refresh_user().await?;
        info!(state = ?self.state, "Push SDK initialized");
        Ok(&self.state)
    }

    /// The SDK reported a subscription change.
    pub async fn on_subscription_change(&mut self, subscribed: bool) -> Result<(), PageError> {
        if !self.is_initialized() {
            return Ok(());
        }
        if subscribed {
            self.refresh_user().await
        } else {
            self.state = SubscriptionState::Unsubscribed;
            Ok(())
        }
    }

    /// Ask the browser for notification permission.
    pub async fn subscribe(&self) -> Result<(), PageError> {
        if !self.is_initialized() {
            return Ok(());
        }
        self.sdk.show_native_prompt().await
    }

    /// Opt the user out.
    pub async fn unsubscribe(&self) -> Result<(), PageError> {
        if !self.is_initialized() {
            return Ok(());
        }
        self.sdk.set_subscription(false).await
    }
}

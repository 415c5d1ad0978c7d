//! Theme watcher: follows the host theme attribute.
//!
//! The watcher resolves the theme once on construction and then re-resolves
//! whenever the host reports a change to [`THEME_ATTRIBUTE`]. Only distinct
//! keys are published; a notification that leaves the resolved key unchanged
//! is absorbed so downstream renderers never see a redundant update.

use rw_config::MermaidConfig;
use tokio::sync::watch;

use crate::THEME_ATTRIBUTE;
use crate::host::{HostDocument, MutationObserver, ObserveOptions};
use crate::resolver::{ResolvedTheme, resolve};

/// Live subscription to the host document.
struct Subscription {
    host: HostDocument,
    observer: MutationObserver,
}

/// Observes the host theme attribute and publishes resolved themes.
///
/// Without a host document (non-interactive rendering) the watcher resolves
/// once from configuration defaults and never changes.
pub struct ThemeWatcher {
    config: MermaidConfig,
    subscription: Option<Subscription>,
    published: watch::Sender<ResolvedTheme>,
}

impl ThemeWatcher {
    /// Resolve the initial theme and subscribe to `host`, if any.
    #[must_use]
    pub fn new(host: Option<&HostDocument>, config: &MermaidConfig) -> Self {
        let value = host.and_then(|h| h.attribute(THEME_ATTRIBUTE));
        let initial = resolve(value.as_deref(), config);

        let subscription = host.map(|host| Subscription {
            host: host.clone(),
            observer: host.observe(ObserveOptions::attribute(THEME_ATTRIBUTE)),
        });
        if subscription.is_none() {
            tracing::debug!(theme = %initial.key, "No host document, theme is fixed");
        }

        let (published, _) = watch::channel(initial);
        Self {
            config: config.clone(),
            subscription,
            published,
        }
    }

    /// Last published theme.
    #[must_use]
    pub fn current(&self) -> ResolvedTheme {
        self.published.borrow().clone()
    }

    /// Receiver that observes every published theme.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolvedTheme> {
        self.published.subscribe()
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Process queued notifications without waiting.
    ///
    /// Returns the new theme if it differs from the last published one.
    pub fn pump(&mut self) -> Option<ResolvedTheme> {
        let subscription = self.subscription.as_mut()?;
        let mut notified = false;
        while subscription.observer.try_next_batch().is_some() {
            notified = true;
        }
        if !notified {
            return None;
        }
        self.refresh()
    }

    /// Wait for the next distinct theme.
    ///
    /// Returns `None` if there is no host document or the subscription ends.
    pub async fn changed(&mut self) -> Option<ResolvedTheme> {
        loop {
            let subscription = self.subscription.as_mut()?;
            subscription.observer.next_batch().await?;
            // Coalesce whatever else queued up behind this batch.
            while subscription.observer.try_next_batch().is_some() {}

            if let Some(theme) = self.refresh() {
                return Some(theme);
            }
        }
    }

    /// Stop observing the host. Teardown errors are swallowed.
    pub fn unsubscribe(&mut self) {
        if let Some(mut subscription) = self.subscription.take()
            && let Err(e) = subscription.observer.disconnect()
        {
            tracing::debug!(error = %e, "Theme observer teardown failed");
        }
    }

    /// Re-read the attribute and publish if the key changed.
    fn refresh(&mut self) -> Option<ResolvedTheme> {
        let subscription = self.subscription.as_ref()?;
        let value = subscription.host.attribute(THEME_ATTRIBUTE);
        let resolved = resolve(value.as_deref(), &self.config);

        let changed = self.published.send_if_modified(|current| {
            if current.key == resolved.key {
                return false;
            }
            *current = resolved.clone();
            true
        });

        if changed {
            tracing::debug!(theme = %resolved.key, "Host theme changed");
            Some(resolved)
        } else {
            None
        }
    }
}

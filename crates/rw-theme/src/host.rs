//! In-memory host document with attribute mutation observers.
//!
//! Models the small slice of a host document the theme watcher depends on:
//! attributes on the document root, opaque child content, and observers that
//! receive batched [`MutationRecord`]s asynchronously.
//!
//! Observers are scoped: a [`MutationObserver`] disconnects itself when
//! dropped, and teardown errors are logged instead of propagated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;

/// A change to apply to the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Set (or replace) an attribute on the document root.
    SetAttribute {
        /// Attribute name.
        name: String,
        /// New value.
        value: String,
    },
    /// Remove an attribute from the document root.
    RemoveAttribute {
        /// Attribute name.
        name: String,
    },
    /// Append child content to the document body.
    AppendChild(String),
}

/// Notification describing one applied [`Mutation`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationRecord {
    /// An attribute changed.
    Attribute {
        /// Attribute name.
        name: String,
        /// Value before the change.
        old_value: Option<String>,
    },
    /// Child content was added.
    ChildList {
        /// Number of children after the change.
        child_count: usize,
    },
}

/// Which mutations an observer wants to hear about.
#[derive(Clone, Debug, Default)]
pub struct ObserveOptions {
    /// Deliver attribute changes.
    pub attributes: bool,
    /// Restrict attribute changes to these names (`None` = all attributes).
    pub attribute_filter: Option<Vec<String>>,
    /// Deliver child content changes.
    pub child_list: bool,
}

impl ObserveOptions {
    /// Observe a single attribute and nothing else.
    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            attributes: true,
            attribute_filter: Some(vec![name.into()]),
            child_list: false,
        }
    }

    fn accepts(&self, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::Attribute { name, .. } => {
                self.attributes
                    && self
                        .attribute_filter
                        .as_ref()
                        .is_none_or(|names| names.iter().any(|n| n == name))
            }
            MutationRecord::ChildList { .. } => self.child_list,
        }
    }
}

/// Errors raised while tearing down an observer.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The document was dropped before the observer.
    #[error("host document is no longer available")]
    Detached,
    /// The observer was already disconnected.
    #[error("observer {0} is not connected")]
    NotConnected(u64),
    /// The document lock was poisoned by a panicking writer.
    #[error("host document lock poisoned")]
    Poisoned,
}

type Batch = Vec<MutationRecord>;

struct Registration {
    options: ObserveOptions,
    tx: mpsc::UnboundedSender<Batch>,
}

#[derive(Default)]
struct DocumentInner {
    attributes: HashMap<String, String>,
    children: Vec<String>,
    observers: HashMap<u64, Registration>,
    next_observer_id: u64,
}

/// Shared handle to a host document.
///
/// Cloning is cheap; all clones refer to the same document.
#[derive(Clone, Default)]
pub struct HostDocument {
    inner: Arc<Mutex<DocumentInner>>,
}

impl std::fmt::Debug for HostDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostDocument").finish_non_exhaustive()
    }
}

impl HostDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set an attribute without notifying anyone.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .attributes
            .insert(name.into(), value.into());
        self
    }

    /// Current value of a root attribute.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.lock().unwrap().attributes.get(name).cloned()
    }

    /// Number of child content entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.lock().unwrap().children.len()
    }

    /// Number of connected observers.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.lock().unwrap().observers.len()
    }

    /// Set an attribute, notifying observers.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.apply([Mutation::SetAttribute {
            name: name.into(),
            value: value.into(),
        }]);
    }

    /// Remove an attribute, notifying observers.
    pub fn remove_attribute(&self, name: impl Into<String>) {
        self.apply([Mutation::RemoveAttribute { name: name.into() }]);
    }

    /// Append child content, notifying observers.
    pub fn append_child(&self, content: impl Into<String>) {
        self.apply([Mutation::AppendChild(content.into())]);
    }

    /// Apply mutations as one batch.
    ///
    /// Each observer receives at most one notification containing the records
    /// it accepts, in application order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn apply(&self, mutations: impl IntoIterator<Item = Mutation>) {
        let mut inner = self.inner.lock().unwrap();

        let records: Vec<MutationRecord> = mutations
            .into_iter()
            .map(|mutation| match mutation {
                Mutation::SetAttribute { name, value } => {
                    let old_value = inner.attributes.insert(name.clone(), value);
                    MutationRecord::Attribute { name, old_value }
                }
                Mutation::RemoveAttribute { name } => {
                    let old_value = inner.attributes.remove(&name);
                    MutationRecord::Attribute { name, old_value }
                }
                Mutation::AppendChild(content) => {
                    inner.children.push(content);
                    MutationRecord::ChildList {
                        child_count: inner.children.len(),
                    }
                }
            })
            .collect();

        if records.is_empty() {
            return;
        }

        inner.observers.retain(|id, registration| {
            let batch: Batch = records
                .iter()
                .filter(|r| registration.options.accepts(r))
                .cloned()
                .collect();
            if batch.is_empty() {
                return true;
            }
            let delivered = registration.tx.send(batch).is_ok();
            if !delivered {
                tracing::debug!(observer = id, "Dropping observer with closed receiver");
            }
            delivered
        });
    }

    /// Register an observer.
    ///
    /// Notifications are queued and delivered asynchronously; nothing is
    /// delivered for mutations applied before registration.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn observe(&self, options: ObserveOptions) -> MutationObserver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_observer_id;
        inner.next_observer_id += 1;
        inner.observers.insert(id, Registration { options, tx });

        MutationObserver {
            id,
            document: Arc::downgrade(&self.inner),
            rx,
            connected: true,
        }
    }
}

/// Scoped subscription to document mutations.
///
/// Dropping the observer disconnects it; errors during that implicit
/// disconnect are swallowed.
pub struct MutationObserver {
    id: u64,
    document: Weak<Mutex<DocumentInner>>,
    rx: mpsc::UnboundedReceiver<Batch>,
    connected: bool,
}

impl std::fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationObserver")
            .field("id", &self.id)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl MutationObserver {
    /// Wait for the next batch of records.
    ///
    /// Returns `None` once disconnected or when the document is gone.
    pub async fn next_batch(&mut self) -> Option<Vec<MutationRecord>> {
        self.rx.recv().await
    }

    /// Take the next queued batch without waiting.
    pub fn try_next_batch(&mut self) -> Option<Vec<MutationRecord>> {
        self.rx.try_recv().ok()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Stop receiving notifications.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotConnected`] on a second call,
    /// [`HostError::Detached`] if the document no longer exists, and
    /// [`HostError::Poisoned`] if its lock is poisoned.
    pub fn disconnect(&mut self) -> Result<(), HostError> {
        if !self.connected {
            return Err(HostError::NotConnected(self.id));
        }
        self.connected = false;
        self.rx.close();

        let document = self.document.upgrade().ok_or(HostError::Detached)?;
        let mut inner = document.lock().map_err(|_| HostError::Poisoned)?;
        inner
            .observers
            .remove(&self.id)
            .map(|_| ())
            .ok_or(HostError::NotConnected(self.id))
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        if !self.connected {
            return;
        }
        if let Err(e) = self.disconnect() {
            tracing::debug!(observer = self.id, error = %e, "Observer teardown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn attribute_record(name: &str, old_value: Option<&str>) -> MutationRecord {
        MutationRecord::Attribute {
            name: name.to_owned(),
            old_value: old_value.map(str::to_owned),
        }
    }

    #[test]
    fn test_set_and_read_attribute() {
        let doc = HostDocument::new();
        assert_eq!(doc.attribute("data-theme"), None);

        doc.set_attribute("data-theme", "dark");
        assert_eq!(doc.attribute("data-theme"), Some("dark".to_owned()));

        doc.remove_attribute("data-theme");
        assert_eq!(doc.attribute("data-theme"), None);
    }

    #[test]
    fn test_observer_receives_filtered_records() {
        let doc = HostDocument::new().with_attribute("data-theme", "light");
        let mut observer = doc.observe(ObserveOptions::attribute("data-theme"));

        doc.set_attribute("class", "navbar-open");
        doc.append_child("<p>content</p>");
        assert_eq!(observer.try_next_batch(), None);

        doc.set_attribute("data-theme", "dark");
        assert_eq!(
            observer.try_next_batch(),
            Some(vec![attribute_record("data-theme", Some("light"))])
        );
    }

    #[test]
    fn test_apply_delivers_single_batch() {
        let doc = HostDocument::new();
        let mut observer = doc.observe(ObserveOptions::attribute("data-theme"));

        doc.apply([
            Mutation::SetAttribute {
                name: "data-theme".to_owned(),
                value: "dark".to_owned(),
            },
            Mutation::SetAttribute {
                name: "lang".to_owned(),
                value: "en".to_owned(),
            },
            Mutation::SetAttribute {
                name: "data-theme".to_owned(),
                value: "light".to_owned(),
            },
        ]);

        assert_eq!(
            observer.try_next_batch(),
            Some(vec![
                attribute_record("data-theme", None),
                attribute_record("data-theme", Some("dark")),
            ])
        );
        assert_eq!(observer.try_next_batch(), None);
    }

    #[test]
    fn test_child_list_observer() {
        let doc = HostDocument::new();
        let mut observer = doc.observe(ObserveOptions {
            child_list: true,
            ..ObserveOptions::default()
        });

        doc.set_attribute("data-theme", "dark");
        doc.append_child("<div></div>");

        assert_eq!(
            observer.try_next_batch(),
            Some(vec![MutationRecord::ChildList { child_count: 1 }])
        );
        assert_eq!(doc.child_count(), 1);
    }

    #[test]
    fn test_drop_disconnects() {
        let doc = HostDocument::new();
        let observer = doc.observe(ObserveOptions::attribute("data-theme"));
        assert_eq!(doc.observer_count(), 1);

        drop(observer);
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_disconnect_twice_errors() {
        let doc = HostDocument::new();
        let mut observer = doc.observe(ObserveOptions::attribute("data-theme"));

        assert_eq!(observer.disconnect(), Ok(()));
        assert!(!observer.is_connected());
        assert!(matches!(
            observer.disconnect(),
            Err(HostError::NotConnected(_))
        ));
    }

    #[test]
    fn test_disconnect_after_document_dropped() {
        let doc = HostDocument::new();
        let mut observer = doc.observe(ObserveOptions::attribute("data-theme"));
        drop(doc);

        assert_eq!(observer.disconnect(), Err(HostError::Detached));
    }

    #[test]
    fn test_drop_after_document_dropped_is_silent() {
        let doc = HostDocument::new();
        let observer = doc.observe(ObserveOptions::attribute("data-theme"));
        drop(doc);
        drop(observer);
    }

    #[tokio::test]
    async fn test_next_batch_async() {
        let doc = HostDocument::new();
        let mut observer = doc.observe(ObserveOptions::attribute("data-theme"));

        let writer = doc.clone();
        tokio::spawn(async move {
            writer.set_attribute("data-theme", "dark");
        });

        let batch = observer.next_batch().await.unwrap();
        assert_eq!(batch, vec![attribute_record("data-theme", None)]);
    }

    static_assertions::assert_impl_all!(HostDocument: Send, Sync);
    static_assertions::assert_impl_all!(MutationObserver: Send);
}

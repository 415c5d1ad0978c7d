//! Hand-driven engine and view opener for testing.
//!
//! [`ManualEngine`] records every request and leaves it pending until the
//! test resolves or rejects it by id, which makes out-of-order completion
//! easy to script. [`RecordingOpener`] records opened views.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::{Notify, oneshot};

use crate::engine::{EngineError, EngineRequest, RenderEngine};
use crate::viewer::{ViewOpener, ViewResource, ViewerError};

type Reply = Result<String, EngineError>;

/// Engine whose renders complete only when the test says so.
#[derive(Debug, Default)]
pub struct ManualEngine {
    requests: Mutex<Vec<EngineRequest>>,
    pending: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
    arrived: Notify,
}

impl ManualEngine {
    /// Create an engine with no requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Wait until at least `count` requests have arrived.
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let arrived = self.arrived.notified();
            if self.request_count() >= count {
                return;
            }
            arrived.await;
        }
    }

    /// Complete the request with `id` successfully.
    ///
    /// Returns `false` if no such request is pending.
    pub fn resolve(&self, id: &str, markup: impl Into<String>) -> bool {
        self.reply(id, Ok(markup.into()))
    }

    /// Fail the request with `id`.
    ///
    /// Returns `false` if no such request is pending.
    pub fn reject(&self, id: &str, error: EngineError) -> bool {
        self.reply(id, Err(error))
    }

    fn reply(&self, id: &str, reply: Reply) -> bool {
        let sender = self.pending.lock().unwrap().remove(id);
        sender.is_some_and(|tx| tx.send(reply).is_ok())
    }
}

impl RenderEngine for ManualEngine {
    fn render(&self, request: &EngineRequest) -> impl Future<Output = Reply> + Send {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(request.id.clone(), tx);
        self.requests.lock().unwrap().push(request.clone());
        self.arrived.notify_waiters();

        async move {
            rx.await
                .unwrap_or_else(|_| Err(EngineError::Task("render abandoned".to_owned())))
        }
    }
}

/// View opener that remembers what it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<ViewResource>>,
}

impl RecordingOpener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources opened so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn opened(&self) -> Vec<ViewResource> {
        self.opened.lock().unwrap().clone()
    }
}

impl ViewOpener for RecordingOpener {
    fn open_view(&self, resource: &ViewResource) -> Result<(), ViewerError> {
        self.opened.lock().unwrap().push(resource.clone());
        Ok(())
    }
}

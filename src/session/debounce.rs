//! Per-document debouncing for editor-driven validation
//!
//! Document-change events arrive far faster than validation is worth running.
//! [`Debouncer::schedule`] keeps at most one pending task per document key: a
//! new call aborts the pending one before scheduling its own, so the latest
//! call wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Default delay between the last edit and validation
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Latest-call-wins scheduler keyed by document identity
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay unless another call for `key` arrives first.
    pub async fn schedule<F>(&self, key: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let task_key = key.clone();

        let mut guard = self.pending.lock().await;
        if let Some(previous) = guard.remove(&key) {
            previous.abort();
            tracing::trace!(document = %key, "Pending validation superseded");
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            pending.lock().await.remove(&task_key);
            task.await;
        });
        guard.insert(key, handle);
    }

    /// Abort the pending task for `key`. Returns whether one was pending.
    pub async fn cancel(&self, key: &str) -> bool {
        match self.pending.lock().await.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Abort every pending task.
    pub async fn cancel_all(&self) {
        for (_, handle) in self.pending.lock().await.drain() {
            handle.abort();
        }
    }

    /// Number of documents with a task waiting to run
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// In-flight request deduplication (single-flight)
///
/// For a given key at most one `produce` future runs at a time; every
/// concurrent caller for that key awaits a clone of the same result, success
/// or failure. The pending slot is removed before the result is propagated,
/// so a failed call frees the key for the next caller to retry.
use crate::core::error::{ProxyError, ProxyResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::broadcast;

type ResultSender<T> = broadcast::Sender<ProxyResult<T>>;
type ResultReceiver<T> = broadcast::Receiver<ProxyResult<T>>;

pub struct Deduplicator<T: Clone> {
    pending: Mutex<HashMap<String, ResultSender<T>>>,
}

impl<T: Clone> Default for Deduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Deduplicator<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Number of in-flight calls across all keys
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Run `produce` for `key`, collapsing concurrent callers onto one call
    ///
    /// Check-and-register happens under a single lock acquisition, so two
    /// near-simultaneous callers can never both invoke `produce`.
    pub async fn run<F, Fut>(&self, key: &str, produce: F) -> ProxyResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProxyResult<T>>,
    {
        let existing: Option<ResultReceiver<T>> = {
            let mut pending = self.pending.lock().unwrap();
            match pending.get(key) {
                Some(tx) => Some(tx.subscribe()),
                None => {
                    // One value is ever sent per channel
                    let (tx, _rx) = broadcast::channel(1);
                    pending.insert(key.to_string(), tx);
                    None
                }
            }
        };

        match existing {
            Some(mut rx) => match rx.recv().await {
                Ok(result) => result,
                // The leader was dropped before completing; the slot is
                // already released, so the caller may simply retry.
                Err(_) => Err(ProxyError::UpstreamUnavailable(
                    "in-flight request was cancelled".to_string(),
                )),
            },
            None => {
                let guard = PendingGuard {
                    owner: self,
                    key: key.to_string(),
                    released: false,
                };

                let result = produce().await;

                // Slot removal precedes propagation: waiters never observe a
                // completed call still registered as pending.
                if let Some(tx) = guard.release() {
                    let _ = tx.send(result.clone());
                }
                result
            }
        }
    }
}

/// Removes the pending slot even if the leader future is dropped mid-call
struct PendingGuard<'a, T: Clone> {
    owner: &'a Deduplicator<T>,
    key: String,
    released: bool,
}

impl<'a, T: Clone> PendingGuard<'a, T> {
    fn release(mut self) -> Option<ResultSender<T>> {
        self.released = true;
        self.owner.pending.lock().unwrap().remove(&self.key)
    }
}

impl<'a, T: Clone> Drop for PendingGuard<'a, T> {
    fn drop(&mut self) {
        if !self.released {
            self.owner.pending.lock().unwrap().remove(&self.key);
        }
    }
}

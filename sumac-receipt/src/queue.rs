//! Job deduplication
//!
//! Front-of-house double taps and impatient re-submits arrive as
//! identical jobs milliseconds apart. Each job is keyed by order,
//! physical device and role; a key that was acquired less than the
//! cool-down ago is dropped instead of printed twice.
//!
//! Deliberate reprints survive this because they come in after the
//! window (and carry a COPY stamp from the tracker anyway).

use crate::receipt::PrinterRole;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Identity of one physical print job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub order: String,
    pub device: String,
    pub role: PrinterRole,
}

impl JobKey {
    pub fn new(order: impl Into<String>, device: impl Into<String>, role: PrinterRole) -> Self {
        Self {
            order: order.into(),
            device: device.into(),
            role,
        }
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.order, self.device, self.role)
    }
}

/// Shared duplicate-job filter, cheap to clone
#[derive(Clone)]
pub struct JobDeduplicator {
    inner: Arc<RwLock<HashMap<JobKey, Instant>>>,
    cool_down: Duration,
}

impl JobDeduplicator {
    pub fn new(cool_down: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            cool_down,
        }
    }

    /// Claim a job key. Returns false when the same key was claimed
    /// less than the cool-down ago, in which case the job must be
    /// skipped.
    pub async fn try_acquire(&self, key: &JobKey) -> bool {
        let mut map = self.inner.write().await;

        // Claims that never saw complete() expire here
        map.retain(|_, stamp| stamp.elapsed() < self.cool_down);

        if let Some(stamp) = map.get(key) {
            if stamp.elapsed() < self.cool_down {
                warn!(%key, "duplicate job inside cool-down, dropped");
                return false;
            }
        }
        map.insert(key.clone(), Instant::now());
        debug!(%key, "job claimed");
        true
    }

    /// Mark a claimed job finished. The claim stays effective for the
    /// remainder of the cool-down and is then garbage collected, unless
    /// a fresh claim has replaced it in the meantime.
    pub async fn complete(&self, key: &JobKey) {
        let stamp = match self.inner.read().await.get(key) {
            Some(s) => *s,
            None => return,
        };

        let inner = Arc::clone(&self.inner);
        let key = key.clone();
        let cool_down = self.cool_down;
        tokio::spawn(async move {
            tokio::time::sleep(cool_down).await;
            let mut map = inner.write().await;
            if map.get(&key) == Some(&stamp) {
                map.remove(&key);
            }
        });
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

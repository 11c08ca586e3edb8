//! Copy tracking
//!
//! Counts how many times each order/role identity has produced a
//! physical ticket. The first print is the original; anything after
//! carries a numbered COPY stamp so the till copy and the hand-out
//! copy can't be confused.
//!
//! Marking is optimistic: the dispatcher records the print the moment
//! a claimed job commits to rendering. The count only goes down through
//! an explicit reset (void/refund flows), never on sink failure.

use crate::receipt::PrinterRole;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CopyKey {
    order: String,
    role: PrinterRole,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    last_print: Instant,
}

/// Shared reprint counter, cheap to clone
#[derive(Clone)]
pub struct CopyTracker {
    inner: Arc<RwLock<HashMap<CopyKey, Entry>>>,
    ttl: Duration,
}

impl CopyTracker {
    /// `ttl`: idle time after which an identity is forgotten
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn key(order: &str, role: PrinterRole) -> CopyKey {
        CopyKey {
            order: order.to_string(),
            role,
        }
    }

    /// How many tickets this identity has already produced
    pub async fn print_count(&self, order: &str, role: PrinterRole) -> u32 {
        self.inner
            .read()
            .await
            .get(&Self::key(order, role))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    pub async fn is_reprint(&self, order: &str, role: PrinterRole) -> bool {
        self.print_count(order, role).await > 0
    }

    /// Record a print and return the new count for the identity
    pub async fn mark_printed(&self, order: &str, role: PrinterRole) -> u32 {
        let mut map = self.inner.write().await;
        map.retain(|_, e| e.last_print.elapsed() < self.ttl);

        let entry = map.entry(Self::key(order, role)).or_insert(Entry {
            count: 0,
            last_print: Instant::now(),
        });
        entry.count += 1;
        entry.last_print = Instant::now();
        debug!(order, %role, count = entry.count, "ticket recorded");
        entry.count
    }

    /// Forget every role for one order (void/refund flows)
    pub async fn reset_order(&self, order: &str) {
        let mut map = self.inner.write().await;
        map.retain(|k, _| k.order != order);
        debug!(order, "copy history cleared");
    }

    pub async fn reset_all(&self) {
        self.inner.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_cycle() {
        let tracker = CopyTracker::new(Duration::from_secs(60));

        assert!(!tracker.is_reprint("1001", PrinterRole::Customer).await);
        assert_eq!(tracker.print_count("1001", PrinterRole::Customer).await, 0);

        assert_eq!(tracker.mark_printed("1001", PrinterRole::Customer).await, 1);
        assert!(tracker.is_reprint("1001", PrinterRole::Customer).await);

        assert_eq!(tracker.mark_printed("1001", PrinterRole::Customer).await, 2);
        assert_eq!(tracker.print_count("1001", PrinterRole::Customer).await, 2);
    }

    #[tokio::test]
    async fn test_roles_tracked_separately() {
        let tracker = CopyTracker::new(Duration::from_secs(60));

        tracker.mark_printed("1001", PrinterRole::Customer).await;
        assert!(tracker.is_reprint("1001", PrinterRole::Customer).await);
        assert!(!tracker.is_reprint("1001", PrinterRole::Kitchen).await);
    }

    #[tokio::test]
    async fn test_reset_order_clears_all_roles() {
        let tracker = CopyTracker::new(Duration::from_secs(60));

        tracker.mark_printed("1001", PrinterRole::Customer).await;
        tracker.mark_printed("1001", PrinterRole::Kitchen).await;
        tracker.mark_printed("2002", PrinterRole::Customer).await;

        tracker.reset_order("1001").await;

        assert_eq!(tracker.print_count("1001", PrinterRole::Customer).await, 0);
        assert_eq!(tracker.print_count("1001", PrinterRole::Kitchen).await, 0);
        assert_eq!(tracker.print_count("2002", PrinterRole::Customer).await, 1);
    }

    #[tokio::test]
    async fn test_reset_all() {
        let tracker = CopyTracker::new(Duration::from_secs(60));
        tracker.mark_printed("1001", PrinterRole::Customer).await;
        tracker.mark_printed("2002", PrinterRole::Kitchen).await;

        tracker.reset_all().await;
        assert!(tracker.is_empty().await);
    }

    #[tokio::test]
    async fn test_idle_entries_pruned() {
        let tracker = CopyTracker::new(Duration::from_millis(50));

        tracker.mark_printed("1001", PrinterRole::Customer).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Write on a different identity triggers the sweep
        tracker.mark_printed("2002", PrinterRole::Customer).await;

        assert_eq!(tracker.print_count("1001", PrinterRole::Customer).await, 0);
        assert_eq!(tracker.print_count("2002", PrinterRole::Customer).await, 1);
    }
}

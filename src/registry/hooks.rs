//! Re-index hooks — hand layer writes off to the search indexer.
//!
//! The registry does not index anything itself. After a layer write commits,
//! it fires the re-index hook with the layer id; whatever the hook does
//! (enqueue a job, call a search service) runs on its own task.
//!
//! Hooks never block the caller. Failures are the hook's to log.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Type alias for async hook callbacks.
type AsyncHook<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// A queued request to re-index one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReindexRequest {
    pub layer_id: i64,
    /// Let the indexer serve unchanged layer data from its cache.
    pub use_cache: bool,
}

/// Fire-and-forget re-index trigger.
#[async_trait::async_trait]
pub trait IndexTrigger: Send + Sync {
    /// Schedule a re-index. Returns once the request is handed off.
    async fn schedule_reindex(&self, layer_id: i64, use_cache: bool);
}

/// Hook-backed [`IndexTrigger`].
///
/// Set once during initialization, then fired from the write path.
pub struct IndexHooks {
    on_reindex: RwLock<Option<AsyncHook<ReindexRequest>>>,
}

impl Default for IndexHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexHooks {
    pub fn new() -> Self {
        Self {
            on_reindex: RwLock::new(None),
        }
    }

    /// Register the re-index hook (called once during init).
    pub async fn set_reindex_hook<F>(&self, on_reindex: F)
    where
        F: Fn(ReindexRequest) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    {
        let mut inner = self.on_reindex.write().await;
        *inner = Some(Arc::new(on_reindex));
    }

    /// Fire the re-index hook (fire-and-forget).
    pub async fn fire_reindex(&self, request: ReindexRequest) {
        let inner = self.on_reindex.read().await;
        if let Some(ref hook) = *inner {
            let hook = Arc::clone(hook);
            tokio::spawn(async move {
                hook(request).await;
            });
        } else {
            tracing::debug!("No re-index hook set, dropping layer {}", request.layer_id);
        }
    }
}

#[async_trait::async_trait]
impl IndexTrigger for IndexHooks {
    async fn schedule_reindex(&self, layer_id: i64, use_cache: bool) {
        self.fire_reindex(ReindexRequest {
            layer_id,
            use_cache,
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[tokio::test]
    async fn hooks_are_initially_empty() {
        let hooks = IndexHooks::new();
        // Should not panic with no hook registered.
        hooks.schedule_reindex(1, true).await;
    }

    #[tokio::test]
    async fn reindex_hook_fires() {
        let hooks = IndexHooks::new();
        let seen = Arc::new(AtomicI64::new(0));

        let s = Arc::clone(&seen);
        hooks
            .set_reindex_hook(move |req| {
                let s = Arc::clone(&s);
                Box::pin(async move {
                    if req.use_cache {
                        s.fetch_add(req.layer_id, Ordering::SeqCst);
                    }
                })
            })
            .await;

        hooks.schedule_reindex(7, true).await;
        hooks.schedule_reindex(100, false).await;

        // Give spawned tasks time to complete.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}

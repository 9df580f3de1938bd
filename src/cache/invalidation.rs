//! Write-path cache invalidation.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use super::error::CacheError;
use super::keys::{Namespace, make_key};
use super::plan::{Invalidation, InvalidationPlan, Mutation};
use super::store::ResponseStore;

/// Deletes cached responses after a mutation has committed.
///
/// ```ignore
/// // After a successful like toggle:
/// bus.apply(&Mutation::PostLikeToggled { post_id });
/// ```
#[derive(Clone)]
pub struct InvalidationBus {
    store: Arc<dyn ResponseStore>,
}

impl InvalidationBus {
    pub fn new(store: Arc<dyn ResponseStore>) -> Self {
        Self { store }
    }

    /// Delete `namespace:id`, or every key under `namespace` when `id` is `None`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, namespace: Namespace, id: Option<&str>) -> Result<usize, CacheError> {
        match id {
            Some(id) => {
                let key = make_key(namespace, id);
                self.store.remove(&key).map(usize::from)
            }
            None => self.store.remove_namespace(namespace.as_str()),
        }
    }

    /// Run every deletion the mutation requires.
    ///
    /// Failures are logged and counted, never returned: the store write has
    /// already succeeded and a stale entry lives at most one TTL. A failed
    /// target does not stop the remaining ones.
    pub fn apply(&self, mutation: &Mutation) -> usize {
        let plan = InvalidationPlan::for_mutation(mutation);
        if plan.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for target in &plan.targets {
            removed += self.apply_target(target, mutation);
        }

        debug!(mutation = ?mutation, plan = %plan, removed, "cache invalidated");
        removed
    }

    fn apply_target(&self, target: &Invalidation, mutation: &Mutation) -> usize {
        match self.invalidate(target.namespace, target.id.as_deref()) {
            Ok(removed) => removed,
            Err(err) => {
                counter!("chorus_cache_invalidation_failed_total").increment(1);
                warn!(
                    invalidation = %target,
                    mutation = ?mutation,
                    error = %err,
                    "cache invalidation failed; serving stale entries until TTL"
                );
                0
            }
        }
    }
}

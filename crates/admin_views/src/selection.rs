use std::{collections::BTreeSet, future::Future};

use client_core::ClientError;
use futures::future::join_all;
use tracing::{info, warn};

use crate::RefreshTarget;

/// Checked rows of a list view, by row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<K: Ord> {
    keys: BTreeSet<K>,
}

impl<K: Ord> Default for Selection<K> {
    fn default() -> Self {
        Self {
            keys: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Clone> Selection<K> {
    pub fn select(&mut self, key: K) {
        self.keys.insert(key);
    }

    pub fn deselect(&mut self, key: &K) {
        self.keys.remove(key);
    }

    /// Returns whether the key is selected afterwards.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    pub fn select_all(&mut self, keys: impl IntoIterator<Item = K>) {
        self.keys.extend(keys);
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_selected(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    /// Bulk actions are enabled only while something is checked.
    pub fn has_selection(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.keys.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutcome {
    pub attempted: usize,
    pub failed: usize,
}

/// Fires one request per key concurrently and waits for all of them.
/// Failures are logged and counted; nothing is rolled back.
pub async fn dispatch_bulk<K, F, Fut>(action_name: &str, keys: Vec<K>, action: F) -> BulkOutcome
where
    K: std::fmt::Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<(), ClientError>>,
{
    let labels = keys.iter().map(ToString::to_string).collect::<Vec<_>>();
    let results = join_all(keys.into_iter().map(action)).await;

    let mut failed = 0;
    for (label, result) in labels.iter().zip(results) {
        if let Err(err) = result {
            failed += 1;
            warn!(action = action_name, key = %label, "bulk request failed: {err}");
        }
    }

    info!(action = action_name, attempted = labels.len(), failed, "bulk action finished");
    BulkOutcome {
        attempted: labels.len(),
        failed,
    }
}

/// Runs a bulk action and then refreshes the owning list exactly once,
/// whatever the individual outcomes were. An empty key set does nothing.
pub async fn dispatch_bulk_and_refresh<T, K, F, Fut>(
    target: &mut T,
    action_name: &str,
    keys: Vec<K>,
    action: F,
) -> Option<BulkOutcome>
where
    T: RefreshTarget + ?Sized,
    K: std::fmt::Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<(), ClientError>>,
{
    if keys.is_empty() {
        return None;
    }
    let outcome = dispatch_bulk(action_name, keys, action).await;
    target.refresh().await;
    Some(outcome)
}

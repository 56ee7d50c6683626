use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use metrics::counter;
use tracing::{debug, warn};

use crate::rpc::ApiError;

pub(crate) const METRIC_LOADER_FETCH: &str = "hadith_loader_fetch_total";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Loads the children of one parent node.
#[async_trait]
pub trait ChildFetcher<K, V>: Send + Sync {
    async fn fetch_children(&self, key: &K) -> Result<Vec<V>, ApiError>;
}

/// Load state of one parent key.
#[derive(Debug)]
pub enum NodeState<V> {
    Unknown,
    Fetching,
    Resolved(Arc<Vec<V>>),
    ResolvedEmpty,
}

impl<V> Clone for NodeState<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Unknown => Self::Unknown,
            Self::Fetching => Self::Fetching,
            Self::Resolved(children) => Self::Resolved(Arc::clone(children)),
            Self::ResolvedEmpty => Self::ResolvedEmpty,
        }
    }
}

impl<V> NodeState<V> {
    fn from_children(children: Vec<V>) -> Self {
        if children.is_empty() {
            Self::ResolvedEmpty
        } else {
            Self::Resolved(Arc::new(children))
        }
    }

    fn children(&self) -> Option<Arc<Vec<V>>> {
        match self {
            Self::Resolved(children) => Some(Arc::clone(children)),
            Self::ResolvedEmpty => Some(Arc::new(Vec::new())),
            Self::Unknown | Self::Fetching => None,
        }
    }
}

/// Outcome of [`HierarchicalLoader::expand`].
#[derive(Debug)]
pub enum Expansion<V> {
    Ready(Arc<Vec<V>>),
    /// Another expansion of the same key is already fetching.
    Pending,
    /// The fetch failed; the key is back to unknown and may be retried.
    Failed(ApiError),
}

impl<V> Expansion<V> {
    pub fn ready(self) -> Option<Arc<Vec<V>>> {
        match self {
            Self::Ready(children) => Some(children),
            Self::Pending | Self::Failed(_) => None,
        }
    }
}

/// Session-scoped lazy tree of parent keys and their children.
///
/// At most one fetch per key is outstanding. Resolved children stay for the
/// whole session; collapsing a node only clears its expanded flag.
pub struct HierarchicalLoader<K, V, F>
where
    K: Eq + Hash,
{
    fetcher: F,
    states: Arc<DashMap<K, NodeState<V>>>,
    expanded: DashSet<K>,
    fetch_timeout: Duration,
}

impl<K, V, F> HierarchicalLoader<K, V, F>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    V: Send + Sync,
    F: ChildFetcher<K, V>,
{
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            states: Arc::new(DashMap::new()),
            expanded: DashSet::new(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Marks `key` expanded and makes sure its children are loaded.
    ///
    /// `declared_children` of `Some(0)` resolves the key to empty without a
    /// fetch. A key that is already fetching returns [`Expansion::Pending`].
    pub async fn expand(&self, key: &K, declared_children: Option<u32>) -> Expansion<V> {
        self.expanded.insert(key.clone());

        let guard = match self.states.entry(key.clone()) {
            Entry::Occupied(occupied)
                if matches!(
                    occupied.get(),
                    NodeState::Resolved(_) | NodeState::ResolvedEmpty
                ) =>
            {
                return occupied
                    .get()
                    .children()
                    .map_or(Expansion::Pending, Expansion::Ready);
            }
            Entry::Occupied(occupied)
                if matches!(occupied.get(), NodeState::Fetching) && declared_children != Some(0) =>
            {
                return Expansion::Pending;
            }
            entry if declared_children == Some(0) => {
                entry.insert(NodeState::ResolvedEmpty);
                return Expansion::Ready(Arc::new(Vec::new()));
            }
            entry => {
                entry.insert(NodeState::Fetching);
                FetchGuard::new(key.clone(), Arc::clone(&self.states))
            }
        };

        debug!(key = %key, "fetching children");
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_children(key)).await {
            Ok(Ok(children)) => {
                counter!(METRIC_LOADER_FETCH, "outcome" => "ok").increment(1);
                let state = NodeState::from_children(children);
                let ready = state.children().unwrap_or_default();
                guard.resolve(state);
                Expansion::Ready(ready)
            }
            Ok(Err(err)) => {
                counter!(METRIC_LOADER_FETCH, "outcome" => "error").increment(1);
                warn!(key = %key, error = %err, "child fetch failed; key can be retried");
                Expansion::Failed(err)
            }
            Err(_) => {
                counter!(METRIC_LOADER_FETCH, "outcome" => "timeout").increment(1);
                warn!(
                    key = %key,
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "child fetch timed out; key can be retried"
                );
                Expansion::Failed(ApiError::network(format!(
                    "fetching children of {key} timed out after {:?}",
                    self.fetch_timeout
                )))
            }
        }
    }

    pub fn collapse(&self, key: &K) {
        self.expanded.remove(key);
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.expanded.contains(key)
    }

    pub fn state(&self, key: &K) -> NodeState<V> {
        self.states
            .get(key)
            .map_or(NodeState::Unknown, |state| state.value().clone())
    }

    pub fn children(&self, key: &K) -> Option<Arc<Vec<V>>> {
        self.states.get(key).and_then(|state| state.children())
    }

    /// Records children that arrived some other way. A key that is already
    /// fetching keeps its marker; the fetch result replaces the seed.
    pub fn seed(&self, key: K, children: Vec<V>) {
        match self.states.entry(key) {
            Entry::Occupied(occupied) if matches!(occupied.get(), NodeState::Fetching) => {}
            Entry::Occupied(mut occupied) => {
                occupied.insert(NodeState::from_children(children));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(NodeState::from_children(children));
            }
        }
    }

    /// Every resolved key with its children.
    pub fn snapshot(&self) -> HashMap<K, Arc<Vec<V>>> {
        self.states
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .children()
                    .map(|children| (entry.key().clone(), children))
            })
            .collect()
    }

    pub fn in_flight(&self) -> usize {
        self.states
            .iter()
            .filter(|entry| matches!(entry.value(), NodeState::Fetching))
            .count()
    }
}

/// In-flight marker for one key. Dropping it without resolving, including
/// when the expanding future is dropped, returns the key to unknown.
struct FetchGuard<K, V>
where
    K: Eq + Hash,
{
    key: Option<K>,
    states: Arc<DashMap<K, NodeState<V>>>,
}

impl<K, V> FetchGuard<K, V>
where
    K: Eq + Hash,
{
    fn new(key: K, states: Arc<DashMap<K, NodeState<V>>>) -> Self {
        Self {
            key: Some(key),
            states,
        }
    }

    fn resolve(mut self, state: NodeState<V>) {
        if let Some(key) = self.key.take() {
            self.states.insert(key, state);
        }
    }
}

impl<K, V> Drop for FetchGuard<K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.states
                .remove_if(&key, |_, state| matches!(state, NodeState::Fetching));
        }
    }
}

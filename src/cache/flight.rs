use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use super::keys::CacheKey;

/// What a settled flight hands to its followers: the serialized value, or
/// `None` when the read degraded to nothing.
pub(crate) type Outcome = Option<Bytes>;

type Slot = (u64, watch::Receiver<Option<Outcome>>);

/// Per-key gate for cache misses.
///
/// The first miss for a key leads and calls the backend. Misses that arrive
/// while it runs follow and receive the leader's outcome, success or not,
/// instead of calling the backend again.
#[derive(Default)]
pub(crate) struct Flights {
    slots: Arc<DashMap<CacheKey, Slot>>,
    next_id: AtomicU64,
}

pub(crate) enum Flight {
    Leader(FlightLeader),
    Follower(FlightFollower),
}

impl Flights {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&self, key: &CacheKey) -> Flight {
        match self.slots.entry(key.clone()) {
            Entry::Occupied(occupied) => Flight::Follower(FlightFollower {
                outcome: occupied.get().1.clone(),
            }),
            Entry::Vacant(vacant) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = watch::channel(None);
                vacant.insert((id, receiver));
                Flight::Leader(FlightLeader {
                    id,
                    key: key.clone(),
                    slots: Arc::clone(&self.slots),
                    sender,
                })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.slots.len()
    }
}

pub(crate) struct FlightLeader {
    id: u64,
    key: CacheKey,
    slots: Arc<DashMap<CacheKey, Slot>>,
    sender: watch::Sender<Option<Outcome>>,
}

impl FlightLeader {
    /// Publishes the outcome to every follower and closes the flight.
    pub(crate) fn settle(self, outcome: Outcome) {
        self.sender.send_replace(Some(outcome));
    }
}

impl Drop for FlightLeader {
    fn drop(&mut self) {
        let id = self.id;
        self.slots.remove_if(&self.key, |_, slot| slot.0 == id);
    }
}

pub(crate) struct FlightFollower {
    outcome: watch::Receiver<Option<Outcome>>,
}

impl FlightFollower {
    /// Waits for the leader. `None` means the leader was dropped before it
    /// settled.
    pub(crate) async fn settled(mut self) -> Option<Outcome> {
        match self.outcome.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        }
    }
}

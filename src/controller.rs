//! Listening toggle controller
//!
//! Owns the single ACTIVE/PAUSED cell and the subscriber registry. Any number
//! of control surfaces may call `toggle`/`pause`/`resume` concurrently; the
//! transition lock serializes them, so every transition gets a distinct
//! sequence number and all subscribers see transitions in the same order.
//! State is committed before callbacks run: a subscriber handling state S
//! will find `current_state() == S` for the whole broadcast, the same value a
//! concurrently-arriving recognition-loop check would read.
//!
//! Broadcast is snapshot-then-iterate with membership re-checked before each
//! delivery, so a callback may unsubscribe anything, including itself,
//! without corrupting the set or skipping other subscribers. A panicking
//! callback is caught and logged; it never poisons controller state or
//! suppresses delivery to the rest.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

/// Whether the pipeline is consuming audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    Active,
    Paused,
}

impl ListenState {
    pub fn is_active(&self) -> bool {
        matches!(self, ListenState::Active)
    }

    fn flipped(self) -> Self {
        match self {
            ListenState::Active => ListenState::Paused,
            ListenState::Paused => ListenState::Active,
        }
    }
}

impl std::fmt::Display for ListenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenState::Active => write!(f, "active"),
            ListenState::Paused => write!(f, "paused"),
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(ListenState) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

enum Target {
    Flip,
    To(ListenState),
}

pub struct ToggleController {
    /// Serializes transitions and their broadcasts. Never held while
    /// `current_state` readers are blocked; reads go to `state` only.
    transitions: Mutex<()>,
    state: Mutex<ListenState>,
    seq: AtomicU64,
    registry: Mutex<Registry>,
}

impl ToggleController {
    pub fn new(initial: ListenState) -> Self {
        Self {
            transitions: Mutex::new(()),
            state: Mutex::new(initial),
            seq: AtomicU64::new(0),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Non-blocking read of the latest committed state.
    pub fn current_state(&self) -> ListenState {
        *self.state.lock().unwrap()
    }

    /// Number of effective transitions so far. Idempotent no-op calls do
    /// not count.
    pub fn transition_count(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Flip the state, returning the new value.
    pub fn toggle(&self) -> ListenState {
        self.apply(Target::Flip)
    }

    /// Force PAUSED. No-op (no broadcast) if already paused.
    pub fn pause(&self) -> ListenState {
        self.apply(Target::To(ListenState::Paused))
    }

    /// Force ACTIVE. No-op (no broadcast) if already active.
    pub fn resume(&self) -> ListenState {
        self.apply(Target::To(ListenState::Active))
    }

    /// Register a callback for future transitions. Does not fire for the
    /// current state; query `current_state` separately if needed.
    ///
    /// Callbacks run on the toggling thread while the transition lock is
    /// held: reading state and (un)subscribing are fine, but a callback must
    /// not call `toggle`/`pause`/`resume`.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(ListenState) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    /// Remove a subscriber. Safe to call from within its own callback.
    /// Returns false if the handle was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap();
        let before = registry.entries.len();
        registry.entries.retain(|(eid, _)| *eid != id.0);
        registry.entries.len() != before
    }

    fn apply(&self, target: Target) -> ListenState {
        let _serial = self.transitions.lock().unwrap();

        let new = {
            let mut state = self.state.lock().unwrap();
            let next = match target {
                Target::Flip => state.flipped(),
                Target::To(s) => s,
            };
            if *state == next {
                return *state;
            }
            *state = next;
            next
        };

        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(state = %new, seq, "listen state changed");
        self.broadcast(new);
        new
    }

    fn broadcast(&self, state: ListenState) {
        let snapshot: Vec<(u64, Callback)> = self.registry.lock().unwrap().entries.clone();

        for (id, callback) in snapshot {
            // Re-check membership: an earlier callback in this broadcast may
            // have unsubscribed this one.
            let still_registered = self
                .registry
                .lock()
                .unwrap()
                .entries
                .iter()
                .any(|(eid, _)| *eid == id);
            if !still_registered {
                continue;
            }

            if catch_unwind(AssertUnwindSafe(|| callback(state))).is_err() {
                warn!(subscriber = id, "state subscriber panicked; isolated");
            }
        }
    }
}

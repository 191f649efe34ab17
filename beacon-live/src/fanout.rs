use beacon_core::LocationUpdate;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default depth of each session's outgoing channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

struct SessionEntry {
    user_id: String,
    sender: mpsc::Sender<LocationUpdate>,
    groups: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionEntry>,
    /// group id -> subscribed session ids
    groups: HashMap<String, HashSet<String>>,
}

/// Maps each family group to the live sessions currently subscribed to it
/// and delivers published events to all of them.
///
/// All state sits behind one `RwLock` with short, never-awaiting critical
/// sections. Removal takes the write lock, so a `publish` holding the read
/// lock can never deliver to a session whose `disconnect` has returned.
pub struct FanoutRegistry {
    inner: RwLock<Inner>,
    channel_capacity: usize,
    stalled: AtomicU64,
}

impl FanoutRegistry {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            channel_capacity,
            stalled: AtomicU64::new(0),
        }
    }

    /// Register a live session for `user_id` and hand back the receiving
    /// end of its bounded event channel. An existing session with the same
    /// id is replaced, dropping its old receiver.
    pub fn register(&self, session_id: &str, user_id: &str) -> mpsc::Receiver<LocationUpdate> {
        let (sender, receiver) = mpsc::channel(self.channel_capacity);
        let mut inner = self.inner.write().unwrap();
        if let Some(old) = inner.sessions.insert(
            session_id.to_string(),
            SessionEntry { user_id: user_id.to_string(), sender, groups: HashSet::new() },
        ) {
            for group_id in &old.groups {
                if let Some(subscribers) = inner.groups.get_mut(group_id) {
                    subscribers.remove(session_id);
                }
            }
        }
        receiver
    }

    /// The authenticated user behind a session, if it is registered.
    pub fn session_user(&self, session_id: &str) -> Option<String> {
        let inner = self.inner.read().unwrap();
        inner.sessions.get(session_id).map(|entry| entry.user_id.clone())
    }

    /// Add the session to the group's subscriber set. Idempotent; joining
    /// twice leaves the set identical to joining once. Returns `false` for
    /// an unregistered session.
    ///
    /// No authorization happens here; the engine boundary checks membership
    /// before calling in.
    pub fn join(&self, session_id: &str, group_id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        let Some(entry) = inner.sessions.get_mut(session_id) else {
            return false;
        };
        entry.groups.insert(group_id.to_string());
        inner.groups.entry(group_id.to_string()).or_default().insert(session_id.to_string());
        true
    }

    /// Remove the session from one group's subscriber set.
    pub fn leave(&self, session_id: &str, group_id: &str) {
        let mut inner = self.inner.write().unwrap();
        if let Some(entry) = inner.sessions.get_mut(session_id) {
            entry.groups.remove(group_id);
        }
        let now_empty = match inner.groups.get_mut(group_id) {
            Some(subscribers) => {
                subscribers.remove(session_id);
                subscribers.is_empty()
            }
            None => false,
        };
        if now_empty {
            inner.groups.remove(group_id);
        }
    }

    /// Remove the session from every group's subscriber set and drop its
    /// sender. Idempotent and safe to call multiple times; once this
    /// returns, no further delivery to the session is possible.
    pub fn disconnect(&self, session_id: &str) {
        let mut inner = self.inner.write().unwrap();
        let Some(entry) = inner.sessions.remove(session_id) else {
            return;
        };
        for group_id in &entry.groups {
            let now_empty = match inner.groups.get_mut(group_id) {
                Some(subscribers) => {
                    subscribers.remove(session_id);
                    subscribers.is_empty()
                }
                None => false,
            };
            if now_empty {
                inner.groups.remove(group_id);
            }
        }
        debug!(session_id, "live session disconnected");
    }

    /// Deliver `update` to every session subscribed to `group_id` at the
    /// moment of the call. Best-effort, at-most-once per subscriber: a full
    /// channel means that subscriber's delivery is dropped and logged, and
    /// the publish itself never blocks or fails.
    pub fn publish(&self, group_id: &str, update: &LocationUpdate) {
        let inner = self.inner.read().unwrap();
        let Some(subscribers) = inner.groups.get(group_id) else {
            return;
        };
        for session_id in subscribers {
            let Some(entry) = inner.sessions.get(session_id) else {
                continue;
            };
            match entry.sender.try_send(update.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.stalled.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        session_id = %session_id,
                        group_id,
                        user_id = %update.user_id,
                        "subscriber channel full, dropping location update"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Receiver already gone; the disconnect path will reap
                    // the entry.
                }
            }
        }
    }

    /// Session ids currently subscribed to the group, sorted for stable
    /// assertions.
    pub fn subscribers(&self, group_id: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut ids: Vec<String> = inner
            .groups
            .get(group_id)
            .map(|subscribers| subscribers.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn session_count(&self) -> usize {
        self.inner.read().unwrap().sessions.len()
    }

    /// Total deliveries dropped because a subscriber's channel was full.
    pub fn stalled_deliveries(&self) -> u64 {
        self.stalled.load(Ordering::Relaxed)
    }
}

impl Default for FanoutRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

use beacon_core::PositionSnapshot;
use dashmap::DashMap;
use std::collections::HashMap;

/// Process-wide cache of each user's latest known position.
///
/// At most one entry per user; [`put`](Self::put) replaces the entry
/// wholesale, so readers always observe either the pre- or post-write
/// snapshot, never a partial mix of fields. The sharded map keeps writers
/// for different users from blocking each other. Entries live for the
/// process lifetime; durable history is the store's job.
#[derive(Default)]
pub struct LocationCache {
    entries: DashMap<String, PositionSnapshot>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace the entry for the snapshot's user.
    pub fn put(&self, snapshot: PositionSnapshot) {
        self.entries.insert(snapshot.user_id.clone(), snapshot);
    }

    pub fn get(&self, user_id: &str) -> Option<PositionSnapshot> {
        self.entries.get(user_id).map(|entry| entry.value().clone())
    }

    /// Snapshots for the given users, silently omitting users with no
    /// recorded entry.
    pub fn get_many<'a>(
        &self,
        user_ids: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<String, PositionSnapshot> {
        user_ids
            .into_iter()
            .filter_map(|user_id| self.get(user_id).map(|s| (user_id.to_string(), s)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

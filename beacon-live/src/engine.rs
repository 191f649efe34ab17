use crate::{DEFAULT_CHANNEL_CAPACITY, FanoutRegistry, LocationCache};
use beacon_core::{BeaconError, LocationUpdate, PositionReport, PositionSnapshot, Result};
use beacon_store::{HistoryStore, MembershipResolver};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// The ingestion pipeline, read-side query and live-session boundary.
///
/// Built once at service start and shared by `Arc`. Store calls suspend
/// freely; the cache and registry are only touched through their own short
/// internal locks, never across an await point.
pub struct LocationEngine {
    history: Arc<dyn HistoryStore>,
    membership: Arc<dyn MembershipResolver>,
    cache: LocationCache,
    fanout: FanoutRegistry,
}

impl LocationEngine {
    pub fn new(history: Arc<dyn HistoryStore>, membership: Arc<dyn MembershipResolver>) -> Self {
        Self::with_channel_capacity(history, membership, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_channel_capacity(
        history: Arc<dyn HistoryStore>,
        membership: Arc<dyn MembershipResolver>,
        channel_capacity: usize,
    ) -> Self {
        Self {
            history,
            membership,
            cache: LocationCache::new(),
            fanout: FanoutRegistry::new(channel_capacity),
        }
    }

    /// Validate, persist, cache and broadcast one position report.
    ///
    /// Ordering is load-bearing: validation short-circuits before any side
    /// effect, and the cache is only updated after the history row is
    /// durably written, so an unsaved position is never exposed as current.
    #[instrument(skip(self, report))]
    pub async fn ingest(&self, user_id: &str, report: PositionReport) -> Result<PositionSnapshot> {
        report.validate()?;
        let snapshot = report.into_snapshot(user_id);

        self.history.insert(&snapshot).await?;
        self.cache.put(snapshot.clone());

        let groups = self.membership.groups_of(user_id).await?;
        let update = LocationUpdate::from(&snapshot);
        for group_id in &groups {
            self.fanout.publish(group_id, &update);
        }
        debug!(user_id, group_count = groups.len(), "position ingested");
        Ok(snapshot)
    }

    /// Current positions visible to `user_id`: the union of members across
    /// every group the user belongs to, intersected with the cache. Members
    /// with no cached snapshot are simply absent.
    pub async fn current_locations_for(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, PositionSnapshot>> {
        let groups = self.membership.groups_of(user_id).await?;
        let mut visible: HashSet<String> = HashSet::new();
        for group_id in &groups {
            visible.extend(self.membership.members_of(group_id).await?);
        }
        Ok(self.cache.get_many(visible.iter().map(String::as_str)))
    }

    /// Register a live session for `user_id`; the returned receiver yields
    /// every update published to groups the session subsequently joins.
    pub fn connect(&self, session_id: &str, user_id: &str) -> mpsc::Receiver<LocationUpdate> {
        self.fanout.register(session_id, user_id)
    }

    /// Subscribe the session to a group's updates.
    ///
    /// The session's authenticated user must be a member of the group;
    /// joins for groups the user does not belong to are rejected with a
    /// `Membership` error.
    pub async fn join(&self, session_id: &str, group_id: &str) -> Result<()> {
        let user_id = self
            .fanout
            .session_user(session_id)
            .ok_or_else(|| BeaconError::Session(format!("unknown session {session_id}")))?;
        let groups = self.membership.groups_of(&user_id).await?;
        if !groups.contains(group_id) {
            return Err(BeaconError::Membership(format!(
                "user {user_id} is not a member of group {group_id}"
            )));
        }
        self.fanout.join(session_id, group_id);
        Ok(())
    }

    pub fn leave(&self, session_id: &str, group_id: &str) {
        self.fanout.leave(session_id, group_id);
    }

    /// Fully remove a session; after this returns no further deliveries to
    /// it are possible. Safe to call more than once.
    pub fn disconnect(&self, session_id: &str) {
        self.fanout.disconnect(session_id);
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub fn fanout(&self) -> &FanoutRegistry {
        &self.fanout
    }
}

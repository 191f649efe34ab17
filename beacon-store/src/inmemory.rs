use crate::{FamilyStore, GeofenceStore, HistoryStore, MembershipResolver};
use async_trait::async_trait;
use beacon_core::{BeaconError, FamilyGroup, FamilyRole, Geofence, PositionSnapshot, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    /// email -> user id
    users: HashMap<String, String>,
    families: HashMap<String, FamilyGroup>,
    /// family id -> user id -> role
    memberships: HashMap<String, HashMap<String, FamilyRole>>,
    history: Vec<PositionSnapshot>,
    /// family id -> geofences
    geofences: HashMap<String, Vec<Geofence>>,
}

/// In-memory backend implementing every store trait. Used by the test
/// suites and the dev server; state is lost on process exit.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so that invite-by-email can resolve them.
    pub fn add_user(&self, email: impl Into<String>, user_id: impl Into<String>) {
        let mut inner = self.inner.write().unwrap();
        inner.users.insert(email.into(), user_id.into());
    }

    /// Directly add a member to a group, bypassing the email lookup.
    pub fn add_member(&self, family_id: &str, user_id: &str, role: FamilyRole) {
        let mut inner = self.inner.write().unwrap();
        inner
            .memberships
            .entry(family_id.to_string())
            .or_default()
            .insert(user_id.to_string(), role);
    }

    /// History rows recorded for a user, in insertion order.
    pub fn history_for(&self, user_id: &str) -> Vec<PositionSnapshot> {
        let inner = self.inner.read().unwrap();
        inner.history.iter().filter(|s| s.user_id == user_id).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.inner.read().unwrap().history.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn insert(&self, snapshot: &PositionSnapshot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.history.push(snapshot.clone());
        Ok(())
    }
}

#[async_trait]
impl MembershipResolver for InMemoryStore {
    async fn groups_of(&self, user_id: &str) -> Result<HashSet<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .memberships
            .iter()
            .filter(|(_, members)| members.contains_key(user_id))
            .map(|(family_id, _)| family_id.clone())
            .collect())
    }

    async fn members_of(&self, group_id: &str) -> Result<HashSet<String>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .memberships
            .get(group_id)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl FamilyStore for InMemoryStore {
    async fn families_of(&self, user_id: &str) -> Result<Vec<FamilyGroup>> {
        let inner = self.inner.read().unwrap();
        let mut families: Vec<FamilyGroup> = inner
            .memberships
            .iter()
            .filter(|(_, members)| members.contains_key(user_id))
            .filter_map(|(family_id, _)| inner.families.get(family_id).cloned())
            .collect();
        families.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(families)
    }

    async fn create_family(&self, name: &str, created_by: &str) -> Result<FamilyGroup> {
        let family = FamilyGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        let mut inner = self.inner.write().unwrap();
        inner.families.insert(family.id.clone(), family.clone());
        inner
            .memberships
            .entry(family.id.clone())
            .or_default()
            .insert(created_by.to_string(), FamilyRole::Admin);
        Ok(family)
    }

    async fn invite_member(&self, family_id: &str, email: &str, role: FamilyRole) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let user_id = inner
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| BeaconError::Membership(format!("no user with email {email}")))?;
        inner
            .memberships
            .entry(family_id.to_string())
            .or_default()
            .entry(user_id)
            .or_insert(role);
        Ok(())
    }
}

#[async_trait]
impl GeofenceStore for InMemoryStore {
    async fn create_geofence(
        &self,
        family_id: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Geofence> {
        let geofence = Geofence {
            id: Uuid::new_v4().to_string(),
            family_id: family_id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            radius_meters,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.write().unwrap();
        inner.geofences.entry(family_id.to_string()).or_default().push(geofence.clone());
        Ok(geofence)
    }

    async fn geofences_of(&self, family_id: &str) -> Result<Vec<Geofence>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.geofences.get(family_id).cloned().unwrap_or_default())
    }
}

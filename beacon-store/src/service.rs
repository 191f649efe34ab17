use async_trait::async_trait;
use beacon_core::{FamilyGroup, FamilyRole, Geofence, PositionSnapshot, Result};
use std::collections::HashSet;

/// Durable append-only location history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist one immutable history row. A failure here aborts the whole
    /// ingest; the caller must not expose the snapshot as current.
    async fn insert(&self, snapshot: &PositionSnapshot) -> Result<()>;
}

/// Family membership lookups backed by the persistent store.
///
/// Results are never cached at this layer: membership changes are rare but
/// must be immediately visible to invite/create operations.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Group ids the user belongs to. Empty set for an unknown user.
    async fn groups_of(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Member user ids of the group. Empty set for an unknown group.
    async fn members_of(&self, group_id: &str) -> Result<HashSet<String>>;
}

/// Family group CRUD consumed by the request/response boundary.
#[async_trait]
pub trait FamilyStore: Send + Sync {
    async fn families_of(&self, user_id: &str) -> Result<Vec<FamilyGroup>>;

    /// Create a group; the creator joins as [`FamilyRole::Admin`].
    async fn create_family(&self, name: &str, created_by: &str) -> Result<FamilyGroup>;

    /// Add the user with the given email to the group. Inviting an existing
    /// member is a no-op; an unknown email is a `Membership` error.
    async fn invite_member(&self, family_id: &str, email: &str, role: FamilyRole) -> Result<()>;
}

/// Geofence definitions per group. Write and list only; breach evaluation
/// is not performed anywhere in this service.
#[async_trait]
pub trait GeofenceStore: Send + Sync {
    async fn create_geofence(
        &self,
        family_id: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Geofence>;

    async fn geofences_of(&self, family_id: &str) -> Result<Vec<Geofence>>;
}

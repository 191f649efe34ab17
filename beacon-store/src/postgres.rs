use crate::{FamilyStore, GeofenceStore, HistoryStore, MembershipResolver};
use async_trait::async_trait;
use beacon_core::{BeaconError, FamilyGroup, FamilyRole, Geofence, PositionSnapshot, Result};
use chrono::Utc;
use sqlx::{Row, postgres::PgPool};
use std::collections::HashSet;
use uuid::Uuid;

/// Postgres-backed store over the deployment-owned schema
/// (`users`, `families`, `family_members`, `locations`, `geofences`).
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| BeaconError::Persistence(format!("database connection failed: {}", e)))?;
        tracing::info!("connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn family_from_row(row: &sqlx::postgres::PgRow) -> FamilyGroup {
        FamilyGroup {
            id: row.get("id"),
            name: row.get("name"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
        }
    }

    fn geofence_from_row(row: &sqlx::postgres::PgRow) -> Geofence {
        Geofence {
            id: row.get("id"),
            family_id: row.get("family_id"),
            name: row.get("name"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            radius_meters: row.get("radius_meters"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl HistoryStore for PostgresStore {
    async fn insert(&self, snapshot: &PositionSnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO locations (id, user_id, latitude, longitude, accuracy, battery_level, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&snapshot.user_id)
        .bind(snapshot.latitude)
        .bind(snapshot.longitude)
        .bind(snapshot.accuracy)
        .bind(snapshot.battery_level)
        .bind(snapshot.observed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| BeaconError::Persistence(format!("history insert failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl MembershipResolver for PostgresStore {
    async fn groups_of(&self, user_id: &str) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT family_id FROM family_members WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BeaconError::Persistence(format!("membership query failed: {}", e)))?;
        Ok(rows.iter().map(|row| row.get("family_id")).collect())
    }

    async fn members_of(&self, group_id: &str) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT user_id FROM family_members WHERE family_id = $1")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BeaconError::Persistence(format!("membership query failed: {}", e)))?;
        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }
}

#[async_trait]
impl FamilyStore for PostgresStore {
    async fn families_of(&self, user_id: &str) -> Result<Vec<FamilyGroup>> {
        let rows = sqlx::query(
            "SELECT f.id, f.name, f.created_by, f.created_at
             FROM families f
             JOIN family_members fm ON f.id = fm.family_id
             WHERE fm.user_id = $1
             ORDER BY f.created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BeaconError::Persistence(format!("family query failed: {}", e)))?;
        Ok(rows.iter().map(Self::family_from_row).collect())
    }

    async fn create_family(&self, name: &str, created_by: &str) -> Result<FamilyGroup> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BeaconError::Persistence(format!("transaction failed: {}", e)))?;

        let row = sqlx::query(
            "INSERT INTO families (id, name, created_by, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, created_by, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| BeaconError::Persistence(format!("family insert failed: {}", e)))?;

        let family = Self::family_from_row(&row);

        sqlx::query(
            "INSERT INTO family_members (family_id, user_id, role, joined_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&family.id)
        .bind(created_by)
        .bind(FamilyRole::Admin.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| BeaconError::Persistence(format!("membership insert failed: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| BeaconError::Persistence(format!("commit failed: {}", e)))?;
        Ok(family)
    }

    async fn invite_member(&self, family_id: &str, email: &str, role: FamilyRole) -> Result<()> {
        let user_row = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BeaconError::Persistence(format!("user lookup failed: {}", e)))?;

        let user_id: String = match user_row {
            Some(row) => row.get("id"),
            None => {
                return Err(BeaconError::Membership(format!("no user with email {email}")));
            }
        };

        sqlx::query(
            "INSERT INTO family_members (family_id, user_id, role, joined_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(family_id)
        .bind(&user_id)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BeaconError::Persistence(format!("membership insert failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl GeofenceStore for PostgresStore {
    async fn create_geofence(
        &self,
        family_id: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<Geofence> {
        let row = sqlx::query(
            "INSERT INTO geofences (id, family_id, name, latitude, longitude, radius_meters, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, family_id, name, latitude, longitude, radius_meters, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(family_id)
        .bind(name)
        .bind(latitude)
        .bind(longitude)
        .bind(radius_meters)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BeaconError::Persistence(format!("geofence insert failed: {}", e)))?;
        Ok(Self::geofence_from_row(&row))
    }

    async fn geofences_of(&self, family_id: &str) -> Result<Vec<Geofence>> {
        let rows = sqlx::query(
            "SELECT id, family_id, name, latitude, longitude, radius_meters, created_at
             FROM geofences WHERE family_id = $1 ORDER BY created_at",
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BeaconError::Persistence(format!("geofence query failed: {}", e)))?;
        Ok(rows.iter().map(Self::geofence_from_row).collect())
    }
}

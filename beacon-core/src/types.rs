use crate::{BeaconError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position report as submitted by a client device.
///
/// `observed_at` may be omitted; the ingestion pipeline stamps the current
/// time when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionReport {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub battery_level: Option<i16>,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl PositionReport {
    /// Check coordinate ranges and optional field bounds.
    ///
    /// Must be called before any persistence or cache mutation; a failed
    /// validation guarantees zero side effects.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(BeaconError::Validation(format!(
                "latitude {} out of range [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(BeaconError::Validation(format!(
                "longitude {} out of range [-180, 180]",
                self.longitude
            )));
        }
        if let Some(accuracy) = self.accuracy {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(BeaconError::Validation(format!(
                    "accuracy {} must be non-negative",
                    accuracy
                )));
            }
        }
        if let Some(battery) = self.battery_level {
            if !(0..=100).contains(&battery) {
                return Err(BeaconError::Validation(format!(
                    "battery_level {} out of range [0, 100]",
                    battery
                )));
            }
        }
        Ok(())
    }

    /// Consume the report into an immutable snapshot for `user_id`,
    /// stamping `observed_at` when the client did not provide one.
    pub fn into_snapshot(self, user_id: impl Into<String>) -> PositionSnapshot {
        PositionSnapshot {
            user_id: user_id.into(),
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
            battery_level: self.battery_level,
            observed_at: self.observed_at.unwrap_or_else(Utc::now),
        }
    }
}

/// A single point-in-time position reading for a user.
///
/// Immutable once created; a user's current snapshot is replaced wholesale
/// by the next valid report, never merged field-by-field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub battery_level: Option<i16>,
    pub observed_at: DateTime<Utc>,
}

/// The event fanned out to every live session subscribed to a group when
/// one of its members reports a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub battery_level: Option<i16>,
    pub observed_at: DateTime<Utc>,
}

impl From<&PositionSnapshot> for LocationUpdate {
    fn from(snapshot: &PositionSnapshot) -> Self {
        Self {
            user_id: snapshot.user_id.clone(),
            latitude: snapshot.latitude,
            longitude: snapshot.longitude,
            battery_level: snapshot.battery_level,
            observed_at: snapshot.observed_at,
        }
    }
}

/// A named set of users who share location visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyGroup {
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
    Admin,
    Member,
}

impl FamilyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyRole::Admin => "admin",
            FamilyRole::Member => "member",
        }
    }

    /// Unknown role strings fall back to `Member`.
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => FamilyRole::Admin,
            _ => FamilyRole::Member,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub user_id: String,
    pub role: FamilyRole,
}

/// A circular region owned by a family group. Passive data: stored and
/// listed, never evaluated against positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub created_at: DateTime<Utc>,
}

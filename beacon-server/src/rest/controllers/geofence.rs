use crate::auth::{TokenVerifier, require_user};
use crate::config::ServerConfig;
use crate::rest::controllers::ApiError;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use beacon_core::Geofence;
use beacon_store::GeofenceStore;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct GeofenceController {
    geofences: Arc<dyn GeofenceStore>,
    verifier: Arc<dyn TokenVerifier>,
}

impl GeofenceController {
    pub fn new(config: &ServerConfig) -> Self {
        Self { geofences: config.geofences.clone(), verifier: config.verifier.clone() }
    }
}

#[derive(Deserialize)]
pub struct CreateGeofenceRequest {
    pub family_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

#[derive(Deserialize)]
pub struct ListGeofencesQuery {
    pub family_id: String,
}

/// `POST /api/geofences`: store a geofence definition for a group.
pub async fn create_geofence(
    State(controller): State<GeofenceController>,
    headers: HeaderMap,
    Json(req): Json<CreateGeofenceRequest>,
) -> Result<(StatusCode, Json<Geofence>), ApiError> {
    require_user(&headers, controller.verifier.as_ref()).await?;
    let geofence = controller
        .geofences
        .create_geofence(&req.family_id, &req.name, req.latitude, req.longitude, req.radius_meters)
        .await?;
    Ok((StatusCode::CREATED, Json(geofence)))
}

/// `GET /api/geofences?family_id=`: definitions stored for a group.
pub async fn list_geofences(
    State(controller): State<GeofenceController>,
    headers: HeaderMap,
    Query(query): Query<ListGeofencesQuery>,
) -> Result<Json<Vec<Geofence>>, ApiError> {
    require_user(&headers, controller.verifier.as_ref()).await?;
    let geofences = controller.geofences.geofences_of(&query.family_id).await?;
    Ok(Json(geofences))
}

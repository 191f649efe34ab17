use crate::auth::{TokenVerifier, require_user};
use crate::config::ServerConfig;
use crate::rest::controllers::ApiError;
use axum::{Json, extract::State, http::HeaderMap};
use beacon_core::{PositionReport, PositionSnapshot};
use beacon_live::LocationEngine;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct LocationController {
    engine: Arc<LocationEngine>,
    verifier: Arc<dyn TokenVerifier>,
}

impl LocationController {
    pub fn new(config: &ServerConfig) -> Self {
        Self { engine: config.engine.clone(), verifier: config.verifier.clone() }
    }
}

/// `POST /api/locations`: validate, persist and broadcast one
/// position report for the authenticated user.
pub async fn update_location(
    State(controller): State<LocationController>,
    headers: HeaderMap,
    Json(report): Json<PositionReport>,
) -> Result<Json<Value>, ApiError> {
    let user_id = require_user(&headers, controller.verifier.as_ref()).await?;
    controller.engine.ingest(&user_id, report).await?;
    Ok(Json(json!({ "success": true })))
}

/// `GET /api/locations/current`: latest snapshots of every family member
/// of the authenticated user that has one cached.
pub async fn current_locations(
    State(controller): State<LocationController>,
    headers: HeaderMap,
) -> Result<Json<HashMap<String, PositionSnapshot>>, ApiError> {
    let user_id = require_user(&headers, controller.verifier.as_ref()).await?;
    let locations = controller.engine.current_locations_for(&user_id).await?;
    Ok(Json(locations))
}

use crate::auth::{TokenVerifier, require_user};
use crate::config::ServerConfig;
use crate::rest::controllers::ApiError;
use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use beacon_core::{FamilyGroup, FamilyRole};
use beacon_store::FamilyStore;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
pub struct FamilyController {
    families: Arc<dyn FamilyStore>,
    verifier: Arc<dyn TokenVerifier>,
}

impl FamilyController {
    pub fn new(config: &ServerConfig) -> Self {
        Self { families: config.families.clone(), verifier: config.verifier.clone() }
    }
}

#[derive(Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct InviteMemberRequest {
    pub family_id: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<FamilyRole>,
}

/// `GET /api/family`: groups the authenticated user belongs to.
pub async fn get_families(
    State(controller): State<FamilyController>,
    headers: HeaderMap,
) -> Result<Json<Vec<FamilyGroup>>, ApiError> {
    let user_id = require_user(&headers, controller.verifier.as_ref()).await?;
    let families = controller.families.families_of(&user_id).await?;
    Ok(Json(families))
}

/// `POST /api/family`: create a group with the caller as admin.
pub async fn create_family(
    State(controller): State<FamilyController>,
    headers: HeaderMap,
    Json(req): Json<CreateFamilyRequest>,
) -> Result<(StatusCode, Json<FamilyGroup>), ApiError> {
    let user_id = require_user(&headers, controller.verifier.as_ref()).await?;
    let family = controller.families.create_family(&req.name, &user_id).await?;
    Ok((StatusCode::CREATED, Json(family)))
}

/// `POST /api/family/invite`: add the user with the given email.
pub async fn invite_member(
    State(controller): State<FamilyController>,
    headers: HeaderMap,
    Json(req): Json<InviteMemberRequest>,
) -> Result<Json<Value>, ApiError> {
    require_user(&headers, controller.verifier.as_ref()).await?;
    controller
        .families
        .invite_member(&req.family_id, &req.email, req.role.unwrap_or(FamilyRole::Member))
        .await?;
    Ok(Json(json!({ "success": true })))
}

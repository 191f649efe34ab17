pub mod family;
pub mod geofence;
pub mod location;

pub use family::FamilyController;
pub use geofence::GeofenceController;
pub use location::LocationController;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use beacon_core::BeaconError;
use serde_json::json;

/// JSON error response carrying `{"error": message}`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BeaconError> for ApiError {
    fn from(err: BeaconError) -> Self {
        let status = match &err {
            BeaconError::Validation(_) => StatusCode::BAD_REQUEST,
            BeaconError::Membership(_) => StatusCode::NOT_FOUND,
            BeaconError::Session(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

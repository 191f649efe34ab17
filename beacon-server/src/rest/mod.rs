pub mod controllers;

pub use controllers::{FamilyController, GeofenceController, LocationController};

use crate::config::ServerConfig;
use crate::ws;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build CORS layer based on security configuration
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.security.allowed_origins.is_empty() {
        // Development mode: allow all origins
        cors.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<HeaderValue> =
            config.security.allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

/// Create the server application.
pub fn create_app(config: ServerConfig) -> Router {
    let location_controller = LocationController::new(&config);
    let family_controller = FamilyController::new(&config);
    let geofence_controller = GeofenceController::new(&config);
    let live_controller = ws::LiveController::new(&config);

    let api_router = Router::new()
        .route("/health", get(health_check))
        .with_state(config.clone())
        .route("/locations", post(controllers::location::update_location))
        .route("/locations/current", get(controllers::location::current_locations))
        .with_state(location_controller)
        .route(
            "/family",
            get(controllers::family::get_families).post(controllers::family::create_family),
        )
        .route("/family/invite", post(controllers::family::invite_member))
        .with_state(family_controller)
        .route(
            "/geofences",
            post(controllers::geofence::create_geofence).get(controllers::geofence::list_geofences),
        )
        .with_state(geofence_controller);

    let live_router = Router::new().route("/ws", get(ws::ws_handler)).with_state(live_controller);

    let app = Router::new().nest("/api", api_router).merge(live_router);

    let cors_layer = build_cors_layer(&config);

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.security.request_timeout))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(cors_layer),
    )
}

async fn health_check(State(config): State<ServerConfig>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime": config.started_at.elapsed().as_secs(),
    }))
}

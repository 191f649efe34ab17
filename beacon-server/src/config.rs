use crate::auth::TokenVerifier;
use beacon_live::LocationEngine;
use beacon_store::{FamilyStore, GeofenceStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Security configuration for the Beacon server.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// Allowed origins for CORS (empty = allow all, which is NOT recommended for production)
    pub allowed_origins: Vec<String>,
    /// Maximum request body size in bytes (default: 64KB; reports are tiny)
    pub max_body_size: usize,
    /// Request timeout duration (default: 30 seconds)
    pub request_timeout: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_body_size: 64 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SecurityConfig {
    /// Production configuration with specific allowed origins.
    pub fn production(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins, ..Self::default() }
    }
}

/// Configuration for the Beacon server.
#[derive(Clone)]
pub struct ServerConfig {
    pub engine: Arc<LocationEngine>,
    pub families: Arc<dyn FamilyStore>,
    pub geofences: Arc<dyn GeofenceStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub security: SecurityConfig,
    pub started_at: Instant,
}

impl ServerConfig {
    pub fn new(
        engine: Arc<LocationEngine>,
        families: Arc<dyn FamilyStore>,
        geofences: Arc<dyn GeofenceStore>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            engine,
            families,
            geofences,
            verifier,
            security: SecurityConfig::default(),
            started_at: Instant::now(),
        }
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }
}

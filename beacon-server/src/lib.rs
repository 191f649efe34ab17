//! HTTP and WebSocket boundary for the Beacon family location service.
//!
//! REST routes cover location submission/query plus the family and
//! geofence request/response surface; `/ws` carries the live subscription
//! protocol. Authentication mechanics live behind the [`TokenVerifier`]
//! seam; this crate never hashes passwords or mints tokens.

pub mod auth;
pub mod config;
pub mod rest;
pub mod ws;

pub use auth::{StaticTokenVerifier, TokenVerifier};
pub use config::{SecurityConfig, ServerConfig};
pub use rest::create_app;

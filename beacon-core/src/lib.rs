//! Core types for the Beacon family location service.
//!
//! Everything shared between the stores, the live engine and the server
//! boundary lives here: the position/report/update types, the family and
//! geofence records, and the error taxonomy.

pub mod error;
pub mod types;

pub use error::{BeaconError, Result};
pub use types::{
    FamilyGroup, FamilyMember, FamilyRole, Geofence, LocationUpdate, PositionReport,
    PositionSnapshot,
};

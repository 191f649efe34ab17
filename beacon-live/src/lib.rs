//! The live location state and fanout engine.
//!
//! Three pieces, owned and wired together by [`LocationEngine`]:
//!
//! - [`LocationCache`]: the process-wide map from user id to their latest
//!   position snapshot.
//! - [`FanoutRegistry`]: per-group subscriber sets of live sessions, with
//!   bounded, non-blocking delivery.
//! - [`LocationEngine`]: the ingestion pipeline (validate, persist, cache,
//!   resolve, publish), the read-side query, and the live-session boundary.
//!
//! The engine is instantiated once at service start and shared by handle;
//! there is no ambient or static state.

pub mod cache;
pub mod engine;
pub mod fanout;

pub use cache::LocationCache;
pub use engine::LocationEngine;
pub use fanout::{DEFAULT_CHANNEL_CAPACITY, FanoutRegistry};

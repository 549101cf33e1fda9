//! Types shared between the dashboard backend, the bot process, and the SPA.
//!
//! Everything here is plain serde data (no tokio, no diesel) so the same
//! crate compiles for a WASM frontend build.

pub mod api;
pub mod endpoints;

pub use api::*;

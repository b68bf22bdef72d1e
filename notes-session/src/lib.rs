//! Client-side session continuity for the notes API.
//!
//! [`SessionController`] owns the in-memory access token, silently renews it
//! from the refresh cookie on boot and on 403, and tears the session down on
//! logout.

pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::SessionConfig;
pub use controller::{BootOutcome, SessionController};
pub use error::SessionError;
pub use models::{ApiRequest, BearerToken, Identity, SessionEvent, SessionPhase, SessionState};

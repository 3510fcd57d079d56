// ABOUTME: HTTP layer for bootgate: the setup gate, setup and export handlers, and the router.
// ABOUTME: Wires bootgate-core rules and bootgate-store persistence into an Axum application.

pub mod api;
pub mod app_state;
pub mod config;
pub mod connect_auth;
pub mod error;
pub mod gate;
pub mod pages;
pub mod restart;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, ServerConfig};
pub use connect_auth::{AuthVerdict, ConnectAuth, ConnectionAuthorizer, GatewayAuthorizer};
pub use error::ApiError;
pub use gate::{GateState, SetupGate, SetupGateLayer};
pub use restart::{ProcessExit, RecordingRestart, RestartHandoff};
pub use routes::create_router;

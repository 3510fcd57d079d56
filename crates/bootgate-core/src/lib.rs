// ABOUTME: Core library for bootgate: configuration and credential models plus setup rules.
// ABOUTME: Everything here is pure; persistence and HTTP live in bootgate-store and bootgate-server.

pub mod config;
pub mod credential;
pub mod secret;
pub mod setup;

pub use config::{
    AuthProfileRef, ConfigSnapshot, GatewayAuth, GatewayAuthMode, ProfileMode, is_configured,
};
pub use credential::{AUTH_STORE_VERSION, Credential, CredentialStore, OAuthCredential, ProfileId};
pub use secret::{SessionKey, secrets_match};
pub use setup::{
    CLI_TOKEN_PROVIDER, KNOWN_CHANNELS, KNOWN_PROVIDERS, SetupRequest, SetupValidationError,
    ValidatedSetup,
};

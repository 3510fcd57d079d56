// ABOUTME: First-run setup payload: wire shape, validation, and the configuration delta it produces.
// ABOUTME: Pure functions only; persisting the delta and the credential is the store crate's job.

use std::fmt;

use rand::RngCore;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{AuthProfileRef, ConfigSnapshot, GatewayAuthMode, ProfileMode};
use crate::credential::{Credential, ProfileId};

/// Provider whose credential is a CLI session token rather than an API key.
pub const CLI_TOKEN_PROVIDER: &str = "claude-cli";

/// Bytes of entropy in a server-generated gateway token.
const GATEWAY_TOKEN_BYTES: usize = 24;

/// A provider offered by the setup wizard.
#[derive(Debug, Clone, Copy)]
pub struct ProviderOption {
    pub id: &'static str,
    pub label: &'static str,
    pub credential_label: &'static str,
    pub placeholder: &'static str,
    pub hint: &'static str,
}

/// A channel the setup wizard can enable.
#[derive(Debug, Clone, Copy)]
pub struct ChannelOption {
    pub id: &'static str,
    pub label: &'static str,
}

pub const KNOWN_PROVIDERS: &[ProviderOption] = &[
    ProviderOption {
        id: "anthropic",
        label: "Anthropic (Claude API)",
        credential_label: "API Key",
        placeholder: "sk-ant-...",
        hint: "Get from console.anthropic.com",
    },
    ProviderOption {
        id: "openai",
        label: "OpenAI",
        credential_label: "API Key",
        placeholder: "sk-...",
        hint: "Get from platform.openai.com",
    },
    ProviderOption {
        id: "openrouter",
        label: "OpenRouter",
        credential_label: "API Key",
        placeholder: "sk-or-...",
        hint: "Get from openrouter.ai",
    },
    ProviderOption {
        id: CLI_TOKEN_PROVIDER,
        label: "Claude CLI Token",
        credential_label: "CLI Token",
        placeholder: "Token from claude-cli...",
        hint: "From Claude CLI authentication",
    },
];

pub const KNOWN_CHANNELS: &[ChannelOption] = &[
    ChannelOption { id: "telegram", label: "Telegram" },
    ChannelOption { id: "discord", label: "Discord" },
    ChannelOption { id: "slack", label: "Slack" },
    ChannelOption { id: "msteams", label: "MS Teams" },
];

/// Reasons a setup submission is rejected before any store is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupValidationError {
    #[error("Password is required")]
    MissingPassword,

    #[error("Provider and API key are required")]
    MissingProviderCredential,
}

/// Body of `POST /setup/complete` as it arrives on the wire.
///
/// Every field is optional at the serde level so that a missing field is a
/// validation failure with a readable message, not a parse failure.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Anything goes here; only string entries of an array are used.
    #[serde(default)]
    pub channels: Option<Value>,
}

/// A setup submission that passed validation.
#[derive(Clone)]
pub struct ValidatedSetup {
    pub admin_password: String,
    pub provider: String,
    pub credential_value: String,
    pub gateway_token: Option<String>,
    pub model: Option<String>,
    pub channels: Vec<String>,
}

impl SetupRequest {
    /// Check required fields and normalize optional ones.
    pub fn validate(self) -> Result<ValidatedSetup, SetupValidationError> {
        let admin_password = non_empty(self.password).ok_or(SetupValidationError::MissingPassword)?;

        let (provider, credential_value) = match (non_empty(self.provider), non_empty(self.api_key)) {
            (Some(provider), Some(key)) => (provider, key),
            _ => return Err(SetupValidationError::MissingProviderCredential),
        };

        let channels = match self.channels {
            Some(Value::Array(items)) => {
                let mut names: Vec<String> = Vec::new();
                for name in items.iter().filter_map(Value::as_str) {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
                names
            }
            _ => Vec::new(),
        };

        Ok(ValidatedSetup {
            admin_password,
            provider,
            credential_value,
            gateway_token: non_empty(self.token),
            model: non_empty(self.model),
            channels,
        })
    }
}

impl ValidatedSetup {
    /// Profile id under which both the config reference and the credential live.
    pub fn profile_id(&self) -> ProfileId {
        ProfileId::default_for(&self.provider)
    }

    pub fn profile_mode(&self) -> ProfileMode {
        if self.provider == CLI_TOKEN_PROVIDER {
            ProfileMode::Token
        } else {
            ProfileMode::ApiKey
        }
    }

    /// The credential-store entry matching [`Self::profile_mode`].
    pub fn credential(&self) -> Credential {
        match self.profile_mode() {
            ProfileMode::Token => Credential::Token {
                provider: self.provider.clone(),
                token: self.credential_value.clone(),
            },
            _ => Credential::ApiKey {
                provider: self.provider.clone(),
                key: self.credential_value.clone(),
            },
        }
    }

    /// Fill in a random gateway token when the caller did not supply one.
    /// Returns the token only if it was generated here.
    pub fn ensure_gateway_token(&mut self) -> Option<String> {
        if self.gateway_token.is_some() {
            return None;
        }
        let token = generate_gateway_token();
        self.gateway_token = Some(token.clone());
        Some(token)
    }

    /// Apply this submission on top of `base`, returning the new snapshot.
    pub fn apply_to(&self, base: &ConfigSnapshot) -> ConfigSnapshot {
        let mut config = base.clone();

        let auth = config.gateway_auth_mut();
        auth.password = Some(self.admin_password.clone());
        auth.mode = Some(GatewayAuthMode::Password);
        if let Some(token) = &self.gateway_token {
            auth.token = Some(token.clone());
        }

        if let Some(model) = &self.model {
            config.agent_defaults_mut().model = Some(model.clone());
        }

        for name in &self.channels {
            config.channels.entry(name.clone()).or_default().enabled = Some(true);
        }

        config.set_auth_profile(
            self.profile_id(),
            AuthProfileRef {
                provider: self.provider.clone(),
                mode: self.profile_mode(),
            },
        );

        config
    }
}

impl fmt::Debug for ValidatedSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedSetup")
            .field("provider", &self.provider)
            .field("has_gateway_token", &self.gateway_token.is_some())
            .field("model", &self.model)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Random hex bearer token for API access to the gateway.
pub fn generate_gateway_token() -> String {
    let mut bytes = [0u8; GATEWAY_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

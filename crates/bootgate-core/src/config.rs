// ABOUTME: Typed snapshot of the gateway's persisted configuration document.
// ABOUTME: Also hosts the configured-state oracle; a gateway admin password is the only "configured" signal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credential::ProfileId;

/// How clients authenticate against the gateway once it is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayAuthMode {
    Password,
    Token,
}

/// Kind of credential an auth profile refers to in the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileMode {
    #[serde(rename = "api_key")]
    ApiKey,
    #[serde(rename = "token")]
    Token,
    #[serde(rename = "oauth")]
    OAuth,
}

/// The full configuration document. Only the fields this crate reasons about
/// are typed; every level keeps unknown keys in `extra` so a read-modify-write
/// never drops settings owned by other tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<GatewaySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<AgentsSection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub channels: BTreeMap<String, ChannelEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewaySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<GatewayAuth>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GatewayAuthMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<AgentDefaults>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<ProfileId, AuthProfileRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Config-side reference to a credential-store entry with the same profile id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfileRef {
    pub provider: String,
    pub mode: ProfileMode,
}

impl ConfigSnapshot {
    /// The gateway admin password, if one is set and non-empty.
    pub fn gateway_password(&self) -> Option<&str> {
        self.gateway_auth()
            .and_then(|auth| auth.password.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// The gateway bearer token, if one is set and non-empty.
    pub fn gateway_token(&self) -> Option<&str> {
        self.gateway_auth()
            .and_then(|auth| auth.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn gateway_auth_mode(&self) -> Option<GatewayAuthMode> {
        self.gateway_auth().and_then(|auth| auth.mode)
    }

    pub fn gateway_auth(&self) -> Option<&GatewayAuth> {
        self.gateway.as_ref().and_then(|g| g.auth.as_ref())
    }

    /// Mutable access to `gateway.auth`, creating the intermediate objects.
    pub fn gateway_auth_mut(&mut self) -> &mut GatewayAuth {
        self.gateway
            .get_or_insert_with(GatewaySection::default)
            .auth
            .get_or_insert_with(GatewayAuth::default)
    }

    /// Mutable access to `agents.defaults`, creating the intermediate objects.
    pub fn agent_defaults_mut(&mut self) -> &mut AgentDefaults {
        self.agents
            .get_or_insert_with(AgentsSection::default)
            .defaults
            .get_or_insert_with(AgentDefaults::default)
    }

    pub fn default_model(&self) -> Option<&str> {
        self.agents
            .as_ref()
            .and_then(|a| a.defaults.as_ref())
            .and_then(|d| d.model.as_deref())
    }

    pub fn auth_profile(&self, id: &ProfileId) -> Option<&AuthProfileRef> {
        self.auth.as_ref().and_then(|a| a.profiles.get(id))
    }

    /// Register (or replace) an auth profile reference.
    pub fn set_auth_profile(&mut self, id: ProfileId, profile: AuthProfileRef) {
        self.auth
            .get_or_insert_with(AuthSection::default)
            .profiles
            .insert(id, profile);
    }
}

/// Has first-run setup completed?
///
/// True exactly when `gateway.auth.password` is present and non-empty. No
/// other field participates, and the answer is never cached: callers pass the
/// current snapshot on every request.
pub fn is_configured(config: &ConfigSnapshot) -> bool {
    config.gateway_password().is_some()
}

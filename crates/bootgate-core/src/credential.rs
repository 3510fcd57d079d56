// ABOUTME: Credential store model: a versioned map of profile id to provider credential.
// ABOUTME: Profile ids ("<provider>:default") link config-side auth profiles to stored secrets.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current on-disk format version of the credential store.
pub const AUTH_STORE_VERSION: u32 = 1;

/// Composite key shared by `auth.profiles` in the config and the credential store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// The default profile for a provider, e.g. `openai:default`.
    pub fn default_for(provider: &str) -> Self {
        Self(format!("{provider}:default"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored provider credential, tagged by `type` on disk.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Credential {
    #[serde(rename = "api_key")]
    ApiKey { provider: String, key: String },
    #[serde(rename = "token")]
    Token { provider: String, token: String },
    /// Written by the interactive login flows; carried through untouched.
    #[serde(rename = "oauth")]
    OAuth(OAuthCredential),
}

/// OAuth credential body. Only the provider is interpreted here.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthCredential {
    pub provider: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Credential {
    pub fn provider(&self) -> &str {
        match self {
            Credential::ApiKey { provider, .. }
            | Credential::Token { provider, .. } => provider,
            Credential::OAuth(oauth) => &oauth.provider,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Credential::ApiKey { .. } => "api_key",
            Credential::Token { .. } => "token",
            Credential::OAuth(_) => "oauth",
        };
        f.debug_struct("Credential")
            .field("type", &kind)
            .field("provider", &self.provider())
            .finish_non_exhaustive()
    }
}

/// The credential-profile store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialStore {
    pub version: u32,
    #[serde(default)]
    pub profiles: BTreeMap<ProfileId, Credential>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self {
            version: AUTH_STORE_VERSION,
            profiles: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

impl CredentialStore {
    /// Insert or replace a profile's credential and stamp the current store
    /// version. Returns the previous credential for that profile, if any.
    pub fn upsert(&mut self, id: ProfileId, credential: Credential) -> Option<Credential> {
        self.version = AUTH_STORE_VERSION;
        self.profiles.insert(id, credential)
    }

    pub fn get(&self, id: &ProfileId) -> Option<&Credential> {
        self.profiles.get(id)
    }
}

// ABOUTME: Connection-authorization capability consumed by the export endpoint.
// ABOUTME: Extracts bearer/query credentials and asks a pluggable authorizer for a verdict.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use bootgate_core::{ConfigSnapshot, GatewayAuthMode, secrets_match};

/// Credentials presented by a caller.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectAuth {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Query-string fallback for clients that cannot set headers (e.g. a download link).
#[derive(Debug, Default)]
pub struct ConnectQuery {
    pub token: Option<String>,
    pub password: Option<String>,
}

impl ConnectQuery {
    /// Pick `token` and `password` out of decoded query pairs. The first
    /// occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "token" if query.token.is_none() => query.token = Some(value),
                "password" if query.password.is_none() => query.password = Some(value),
                _ => {}
            }
        }
        query
    }
}

/// Outcome of an authorization check. `reason` explains a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthVerdict {
    pub ok: bool,
    pub reason: Option<String>,
}

impl AuthVerdict {
    pub fn allow() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn deny(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// A bearer header wins; otherwise fall back to `?token=` / `?password=`.
pub fn extract_connect_auth(headers: &HeaderMap, query: &ConnectQuery) -> ConnectAuth {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        return ConnectAuth {
            token: Some(token.to_string()),
            password: None,
        };
    }

    ConnectAuth {
        token: query.token.clone().filter(|t| !t.is_empty()),
        password: query.password.clone().filter(|p| !p.is_empty()),
    }
}

/// Decides whether presented credentials may access gateway-protected resources.
#[async_trait]
pub trait ConnectionAuthorizer: Send + Sync {
    async fn authorize(&self, auth: &ConnectAuth, config: &ConfigSnapshot) -> AuthVerdict;
}

/// Default authorizer: checks the caller against `gateway.auth` in the live config.
///
/// Token mode requires the configured token. Password mode accepts the
/// configured password, or the configured token since that is the credential
/// handed out for API access at setup.
#[derive(Debug, Default, Clone, Copy)]
pub struct GatewayAuthorizer;

#[async_trait]
impl ConnectionAuthorizer for GatewayAuthorizer {
    async fn authorize(&self, auth: &ConnectAuth, config: &ConfigSnapshot) -> AuthVerdict {
        let mode = config.gateway_auth_mode().or_else(|| {
            if config.gateway_token().is_some() {
                Some(GatewayAuthMode::Token)
            } else if config.gateway_password().is_some() {
                Some(GatewayAuthMode::Password)
            } else {
                None
            }
        });

        match mode {
            None => AuthVerdict::deny("unconfigured"),
            Some(GatewayAuthMode::Token) => check_token(auth, config),
            Some(GatewayAuthMode::Password) => check_password(auth, config),
        }
    }
}

fn check_token(auth: &ConnectAuth, config: &ConfigSnapshot) -> AuthVerdict {
    let Some(expected) = config.gateway_token() else {
        return AuthVerdict::deny("token_missing_config");
    };
    match auth.token.as_deref() {
        None => AuthVerdict::deny("token_missing"),
        Some(token) if secrets_match(token, expected) => AuthVerdict::allow(),
        Some(_) => AuthVerdict::deny("token_mismatch"),
    }
}

fn check_password(auth: &ConnectAuth, config: &ConfigSnapshot) -> AuthVerdict {
    let Some(expected) = config.gateway_password() else {
        return AuthVerdict::deny("password_missing_config");
    };

    if let (Some(token), Some(configured)) = (auth.token.as_deref(), config.gateway_token())
        && secrets_match(token, configured)
    {
        return AuthVerdict::allow();
    }

    match auth.password.as_deref() {
        Some(password) if secrets_match(password, expected) => AuthVerdict::allow(),
        Some(_) => AuthVerdict::deny("password_mismatch"),
        None if auth.token.is_some() => AuthVerdict::deny("token_mismatch"),
        None => AuthVerdict::deny("password_missing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn config(value: serde_json::Value) -> ConfigSnapshot {
        serde_json::from_value(value).unwrap()
    }

    fn token_auth(token: &str) -> ConnectAuth {
        ConnectAuth {
            token: Some(token.to_string()),
            password: None,
        }
    }

    fn password_auth(password: &str) -> ConnectAuth {
        ConnectAuth {
            token: None,
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn bearer_header_takes_precedence_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let query = ConnectQuery {
            token: Some("from-query".to_string()),
            password: Some("pw".to_string()),
        };

        let auth = extract_connect_auth(&headers, &query);

        assert_eq!(auth.token.as_deref(), Some("from-header"));
        assert!(auth.password.is_none());
    }

    #[test]
    fn query_params_are_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        let query = ConnectQuery {
            token: None,
            password: Some("pw".to_string()),
        };

        let auth = extract_connect_auth(&headers, &query);

        assert!(auth.token.is_none());
        assert_eq!(auth.password.as_deref(), Some("pw"));
    }

    #[test]
    fn repeated_query_keys_keep_the_first_value() {
        let query = ConnectQuery::from_pairs(vec![
            ("token".to_string(), "first".to_string()),
            ("utm".to_string(), "x".to_string()),
            ("token".to_string(), "second".to_string()),
            ("password".to_string(), "pw".to_string()),
            ("password".to_string(), "other".to_string()),
        ]);

        assert_eq!(query.token.as_deref(), Some("first"));
        assert_eq!(query.password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn unconfigured_gateway_denies_everything() {
        let verdict = GatewayAuthorizer
            .authorize(&token_auth("anything"), &ConfigSnapshot::default())
            .await;
        assert_eq!(verdict, AuthVerdict::deny("unconfigured"));
    }

    #[tokio::test]
    async fn token_mode_checks_token() {
        let cfg = config(json!({ "gateway": { "auth": { "mode": "token", "token": "t0k" } } }));

        assert!(GatewayAuthorizer.authorize(&token_auth("t0k"), &cfg).await.ok);
        assert_eq!(
            GatewayAuthorizer.authorize(&token_auth("nope"), &cfg).await,
            AuthVerdict::deny("token_mismatch")
        );
        assert_eq!(
            GatewayAuthorizer.authorize(&ConnectAuth::default(), &cfg).await,
            AuthVerdict::deny("token_missing")
        );
    }

    #[tokio::test]
    async fn password_mode_accepts_password_or_gateway_token() {
        let cfg = config(json!({
            "gateway": { "auth": { "mode": "password", "password": "pw", "token": "t0k" } }
        }));

        assert!(GatewayAuthorizer.authorize(&password_auth("pw"), &cfg).await.ok);
        assert!(GatewayAuthorizer.authorize(&token_auth("t0k"), &cfg).await.ok);
        assert_eq!(
            GatewayAuthorizer.authorize(&password_auth("wrong"), &cfg).await,
            AuthVerdict::deny("password_mismatch")
        );
        assert_eq!(
            GatewayAuthorizer.authorize(&token_auth("wrong"), &cfg).await,
            AuthVerdict::deny("token_mismatch")
        );
        assert_eq!(
            GatewayAuthorizer.authorize(&ConnectAuth::default(), &cfg).await,
            AuthVerdict::deny("password_missing")
        );
    }

    #[tokio::test]
    async fn mode_is_inferred_when_unset() {
        let cfg = config(json!({ "gateway": { "auth": { "token": "t0k" } } }));
        assert!(GatewayAuthorizer.authorize(&token_auth("t0k"), &cfg).await.ok);

        let cfg = config(json!({ "gateway": { "auth": { "password": "pw" } } }));
        assert!(GatewayAuthorizer.authorize(&password_auth("pw"), &cfg).await.ok);
    }
}

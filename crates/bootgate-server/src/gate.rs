// ABOUTME: Setup gate: decides per request whether first-run setup owns the path.
// ABOUTME: A tower layer that redirects, dispatches to the setup handlers, or passes through.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use bootgate_core::{ConfigSnapshot, SessionKey, is_configured};
use tower::{Layer, Service};

use crate::api::setup;
use crate::app_state::SharedState;

/// Cookie carrying the session marker for the setup wizard.
pub const SETUP_AUTH_COOKIE: &str = "bootgate_setup_auth";

pub const SETUP_PATH: &str = "/setup";
pub const SETUP_AUTH_PATH: &str = "/setup/auth";
pub const SETUP_COMPLETE_PATH: &str = "/setup/complete";

/// Served by the regular router in every state; never gated.
pub const EXPORT_PATH: &str = "/setup/export";

/// Where a request stands relative to first-run setup. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// A setup secret exists and the caller has not proven it.
    Locked,
    Unlocked,
    Configured,
}

/// Setup secret plus the per-process key that derives session markers from it.
pub struct SetupGate {
    secret: Option<String>,
    key: SessionKey,
}

impl std::fmt::Debug for SetupGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupGate")
            .field("secret_required", &self.secret_required())
            .finish()
    }
}

impl SetupGate {
    /// An empty secret counts as no secret.
    pub fn new(secret: Option<String>) -> Self {
        Self::with_key(secret, SessionKey::generate())
    }

    pub fn with_key(secret: Option<String>, key: SessionKey) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            key,
        }
    }

    pub fn secret_required(&self) -> bool {
        self.secret.is_some()
    }

    pub fn state(&self, config: &ConfigSnapshot, jar: &CookieJar) -> GateState {
        if is_configured(config) {
            return GateState::Configured;
        }

        let Some(secret) = self.secret.as_deref() else {
            return GateState::Unlocked;
        };

        match jar.get(SETUP_AUTH_COOKIE) {
            Some(cookie) if self.key.verify(secret, cookie.value()) => GateState::Unlocked,
            _ => GateState::Locked,
        }
    }

    /// Constant-time check of a supplied setup secret. False when none is configured.
    pub fn check_secret(&self, supplied: &str) -> bool {
        match self.secret.as_deref() {
            Some(secret) => bootgate_core::secrets_match(supplied, secret),
            None => false,
        }
    }

    /// `Set-Cookie` value granting access to the wizard, or `None` without a secret.
    pub fn session_cookie(&self) -> Option<String> {
        let secret = self.secret.as_deref()?;
        let marker = self.key.marker(secret);
        Some(format!(
            "{SETUP_AUTH_COOKIE}={marker}; Path={SETUP_PATH}; HttpOnly; SameSite=Strict"
        ))
    }
}

/// What the gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRoute {
    PassThrough,
    Redirect(&'static str),
    Auth,
    Page,
    Complete,
}

/// Route a path given whether setup has completed.
pub fn classify(path: &str, configured: bool) -> GateRoute {
    if path == EXPORT_PATH {
        return GateRoute::PassThrough;
    }

    let setup_owned = path == SETUP_PATH || path.starts_with("/setup/");

    if configured {
        return if setup_owned {
            GateRoute::Redirect("/")
        } else {
            GateRoute::PassThrough
        };
    }

    match path {
        SETUP_AUTH_PATH => GateRoute::Auth,
        SETUP_PATH => GateRoute::Page,
        SETUP_COMPLETE_PATH => GateRoute::Complete,
        "/" | "/index.html" => GateRoute::Redirect(SETUP_PATH),
        _ => GateRoute::PassThrough,
    }
}

pub(crate) fn found(location: &'static str) -> Response<Body> {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// A tower Layer that puts the setup gate in front of the router.
#[derive(Clone)]
pub struct SetupGateLayer {
    state: SharedState,
}

impl SetupGateLayer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for SetupGateLayer {
    type Service = SetupGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SetupGateService {
            inner,
            state: self.state.clone(),
        }
    }
}

/// The middleware service behind [`SetupGateLayer`].
#[derive(Clone)]
pub struct SetupGateService<S> {
    inner: S,
    state: SharedState,
}

impl<S> Service<Request<Body>> for SetupGateService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        if req.uri().path() == EXPORT_PATH {
            return Box::pin(async move { inner.call(req).await });
        }

        let state = self.state.clone();
        Box::pin(async move {
            let config = state.current_config().await;
            let route = classify(req.uri().path(), is_configured(&config));

            let resp = match route {
                GateRoute::PassThrough => return inner.call(req).await,
                GateRoute::Redirect(location) => found(location),
                GateRoute::Auth => setup::setup_auth(&state, req).await.into_response(),
                GateRoute::Page => {
                    let gate_state = state
                        .gate
                        .state(&config, &CookieJar::from_headers(req.headers()));
                    setup::setup_page(req.method(), gate_state).into_response()
                }
                GateRoute::Complete => {
                    let gate_state = state
                        .gate
                        .state(&config, &CookieJar::from_headers(req.headers()));
                    setup::setup_complete(&state, gate_state, req)
                        .await
                        .into_response()
                }
            };
            Ok(resp)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn gate(secret: Option<&str>) -> SetupGate {
        SetupGate::with_key(secret.map(str::to_string), SessionKey::from_bytes([9; 32]))
    }

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    fn configured() -> ConfigSnapshot {
        serde_json::from_value(json!({ "gateway": { "auth": { "password": "admin" } } })).unwrap()
    }

    fn marker_from(set_cookie: &str) -> String {
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, v)| v.to_string())
            .unwrap()
    }

    #[test]
    fn configured_wins_over_everything() {
        let g = gate(Some("s3cret"));
        assert_eq!(g.state(&configured(), &CookieJar::new()), GateState::Configured);
    }

    #[test]
    fn no_secret_means_unlocked() {
        let g = gate(None);
        assert_eq!(g.state(&ConfigSnapshot::default(), &CookieJar::new()), GateState::Unlocked);
        assert!(g.session_cookie().is_none());
        assert!(!g.check_secret(""));
    }

    #[test]
    fn empty_secret_is_treated_as_unset() {
        let g = gate(Some(""));
        assert!(!g.secret_required());
        assert_eq!(g.state(&ConfigSnapshot::default(), &CookieJar::new()), GateState::Unlocked);
    }

    #[test]
    fn secret_locks_until_cookie_matches() {
        let g = gate(Some("s3cret"));
        let unconfigured = ConfigSnapshot::default();

        assert_eq!(g.state(&unconfigured, &CookieJar::new()), GateState::Locked);
        assert_eq!(
            g.state(&unconfigured, &jar_with("bootgate_setup_auth=deadbeef")),
            GateState::Locked
        );

        let cookie = g.session_cookie().unwrap();
        let jar = jar_with(&format!("{SETUP_AUTH_COOKIE}={}", marker_from(&cookie)));
        assert_eq!(g.state(&unconfigured, &jar), GateState::Unlocked);
    }

    #[test]
    fn markers_from_another_process_key_are_rejected() {
        let issued = gate(Some("s3cret")).session_cookie().unwrap();
        let restarted = SetupGate::with_key(Some("s3cret".into()), SessionKey::from_bytes([1; 32]));

        let jar = jar_with(&format!("{SETUP_AUTH_COOKIE}={}", marker_from(&issued)));
        assert_eq!(restarted.state(&ConfigSnapshot::default(), &jar), GateState::Locked);
    }

    #[test]
    fn session_cookie_is_scoped_and_http_only() {
        let cookie = gate(Some("s3cret")).session_cookie().unwrap();

        assert!(cookie.starts_with("bootgate_setup_auth="));
        assert!(cookie.contains("; Path=/setup"));
        assert!(cookie.contains("; HttpOnly"));
        assert!(cookie.contains("; SameSite=Strict"));
        assert!(!cookie.contains("s3cret"));
    }

    #[test]
    fn classify_unconfigured() {
        assert_eq!(classify("/", false), GateRoute::Redirect("/setup"));
        assert_eq!(classify("/index.html", false), GateRoute::Redirect("/setup"));
        assert_eq!(classify("/setup", false), GateRoute::Page);
        assert_eq!(classify("/setup/auth", false), GateRoute::Auth);
        assert_eq!(classify("/setup/complete", false), GateRoute::Complete);
        assert_eq!(classify("/setup/export", false), GateRoute::PassThrough);
        assert_eq!(classify("/health", false), GateRoute::PassThrough);
        assert_eq!(classify("/setup/unknown", false), GateRoute::PassThrough);
    }

    #[test]
    fn classify_configured() {
        assert_eq!(classify("/", true), GateRoute::PassThrough);
        assert_eq!(classify("/setup", true), GateRoute::Redirect("/"));
        assert_eq!(classify("/setup/auth", true), GateRoute::Redirect("/"));
        assert_eq!(classify("/setup/complete", true), GateRoute::Redirect("/"));
        assert_eq!(classify("/setup/anything", true), GateRoute::Redirect("/"));
        assert_eq!(classify("/setup/export", true), GateRoute::PassThrough);
        assert_eq!(classify("/setupx", true), GateRoute::PassThrough);
    }
}

// ABOUTME: Askama page templates for the setup gate: secret entry and the setup wizard.
// ABOUTME: Both render straight to HTML responses via askama_derive_axum.

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;
use bootgate_core::setup::{ChannelOption, ProviderOption};
use bootgate_core::{KNOWN_CHANNELS, KNOWN_PROVIDERS};

/// Setup secret prompt shown while the gate is locked.
#[derive(Template, AskamaIntoResponse, Default)]
#[template(path = "setup_auth.html")]
pub struct SetupAuthPage {}

/// First-run wizard: admin password, gateway token, provider, model, channels.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "setup.html")]
pub struct SetupWizardPage {
    pub providers: &'static [ProviderOption],
    pub channels: &'static [ChannelOption],
}

impl Default for SetupWizardPage {
    fn default() -> Self {
        Self {
            providers: KNOWN_PROVIDERS,
            channels: KNOWN_CHANNELS,
        }
    }
}

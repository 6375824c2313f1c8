//! flattr_auth - Truecaller login coordination for the Flattr client
//!
//! This crate owns the client side of the Truecaller handshake: it issues
//! the anti-replay token (`state` on Android, `nonce` on the web) and PKCE
//! challenge for each attempt, hands them to a platform provider, verifies
//! what comes back and exposes the outcome as an [`AuthState`] for the UI.
//!
//! The authorization credential in `AuthState::Success` must still be
//! exchanged and validated by a backend; nothing here persists it.

mod auth;
mod config;
mod provider;
mod utils;

#[cfg(test)]
mod test_utils;

pub use auth::{
    AuthCoordinator, AuthError, AuthHandle, AuthState, PkceChallenge, TEST_MODE_RESTRICTED_CODE,
};

pub use config::FLATTR_LOGIN_TIMEOUT_SECS;

pub use provider::{
    AuthProvider, AuthorizationRequest, CallbackStatus, NativeSdkProvider, NoOpProvider,
    OAuthSdk, ProviderError, ProviderEvent, ProviderKind, ProviderResult, ResultSender,
    ScriptBridgeProvider, ScriptHost, SdkOutcome, WebLoginOptions, WebLoginSettings,
    WebSdkOptions,
};

pub use provider::{
    TRUECALLER_BUTTON_COLOR, TRUECALLER_BUTTON_TEXT_COLOR, TRUECALLER_CALLBACK_URL,
    TRUECALLER_CONSENT_TITLE, TRUECALLER_CTA_TEXT, TRUECALLER_CUSTOM_DOMAIN, TRUECALLER_LANG,
    TRUECALLER_PARTNER_KEY, TRUECALLER_PARTNER_NAME, TRUECALLER_PRIVACY_URL, TRUECALLER_SCOPES,
    TRUECALLER_SDK_REQUEST_CODE, TRUECALLER_TERMS_URL,
};

pub use utils::UtilError;

/// Reads the configuration up front so bad values show up in the logs at startup
pub fn init() {
    let _ = *FLATTR_LOGIN_TIMEOUT_SECS;
    provider::init();
    tracing::info!(
        "flattr_auth initialized, login timeout {}s",
        *FLATTR_LOGIN_TIMEOUT_SECS
    );
}

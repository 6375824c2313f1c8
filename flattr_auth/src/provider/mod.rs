mod config;
mod errors;
mod native;
mod noop;
mod script;
mod types;

pub use config::{
    TRUECALLER_BUTTON_COLOR, TRUECALLER_BUTTON_TEXT_COLOR, TRUECALLER_CALLBACK_URL,
    TRUECALLER_CONSENT_TITLE, TRUECALLER_CTA_TEXT, TRUECALLER_CUSTOM_DOMAIN, TRUECALLER_LANG,
    TRUECALLER_PARTNER_KEY, TRUECALLER_PARTNER_NAME, TRUECALLER_PRIVACY_URL, TRUECALLER_SCOPES,
    TRUECALLER_SDK_REQUEST_CODE, TRUECALLER_TERMS_URL, WebLoginSettings,
};
pub use errors::ProviderError;
pub use native::{NativeSdkProvider, OAuthSdk, SdkOutcome};
pub use noop::NoOpProvider;
pub use script::{ScriptBridgeProvider, ScriptHost, WebLoginOptions, WebSdkOptions};
pub use types::{
    AuthProvider, AuthorizationRequest, CallbackStatus, ProviderEvent, ProviderKind,
    ProviderResult, ResultSender,
};

pub(crate) fn init() {
    // Force evaluation so bad values are reported at startup
    let _ = *TRUECALLER_SDK_REQUEST_CODE;
    tracing::debug!(
        "Truecaller provider config: partner={}, scopes={:?}, request_code={}",
        *TRUECALLER_PARTNER_NAME,
        *TRUECALLER_SCOPES,
        *TRUECALLER_SDK_REQUEST_CODE
    );
    if TRUECALLER_PARTNER_KEY.is_empty() {
        tracing::debug!("TRUECALLER_PARTNER_KEY not set; the web provider is unavailable");
    }
}

use std::{env, sync::LazyLock};
use url::Url;

use super::errors::ProviderError;

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Partner key issued by Truecaller for the web SDK.
/// Required by the script bridge; there is no default.
pub static TRUECALLER_PARTNER_KEY: LazyLock<String> =
    LazyLock::new(|| env::var("TRUECALLER_PARTNER_KEY").unwrap_or_default());

/// Display name shown on the Truecaller consent screen.
pub static TRUECALLER_PARTNER_NAME: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_PARTNER_NAME", "Flattr"));

pub static TRUECALLER_PRIVACY_URL: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_PRIVACY_URL", "https://flattr.io/privacy"));

pub static TRUECALLER_TERMS_URL: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_TERMS_URL", "https://flattr.io/tnc"));

/// Backend endpoint Truecaller posts the web access token to.
pub static TRUECALLER_CALLBACK_URL: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_CALLBACK_URL", "https://flattr.io/auth/true-sdk"));

pub static TRUECALLER_CUSTOM_DOMAIN: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_CUSTOM_DOMAIN", "https://flattr.io"));

pub static TRUECALLER_LANG: LazyLock<String> = LazyLock::new(|| env_or("TRUECALLER_LANG", "en"));

pub static TRUECALLER_CONSENT_TITLE: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_CONSENT_TITLE", "Login with Truecaller"));

pub static TRUECALLER_CTA_TEXT: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_CTA_TEXT", "continue"));

pub static TRUECALLER_BUTTON_COLOR: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_BUTTON_COLOR", "#4285F4"));

pub static TRUECALLER_BUTTON_TEXT_COLOR: LazyLock<String> =
    LazyLock::new(|| env_or("TRUECALLER_BUTTON_TEXT_COLOR", "#FFFFFF"));

/// OAuth scopes requested from Truecaller, space separated.
/// Default: "profile phone email"
pub static TRUECALLER_SCOPES: LazyLock<Vec<String>> =
    LazyLock::new(|| parse_scopes(&env_or("TRUECALLER_SCOPES", "profile phone email")));

/// Activity request code the Android SDK uses for its result.
pub static TRUECALLER_SDK_REQUEST_CODE: LazyLock<i32> = LazyLock::new(|| {
    let raw = env_or("TRUECALLER_SDK_REQUEST_CODE", "100");
    raw.trim().parse().unwrap_or_else(|e| {
        tracing::warn!("Invalid TRUECALLER_SDK_REQUEST_CODE {:?}: {}", raw, e);
        100
    })
});

pub(crate) fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Branding and policy settings for the web SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebLoginSettings {
    pub partner_key: String,
    pub partner_name: String,
    pub lang: String,
    pub privacy_url: String,
    pub terms_url: String,
    pub callback_url: String,
    pub custom_domain: String,
    pub login_hint: String,
    pub consent_title: String,
    pub cta_text: String,
    pub button_color: String,
    pub button_text_color: String,
}

impl WebLoginSettings {
    /// Builds the settings from `TRUECALLER_*` environment variables.
    pub fn from_env() -> Result<Self, ProviderError> {
        let settings = Self {
            partner_key: TRUECALLER_PARTNER_KEY.clone(),
            partner_name: TRUECALLER_PARTNER_NAME.clone(),
            lang: TRUECALLER_LANG.clone(),
            privacy_url: TRUECALLER_PRIVACY_URL.clone(),
            terms_url: TRUECALLER_TERMS_URL.clone(),
            callback_url: TRUECALLER_CALLBACK_URL.clone(),
            custom_domain: TRUECALLER_CUSTOM_DOMAIN.clone(),
            login_hint: String::new(),
            consent_title: TRUECALLER_CONSENT_TITLE.clone(),
            cta_text: TRUECALLER_CTA_TEXT.clone(),
            button_color: TRUECALLER_BUTTON_COLOR.clone(),
            button_text_color: TRUECALLER_BUTTON_TEXT_COLOR.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.partner_key.trim().is_empty() {
            return Err(ProviderError::Config(
                "TRUECALLER_PARTNER_KEY is not set".to_string(),
            ));
        }

        for (name, value) in [
            ("privacy_url", &self.privacy_url),
            ("terms_url", &self.terms_url),
            ("callback_url", &self.callback_url),
            ("custom_domain", &self.custom_domain),
        ] {
            let parsed = Url::parse(value)
                .map_err(|e| ProviderError::Config(format!("Invalid {name} {value:?}: {e}")))?;
            if !matches!(parsed.scheme(), "https" | "http") {
                return Err(ProviderError::Config(format!(
                    "{name} must be an http(s) URL, got {value:?}"
                )));
            }
        }

        for (name, value) in [
            ("button_color", &self.button_color),
            ("button_text_color", &self.button_text_color),
        ] {
            let hex = value.strip_prefix('#').unwrap_or_default();
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ProviderError::Config(format!(
                    "{name} must look like #RRGGBB, got {value:?}"
                )));
            }
        }

        Ok(())
    }
}

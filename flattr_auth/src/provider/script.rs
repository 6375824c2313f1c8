use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

use super::config::WebLoginSettings;
use super::errors::ProviderError;
use super::types::{
    AuthProvider, AuthorizationRequest, ProviderEvent, ProviderKind, ProviderResult, ResultSender,
};
use crate::utils::redact;

/// Options passed to the web SDK's `triggerTruecallerLogin` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLoginOptions {
    pub request_nonce: String,
    pub partner_key: String,
    pub partner_name: String,
    pub lang: String,
    pub privacy_url: String,
    pub terms_url: String,
    pub login_hint: String,
    pub consent_title: String,
    pub cta_text: String,
    pub button_color: String,
    pub button_text_color: String,
    pub sdk_options: WebSdkOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSdkOptions {
    pub custom_domain: String,
}

impl WebLoginSettings {
    pub fn options_for(&self, nonce: &str) -> WebLoginOptions {
        WebLoginOptions {
            request_nonce: nonce.to_string(),
            partner_key: self.partner_key.clone(),
            partner_name: self.partner_name.clone(),
            lang: self.lang.clone(),
            privacy_url: self.privacy_url.clone(),
            terms_url: self.terms_url.clone(),
            login_hint: self.login_hint.clone(),
            consent_title: self.consent_title.clone(),
            cta_text: self.cta_text.clone(),
            button_color: self.button_color.clone(),
            button_text_color: self.button_text_color.clone(),
            sdk_options: WebSdkOptions {
                custom_domain: self.custom_domain.clone(),
            },
        }
    }
}

/// The hosting page: whatever can see the Truecaller script and call into it.
pub trait ScriptHost: Send + Sync + 'static {
    /// Whether the Truecaller SDK script finished loading.
    fn is_script_loaded(&self) -> bool;

    /// Calls the page's trigger function. Errors thrown by the script map to `Trigger`.
    fn trigger_login(&self, options: &WebLoginOptions) -> Result<(), ProviderError>;
}

/// Web provider driving the Truecaller script through a [`ScriptHost`].
///
/// The page forwards the SDK callback object to [`Self::handle_callback`]
/// or [`Self::handle_callback_json`], and script load failures to
/// [`Self::handle_script_error`].
pub struct ScriptBridgeProvider<H: ScriptHost> {
    host: H,
    settings: WebLoginSettings,
    pending: Mutex<Option<ResultSender>>,
}

impl<H: ScriptHost> ScriptBridgeProvider<H> {
    pub fn new(host: H, settings: WebLoginSettings) -> Result<Self, ProviderError> {
        settings.validate()?;
        Ok(Self {
            host,
            settings,
            pending: Mutex::new(None),
        })
    }

    /// Uses settings from `TRUECALLER_*` environment variables.
    pub fn from_env(host: H) -> Result<Self, ProviderError> {
        Self::new(host, WebLoginSettings::from_env()?)
    }

    pub fn settings(&self) -> &WebLoginSettings {
        &self.settings
    }

    /// Forwards the SDK callback to the waiting attempt.
    ///
    /// Returns false if no attempt is waiting.
    pub fn handle_callback(&self, result: ProviderResult) -> bool {
        tracing::debug!(
            "Web callback received: status={}, nonce={:?}",
            result.status.as_str(),
            result.token.as_deref().map(redact)
        );
        if result.credential.is_some() {
            tracing::info!(
                "Access token received client-side; the backend at {} must validate it",
                self.settings.callback_url
            );
        }
        self.forward(ProviderEvent::Completed(result))
    }

    /// Same as [`Self::handle_callback`] for a JSON-encoded callback object.
    ///
    /// A payload that does not parse still ends the waiting attempt; the
    /// parse error is returned to the page.
    pub fn handle_callback_json(&self, payload: &str) -> Result<bool, ProviderError> {
        match serde_json::from_str::<ProviderResult>(payload) {
            Ok(result) => Ok(self.handle_callback(result)),
            Err(e) => {
                tracing::error!("Unreadable web callback: {}", e);
                self.forward(ProviderEvent::Malformed(e.to_string()));
                Err(ProviderError::Serde(e.to_string()))
            }
        }
    }

    /// Called by the page when the SDK script failed to load.
    pub fn handle_script_error(&self) -> bool {
        tracing::error!("Truecaller SDK script failed to load");
        self.forward(ProviderEvent::ScriptLoadFailed)
    }

    fn forward(&self, event: ProviderEvent) -> bool {
        let reply = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match reply {
            Some(reply) => reply.deliver(event),
            None => {
                tracing::warn!("No web login in flight, dropping {:?}", event);
                false
            }
        }
    }
}

#[async_trait]
impl<H: ScriptHost> AuthProvider for ScriptBridgeProvider<H> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ScriptBridge
    }

    async fn is_ready(&self) -> bool {
        let loaded = self.host.is_script_loaded();
        if !loaded {
            tracing::warn!("Truecaller script not loaded");
        }
        loaded
    }

    async fn request_authorization(
        &self,
        request: AuthorizationRequest,
        reply: ResultSender,
    ) -> Result<(), ProviderError> {
        if !self.host.is_script_loaded() {
            return Err(ProviderError::NotReady(
                "Truecaller script not loaded".to_string(),
            ));
        }

        let options = self.settings.options_for(&request.token);
        tracing::debug!(
            "Calling triggerTruecallerLogin for {} with nonce {}",
            options.partner_name,
            redact(&options.request_nonce)
        );

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(reply);
        if previous.is_some() {
            tracing::warn!("Replacing an unanswered web login attempt");
        }

        if let Err(e) = self.host.trigger_login(&options) {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            return Err(e);
        }

        tracing::debug!("triggerTruecallerLogin invoked");
        Ok(())
    }
}

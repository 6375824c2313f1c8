use std::sync::Arc;
use std::time::Duration;

use flattr_auth::{ProviderError, ProviderResult, ScriptBridgeProvider, ScriptHost, WebLoginOptions};
use tokio::sync::mpsc;

/// A page with the Truecaller script "loaded" that hands every trigger to
/// [`approve_logins`] instead of showing a consent sheet.
pub(crate) struct SimulatedPage {
    triggers: mpsc::UnboundedSender<WebLoginOptions>,
}

impl SimulatedPage {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<WebLoginOptions>) {
        let (triggers, rx) = mpsc::unbounded_channel();
        (Self { triggers }, rx)
    }
}

impl ScriptHost for SimulatedPage {
    fn is_script_loaded(&self) -> bool {
        true
    }

    fn trigger_login(&self, options: &WebLoginOptions) -> Result<(), ProviderError> {
        self.triggers
            .send(options.clone())
            .map_err(|e| ProviderError::Trigger(e.to_string()))
    }
}

/// Plays the user approving the consent sheet after a short pause.
pub(crate) async fn approve_logins(
    provider: Arc<ScriptBridgeProvider<SimulatedPage>>,
    mut triggers: mpsc::UnboundedReceiver<WebLoginOptions>,
) {
    while let Some(options) = triggers.recv().await {
        tracing::debug!(
            "Consent sheet shown for {} ({})",
            options.partner_name,
            options.sdk_options.custom_domain
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
        let callback = ProviderResult::success(options.request_nonce, "simulated-access-token");
        if !provider.handle_callback(callback) {
            tracing::warn!("Nobody was waiting for the simulated callback");
        }
    }
}

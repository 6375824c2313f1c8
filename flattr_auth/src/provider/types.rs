use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

use super::errors::ProviderError;

/// Which kind of Truecaller integration a provider talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Truecaller Android SDK with OAuth + PKCE
    NativeSdk,
    /// Truecaller web SDK loaded through a script tag
    ScriptBridge,
    /// Platforms without any Truecaller integration
    NoOp,
}

impl ProviderKind {
    /// Name of the anti-replay parameter for this integration.
    pub fn token_name(self) -> &'static str {
        match self {
            ProviderKind::NativeSdk => "state",
            ProviderKind::ScriptBridge | ProviderKind::NoOp => "nonce",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::NativeSdk => "native_sdk",
            ProviderKind::ScriptBridge => "script_bridge",
            ProviderKind::NoOp => "no_op",
        };
        f.write_str(name)
    }
}

/// Everything a provider needs to start one authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Anti-replay token (`state` or `nonce`) the provider must echo back
    pub token: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<&'static str>,
    pub scopes: Vec<String>,
}

/// Status reported by the provider callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum CallbackStatus {
    Success,
    Failure,
    UserCancelled,
    VerificationRequired,
    Other(String),
}

impl CallbackStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallbackStatus::Success => "success",
            CallbackStatus::Failure => "failure",
            CallbackStatus::UserCancelled => "user_cancelled",
            CallbackStatus::VerificationRequired => "verification_required",
            CallbackStatus::Other(status) => status,
        }
    }
}

impl Default for CallbackStatus {
    fn default() -> Self {
        CallbackStatus::Other(String::new())
    }
}

impl From<Option<String>> for CallbackStatus {
    fn from(status: Option<String>) -> Self {
        match status.as_deref() {
            Some("success") => CallbackStatus::Success,
            Some("failure") => CallbackStatus::Failure,
            Some("user_cancelled") => CallbackStatus::UserCancelled,
            Some("verification_required") => CallbackStatus::VerificationRequired,
            Some(other) => CallbackStatus::Other(other.to_string()),
            None => CallbackStatus::Other(String::new()),
        }
    }
}

impl From<&str> for CallbackStatus {
    fn from(status: &str) -> Self {
        Some(status.to_string()).into()
    }
}

impl From<CallbackStatus> for String {
    fn from(status: CallbackStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Result of one authorization attempt as reported by the provider.
///
/// Field names follow the object the web SDK hands to its callback, so a
/// JSON payload from the hosting page deserializes directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    #[serde(default)]
    pub status: CallbackStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    /// Authorization code (native) or access token (web)
    #[serde(default, rename = "accessToken", alias = "authorizationCode")]
    pub credential: Option<String>,
    /// Echoed anti-replay token
    #[serde(default, rename = "requestNonce", alias = "state")]
    pub token: Option<String>,
    #[serde(default)]
    pub scopes_granted: Vec<String>,
}

impl ProviderResult {
    pub fn success(token: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            status: CallbackStatus::Success,
            credential: Some(credential.into()),
            token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn failure(token: impl Into<String>, error_code: Option<i64>, message: &str) -> Self {
        Self {
            status: CallbackStatus::Failure,
            message: Some(message.to_string()),
            error_code,
            token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn cancelled(token: impl Into<String>) -> Self {
        Self {
            status: CallbackStatus::UserCancelled,
            token: Some(token.into()),
            ..Default::default()
        }
    }
}

/// Anything a provider can report back to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Completed(ProviderResult),
    /// The web SDK script could not be loaded by the hosting page
    ScriptLoadFailed,
    /// The page forwarded a callback that is not a callback object
    Malformed(String),
}

/// Reply slot for a single authorization attempt.
///
/// Consumed on delivery, so a provider can answer an attempt at most once.
/// It is `Send` and may be completed from any thread; the coordinator picks
/// the event up on its own task.
#[derive(Debug)]
pub struct ResultSender {
    tx: oneshot::Sender<ProviderEvent>,
}

impl ResultSender {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<ProviderEvent>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Returns false when the attempt has already been abandoned by the coordinator.
    pub fn deliver(self, event: ProviderEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn complete(self, result: ProviderResult) -> bool {
        self.deliver(ProviderEvent::Completed(result))
    }

    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Platform capability performing the Truecaller handshake.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    fn kind(&self) -> ProviderKind;

    /// Whether authorization requests carry a PKCE code challenge.
    fn supports_pkce(&self) -> bool {
        self.kind() == ProviderKind::NativeSdk
    }

    /// One-time setup, called before the first login attempt.
    async fn init(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Whether the external integration can take a login request right now.
    async fn is_ready(&self) -> bool;

    /// Hands the request to the external integration.
    ///
    /// Returns once the request has been dispatched; the outcome arrives
    /// later through `reply`.
    async fn request_authorization(
        &self,
        request: AuthorizationRequest,
        reply: ResultSender,
    ) -> Result<(), ProviderError>;
}

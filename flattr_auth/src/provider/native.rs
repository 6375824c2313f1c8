use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::config::TRUECALLER_SDK_REQUEST_CODE;
use super::errors::ProviderError;
use super::types::{
    AuthProvider, AuthorizationRequest, CallbackStatus, ProviderKind, ProviderResult, ResultSender,
};
use crate::utils::redact;

/// The parts of the Truecaller Android SDK the login flow touches.
///
/// Implemented by the platform glue around the SDK instance, so the
/// provider never reaches for a process-wide singleton.
pub trait OAuthSdk: Send + Sync + 'static {
    /// False when the Truecaller app is missing or the SDK cannot run the flow.
    fn is_oauth_flow_usable(&self) -> bool;

    fn set_oauth_state(&self, state: &str);

    fn set_code_challenge(&self, code_challenge: &str);

    fn set_oauth_scopes(&self, scopes: &[String]);

    /// Hands over to the Truecaller app.
    fn get_authorization_code(&self) -> Result<(), ProviderError>;
}

/// What the SDK reports once the Truecaller app returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkOutcome {
    Success {
        state: Option<String>,
        authorization_code: Option<String>,
        scopes_granted: Vec<String>,
    },
    Failure {
        code: i64,
        message: String,
    },
    /// The number is not a Truecaller user and needs OTP verification.
    VerificationRequired { message: Option<String> },
}

struct PendingRequest {
    state: String,
    reply: ResultSender,
}

/// Android provider driving the Truecaller OAuth SDK.
pub struct NativeSdkProvider<S: OAuthSdk> {
    sdk: Option<S>,
    request_code: i32,
    pending: Mutex<Option<PendingRequest>>,
}

impl<S: OAuthSdk> NativeSdkProvider<S> {
    /// `sdk` is `None` when SDK initialization failed at application start.
    pub fn new(sdk: Option<S>) -> Self {
        Self::with_request_code(sdk, *TRUECALLER_SDK_REQUEST_CODE)
    }

    pub fn with_request_code(sdk: Option<S>, request_code: i32) -> Self {
        Self {
            sdk,
            request_code,
            pending: Mutex::new(None),
        }
    }

    pub fn request_code(&self) -> i32 {
        self.request_code
    }

    /// Entry point for the activity result.
    ///
    /// Results carrying another request code belong to someone else and are
    /// left alone; returns whether the result was consumed.
    pub fn on_activity_result(&self, request_code: i32, outcome: SdkOutcome) -> bool {
        if request_code != self.request_code {
            tracing::debug!(
                "Activity result {} is not for the Truecaller SDK ({})",
                request_code,
                self.request_code
            );
            return false;
        }

        let Some(pending) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            tracing::warn!("Truecaller result arrived with no login in flight");
            return true;
        };

        let result = into_provider_result(outcome, &pending.state);
        tracing::debug!(
            "Forwarding SDK result: status={}, state={:?}",
            result.status.as_str(),
            result.token.as_deref().map(redact)
        );
        if !pending.reply.complete(result) {
            tracing::warn!("Login attempt was abandoned before the SDK answered");
        }
        true
    }
}

/// Failure outcomes carry no state from the SDK; they are bound to the
/// attempt that is in flight. Success must echo the state itself.
fn into_provider_result(outcome: SdkOutcome, issued_state: &str) -> ProviderResult {
    match outcome {
        SdkOutcome::Success {
            state,
            authorization_code,
            scopes_granted,
        } => ProviderResult {
            status: CallbackStatus::Success,
            credential: authorization_code,
            token: state,
            scopes_granted,
            ..Default::default()
        },
        SdkOutcome::Failure { code, message } => {
            ProviderResult::failure(issued_state, Some(code), &message)
        }
        SdkOutcome::VerificationRequired { message } => ProviderResult {
            status: CallbackStatus::VerificationRequired,
            message,
            token: Some(issued_state.to_string()),
            ..Default::default()
        },
    }
}

#[async_trait]
impl<S: OAuthSdk> AuthProvider for NativeSdkProvider<S> {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NativeSdk
    }

    async fn init(&self) -> Result<(), ProviderError> {
        match &self.sdk {
            Some(_) => {
                tracing::info!("Truecaller SDK available");
                Ok(())
            }
            None => Err(ProviderError::NotReady(
                "Truecaller SDK failed to initialize".to_string(),
            )),
        }
    }

    async fn is_ready(&self) -> bool {
        match &self.sdk {
            Some(sdk) => {
                let usable = sdk.is_oauth_flow_usable();
                if !usable {
                    tracing::warn!(
                        "Truecaller OAuth flow not usable (app missing or SDK not initialized)"
                    );
                }
                usable
            }
            None => {
                tracing::error!("Truecaller SDK instance is missing");
                false
            }
        }
    }

    async fn request_authorization(
        &self,
        request: AuthorizationRequest,
        reply: ResultSender,
    ) -> Result<(), ProviderError> {
        let sdk = self.sdk.as_ref().ok_or_else(|| {
            ProviderError::NotReady("Truecaller SDK instance is missing".to_string())
        })?;
        let code_challenge = request.code_challenge.as_deref().ok_or_else(|| {
            ProviderError::Trigger("Truecaller OAuth requires a code challenge".to_string())
        })?;

        sdk.set_oauth_state(&request.token);
        sdk.set_code_challenge(code_challenge);
        sdk.set_oauth_scopes(&request.scopes);
        tracing::debug!(
            "SDK prepared: state={}, scopes={}",
            redact(&request.token),
            request.scopes.join(" ")
        );

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(PendingRequest {
            state: request.token,
            reply,
        });

        if let Err(e) = sdk.get_authorization_code() {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            return Err(e);
        }

        tracing::info!("Handed over to the Truecaller app");
        Ok(())
    }
}

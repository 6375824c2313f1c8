use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

use super::pkce::{PkceChallenge, generate_anti_replay_token};
use crate::auth::errors::AuthError;
use crate::auth::types::AuthState;
use crate::config::FLATTR_LOGIN_TIMEOUT_SECS;
use crate::provider::{
    AuthProvider, AuthorizationRequest, CallbackStatus, ProviderEvent, ProviderKind,
    ProviderResult, ResultSender, TRUECALLER_SCOPES,
};
use crate::utils::{redact, tokens_match};

/// Reported in place of an empty callback status.
const MISSING_STATUS: &str = "<missing>";
/// Reported for a callback that could not be read at all.
const MALFORMED_STATUS: &str = "<malformed>";

/// Secrets and reply channel of the attempt currently in flight.
///
/// Lives only in memory and is dropped as soon as the attempt ends.
struct PendingLogin {
    attempt_id: Uuid,
    token: String,
    code_verifier: Option<String>,
    expires_at: DateTime<Utc>,
    result_rx: oneshot::Receiver<ProviderEvent>,
}

/// Drives Truecaller login attempts and owns the resulting [`AuthState`].
///
/// Every state change goes through `&mut self`, so the coordinator has a
/// single owner. Provider callbacks may fire on any thread; they land in the
/// attempt's reply channel and are applied here, either by
/// [`Self::poll_provider`] or by the task started with [`Self::spawn`].
pub struct AuthCoordinator {
    provider: Arc<dyn AuthProvider>,
    scopes: Vec<String>,
    timeout: Duration,
    state: watch::Sender<AuthState>,
    pending: Option<PendingLogin>,
}

impl AuthCoordinator {
    /// Scopes and timeout come from `TRUECALLER_SCOPES` and `FLATTR_LOGIN_TIMEOUT_SECS`.
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (state, _) = watch::channel(AuthState::Initial);
        Self {
            provider,
            scopes: TRUECALLER_SCOPES.clone(),
            timeout: login_timeout(*FLATTR_LOGIN_TIMEOUT_SECS),
            state,
            pending: None,
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Whether an anti-replay token is live. The token itself is never exposed.
    pub fn has_pending_login(&self) -> bool {
        self.pending.is_some()
    }

    pub(super) fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|p| p.expires_at)
    }

    /// Starts a login attempt.
    ///
    /// Only acts from `Initial`. Every failure ends in `AuthState::Error`.
    pub async fn start_login(&mut self) {
        match &*self.state.borrow() {
            AuthState::Initial => {}
            AuthState::Loading => {
                tracing::warn!("Login already in progress, not issuing another token");
                return;
            }
            other => {
                tracing::warn!("start_login ignored in {:?}; reset first", other);
                return;
            }
        }

        self.set_state(AuthState::Loading);
        let kind = self.provider.kind();

        if !self.provider.is_ready().await {
            self.fail(AuthError::ProviderNotReady);
            return;
        }

        let token = match generate_anti_replay_token() {
            Ok(token) => token,
            Err(e) => {
                self.fail(AuthError::Generation(e.to_string()));
                return;
            }
        };

        let pkce = if self.provider.supports_pkce() {
            match PkceChallenge::generate() {
                Ok(pkce) => Some(pkce),
                Err(e) => {
                    self.fail(AuthError::Generation(e.to_string()));
                    return;
                }
            }
        } else {
            None
        };

        let attempt_id = Uuid::new_v4();
        let (reply, result_rx) = ResultSender::channel();
        let request = AuthorizationRequest {
            token: token.clone(),
            code_challenge: pkce.as_ref().map(|p| p.code_challenge.clone()),
            code_challenge_method: pkce.as_ref().map(|p| p.method()),
            scopes: self.scopes.clone(),
        };

        tracing::debug!(
            "Attempt {}: {} {} issued via {}, pkce={}",
            attempt_id,
            kind.token_name(),
            redact(&token),
            kind,
            pkce.is_some()
        );

        self.pending = Some(PendingLogin {
            attempt_id,
            token,
            code_verifier: pkce.map(|p| p.code_verifier),
            expires_at: deadline_after(Utc::now(), self.timeout),
            result_rx,
        });

        if let Err(e) = self.provider.request_authorization(request, reply).await {
            self.fail(AuthError::TriggerFailed(e.to_string()));
            return;
        }

        tracing::info!("Attempt {}: waiting for {} callback", attempt_id, kind);
    }

    /// Applies a provider callback to the attempt in flight.
    ///
    /// The echoed token is checked before anything in the payload is used.
    pub fn on_provider_result(&mut self, result: ProviderResult) {
        if !self.state.borrow().is_loading() {
            tracing::warn!(
                "Discarding provider result ({}) received outside of a login attempt",
                result.status.as_str()
            );
            return;
        }

        let Some(pending) = self.pending.take() else {
            self.fail(AuthError::TokenMismatch);
            return;
        };
        let attempt_id = pending.attempt_id;
        let matched = result
            .token
            .as_deref()
            .is_some_and(|received| tokens_match(&pending.token, received));
        if !matched {
            tracing::error!(
                "Attempt {}: expected {}, received {:?}",
                attempt_id,
                redact(&pending.token),
                result.token.as_deref().map(redact)
            );
        }
        discard(pending);
        if !matched {
            self.fail(AuthError::TokenMismatch);
            return;
        }

        tracing::debug!("Attempt {}: token verified", attempt_id);

        let outcome = match result.status {
            CallbackStatus::Success => result
                .credential
                .filter(|c| !c.is_empty())
                .ok_or(AuthError::MissingCredential),
            CallbackStatus::Failure => Err(AuthError::from_provider_failure(
                result.error_code,
                result.message,
            )),
            CallbackStatus::UserCancelled => Err(AuthError::UserCancelled),
            CallbackStatus::VerificationRequired => Err(AuthError::VerificationRequired(
                result.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            CallbackStatus::Other(status) if status.is_empty() => {
                Err(AuthError::UnknownStatus(MISSING_STATUS.to_string()))
            }
            CallbackStatus::Other(status) => Err(AuthError::UnknownStatus(status)),
        };

        match outcome {
            Ok(credential) => {
                tracing::info!(
                    "Attempt {}: login succeeded, granted scopes {:?}",
                    attempt_id,
                    result.scopes_granted
                );
                self.set_state(AuthState::Success {
                    authorization_credential: credential,
                });
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn on_provider_event(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::Completed(result) => self.on_provider_result(result),
            ProviderEvent::ScriptLoadFailed => {
                if self.state.borrow().is_loading() {
                    self.fail(AuthError::ScriptLoadFailed);
                } else {
                    tracing::warn!("Script load failure reported outside of a login attempt");
                }
            }
            ProviderEvent::Malformed(detail) => {
                if self.state.borrow().is_loading() {
                    tracing::error!("Provider callback could not be read: {}", detail);
                    self.fail(AuthError::UnknownStatus(MALFORMED_STATUS.to_string()));
                } else {
                    tracing::warn!("Unreadable callback received outside of a login attempt");
                }
            }
        }
    }

    /// Applies the provider's answer if one has arrived. Returns whether anything changed.
    pub fn poll_provider(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        match pending.result_rx.try_recv() {
            Ok(event) => {
                self.on_provider_event(event);
                true
            }
            Err(oneshot::error::TryRecvError::Empty) => false,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.provider_closed();
                true
            }
        }
    }

    /// Provider dropped its reply slot without answering.
    pub(super) fn provider_closed(&mut self) {
        if self.pending.is_some() {
            self.fail(AuthError::ProviderClosed);
        }
    }

    /// Waits for the reply of the attempt in flight; never resolves when idle.
    pub(super) async fn wait_provider_event(
        &mut self,
    ) -> Result<ProviderEvent, oneshot::error::RecvError> {
        match self.pending.as_mut() {
            Some(pending) => (&mut pending.result_rx).await,
            None => std::future::pending().await,
        }
    }

    /// Back to `Initial` after `Success` or `Error` ("logout" / "try again").
    pub fn reset_to_initial(&mut self) {
        if !self.state.borrow().is_terminal() {
            tracing::warn!("reset_to_initial ignored; no finished login to reset");
            return;
        }
        self.clear_pending();
        self.set_state(AuthState::Initial);
    }

    /// Abandons the attempt in flight, e.g. when the user navigates away.
    pub fn cancel_login(&mut self) {
        if !self.state.borrow().is_loading() {
            tracing::debug!("cancel_login ignored; no login in progress");
            return;
        }
        self.fail(AuthError::Cancelled);
    }

    /// Ends the attempt in flight if its deadline has passed.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        let overdue = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.expires_at);
        if overdue && self.state.borrow().is_loading() {
            self.fail(AuthError::TimedOut);
            return true;
        }
        false
    }

    fn fail(&mut self, err: AuthError) {
        let err = err.log();
        self.clear_pending();
        self.set_state(err.into());
    }

    fn clear_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            discard(pending);
        }
    }

    fn set_state(&mut self, next: AuthState) {
        let previous = self.state.send_replace(next);
        tracing::debug!("Auth state: {:?} -> {:?}", previous, *self.state.borrow());
    }
}

fn login_timeout(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// A deadline beyond the representable range never fires.
fn deadline_after(now: DateTime<Utc>, timeout: Duration) -> DateTime<Utc> {
    now.checked_add_signed(timeout)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn discard(pending: PendingLogin) {
    tracing::debug!(
        "Attempt {}: cleared {} and{} code verifier",
        pending.attempt_id,
        redact(&pending.token),
        if pending.code_verifier.is_some() {
            ""
        } else {
            " no"
        }
    );
}

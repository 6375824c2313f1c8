use serde::Serialize;

use super::errors::AuthError;

/// What the UI renders. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// No login in progress
    #[default]
    Initial,
    /// Waiting for the provider callback
    Loading,
    /// Login completed; the credential still has to be exchanged by the backend
    Success { authorization_credential: String },
    /// Login failed or was cancelled; `message` is user facing
    Error { message: String },
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    /// `Success` or `Error`, the states left only by an explicit reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Success { .. } | AuthState::Error { .. })
    }
}

impl From<AuthError> for AuthState {
    fn from(err: AuthError) -> Self {
        AuthState::Error {
            message: err.to_string(),
        }
    }
}

/// Operations a consumer can send to a running coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthCommand {
    StartLogin,
    Reset,
    Cancel,
}

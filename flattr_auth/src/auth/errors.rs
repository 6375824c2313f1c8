//! Error types for the login coordinator
//!
//! The `Display` text of every variant is what the user sees in
//! `AuthState::Error`, so keep it short and free of internals.

use thiserror::Error;

/// Error code the Truecaller SDK returns for numbers not whitelisted in test mode.
pub const TEST_MODE_RESTRICTED_CODE: i64 = 40306;

/// Errors that end a login attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Provider capability unavailable (app missing, script not loaded)
    #[error("provider not ready")]
    ProviderNotReady,

    /// Anti-replay token or PKCE artifact could not be produced
    #[error("failed to generate code verifier/challenge")]
    Generation(String),

    /// Echoed state/nonce does not match the one issued
    #[error("state/nonce mismatch - possible CSRF")]
    TokenMismatch,

    /// Explicit failure reported by the provider
    #[error("Login failed: {0}")]
    ProviderFailure(String),

    /// Phone number not allowed while the Truecaller app is in test mode
    #[error("Test mode error: Phone number not allowed in test mode")]
    TestModeRestricted,

    #[error("user cancelled login")]
    UserCancelled,

    /// Non-Truecaller user; OTP verification is not supported
    #[error("verification required: {0}")]
    VerificationRequired(String),

    #[error("missing credential despite success status")]
    MissingCredential,

    #[error("unknown callback status: {0}")]
    UnknownStatus(String),

    /// The provider could not start the external flow
    #[error("failed to initiate login: {0}")]
    TriggerFailed(String),

    #[error("failed to load provider script")]
    ScriptLoadFailed,

    /// Consumer abandoned the attempt
    #[error("login cancelled")]
    Cancelled,

    /// No callback arrived before the attempt deadline
    #[error("login timed out")]
    TimedOut,

    /// Provider dropped the attempt without reporting anything
    #[error("provider closed without a result")]
    ProviderClosed,

    /// The coordinator task is gone
    #[error("authentication service stopped")]
    CoordinatorStopped,
}

impl AuthError {
    /// Maps an explicit provider failure, translating well-known error codes.
    pub fn from_provider_failure(error_code: Option<i64>, message: Option<String>) -> Self {
        match error_code {
            Some(TEST_MODE_RESTRICTED_CODE) => Self::TestModeRestricted,
            _ => Self::ProviderFailure(
                message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Unknown Truecaller error".to_string()),
            ),
        }
    }

    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::TokenMismatch => {
                tracing::error!("State/nonce mismatch on provider callback; possible CSRF")
            }
            Self::Generation(detail) => {
                tracing::error!("Token generation failed: {}", detail)
            }
            Self::TriggerFailed(detail) => {
                tracing::error!("Provider trigger failed: {}", detail)
            }
            Self::ScriptLoadFailed | Self::ProviderClosed | Self::CoordinatorStopped => {
                tracing::error!("{}", self)
            }
            Self::UserCancelled | Self::Cancelled => tracing::info!("{}", self),
            _ => tracing::warn!("Login failed: {}", self),
        }
        self
    }
}

use async_trait::async_trait;

use super::errors::ProviderError;
use super::types::{AuthProvider, AuthorizationRequest, ProviderKind, ProviderResult, ResultSender};

const UNSUPPORTED_MESSAGE: &str = "Truecaller login is not supported on this platform";

#[derive(Debug, Clone, PartialEq, Eq)]
enum StubOutcome {
    Unavailable,
    Succeed(String),
}

/// Stand-in for platforms without a Truecaller integration (desktop, iOS)
/// and for previews. Answers every request immediately.
#[derive(Debug, Clone)]
pub struct NoOpProvider {
    outcome: StubOutcome,
}

impl NoOpProvider {
    /// Every attempt ends in a failure explaining the platform has no integration.
    pub fn unavailable() -> Self {
        Self {
            outcome: StubOutcome::Unavailable,
        }
    }

    /// Every attempt succeeds with `credential`.
    pub fn succeeding(credential: impl Into<String>) -> Self {
        Self {
            outcome: StubOutcome::Succeed(credential.into()),
        }
    }
}

impl Default for NoOpProvider {
    fn default() -> Self {
        Self::unavailable()
    }
}

#[async_trait]
impl AuthProvider for NoOpProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NoOp
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn request_authorization(
        &self,
        request: AuthorizationRequest,
        reply: ResultSender,
    ) -> Result<(), ProviderError> {
        tracing::debug!("NoOp provider answering login request with {:?}", self.outcome);
        let result = match &self.outcome {
            StubOutcome::Unavailable => {
                ProviderResult::failure(request.token, None, UNSUPPORTED_MESSAGE)
            }
            StubOutcome::Succeed(credential) => {
                ProviderResult::success(request.token, credential.clone())
            }
        };
        reply.complete(result);
        Ok(())
    }
}

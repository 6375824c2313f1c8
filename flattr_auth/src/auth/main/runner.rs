use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use super::coordinator::AuthCoordinator;
use crate::auth::errors::AuthError;
use crate::auth::types::{AuthCommand, AuthState};

const COMMAND_BUFFER: usize = 16;

enum LoopEvent {
    Command(AuthCommand),
    Provider(Result<crate::provider::ProviderEvent, tokio::sync::oneshot::error::RecvError>),
    Deadline,
}

/// Cloneable handle to a coordinator running on its own task.
///
/// This is what the UI holds: it can start, reset and cancel logins and
/// watch the state, but never sees the anti-replay token.
#[derive(Debug, Clone)]
pub struct AuthHandle {
    commands: mpsc::Sender<AuthCommand>,
    state: watch::Receiver<AuthState>,
}

impl AuthHandle {
    pub async fn start_login(&self) -> Result<(), AuthError> {
        self.send(AuthCommand::StartLogin).await
    }

    /// Same as `updateAuthState(Initial)` after a finished login.
    pub async fn reset_to_initial(&self) -> Result<(), AuthError> {
        self.send(AuthCommand::Reset).await
    }

    pub async fn cancel_login(&self) -> Result<(), AuthError> {
        self.send(AuthCommand::Cancel).await
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Waits until the state satisfies `predicate` and returns it.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&AuthState) -> bool,
    ) -> Result<AuthState, AuthError> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| AuthError::CoordinatorStopped)?;
        Ok(state.clone())
    }

    async fn send(&self, command: AuthCommand) -> Result<(), AuthError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AuthError::CoordinatorStopped.log())
    }
}

impl AuthCoordinator {
    /// Moves the coordinator onto a tokio task and returns a handle to it.
    ///
    /// The task stops once every handle is dropped.
    pub fn spawn(self) -> AuthHandle {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let state = self.subscribe();
        tokio::spawn(self.run(rx));
        AuthHandle { commands, state }
    }

    /// Single owner loop: consumer commands, provider replies and the
    /// attempt deadline are all applied here, one at a time.
    pub async fn run(mut self, mut commands: mpsc::Receiver<AuthCommand>) {
        tracing::debug!("Auth coordinator running ({})", self.provider_kind());
        loop {
            let deadline = self.deadline();
            let event = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => LoopEvent::Command(command),
                    None => break,
                },
                received = self.wait_provider_event() => LoopEvent::Provider(received),
                _ = sleep_until(deadline) => LoopEvent::Deadline,
            };

            match event {
                LoopEvent::Command(AuthCommand::StartLogin) => self.start_login().await,
                LoopEvent::Command(AuthCommand::Reset) => self.reset_to_initial(),
                LoopEvent::Command(AuthCommand::Cancel) => self.cancel_login(),
                LoopEvent::Provider(Ok(event)) => self.on_provider_event(event),
                LoopEvent::Provider(Err(_)) => self.provider_closed(),
                LoopEvent::Deadline => {
                    self.expire_if_due(Utc::now());
                }
            }
        }
        tracing::debug!("Auth coordinator stopped");
    }
}

async fn sleep_until(deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(deadline) => {
            let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(remaining).await;
        }
        None => std::future::pending().await,
    }
}

use std::sync::Arc;

use dotenvy::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flattr_auth::{AuthCoordinator, AuthProvider, AuthState, NoOpProvider, ScriptBridgeProvider};

mod page;

use crate::page::{SimulatedPage, approve_logins};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,flattr_auth=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    flattr_auth::init();

    // `web` runs the script bridge against a simulated page, anything else the stub
    let mode = std::env::args().nth(1).unwrap_or_else(|| "preview".to_string());
    let provider: Arc<dyn AuthProvider> = match mode.as_str() {
        "web" => {
            let (page, triggers) = SimulatedPage::new();
            let provider = Arc::new(ScriptBridgeProvider::from_env(page)?);
            tokio::spawn(approve_logins(provider.clone(), triggers));
            provider
        }
        "unsupported" => Arc::new(NoOpProvider::unavailable()),
        _ => Arc::new(NoOpProvider::succeeding("preview-authorization-code")),
    };
    provider.init().await?;

    let handle = AuthCoordinator::new(provider).spawn();

    let mut states = handle.subscribe();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            tracing::info!("Auth state: {}", describe_state(&state));
        }
    });

    handle.start_login().await?;
    let outcome = handle.wait_for(AuthState::is_terminal).await?;
    match &outcome {
        AuthState::Success {
            authorization_credential,
        } => tracing::info!(
            "Login succeeded; send the credential ({}) to the backend for exchange",
            redact(authorization_credential)
        ),
        AuthState::Error { message } => tracing::warn!("Login failed: {}", message),
        _ => {}
    }

    handle.reset_to_initial().await?;
    handle.wait_for(|s| *s == AuthState::Initial).await?;

    drop(handle);
    watcher.await?;
    Ok(())
}

/// Keeps secrets out of the demo's logs.
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{prefix}… ({} chars)", secret.chars().count())
}

fn describe_state(state: &AuthState) -> String {
    match state {
        AuthState::Initial => "initial".to_string(),
        AuthState::Loading => "loading".to_string(),
        AuthState::Success { .. } => "success".to_string(),
        AuthState::Error { message } => format!("error ({message})"),
    }
}

use std::sync::Arc;

use flattr_auth::{
    AuthCoordinator, AuthError, AuthProvider, AuthState, NoOpProvider, ProviderError,
    ProviderKind, ScriptBridgeProvider,
};
use serde_json::json;

use crate::common::{FakePage, error_message, settle, web_settings};

fn web_provider(page: &FakePage) -> Arc<ScriptBridgeProvider<FakePage>> {
    Arc::new(ScriptBridgeProvider::new(page.clone(), web_settings()).unwrap())
}

#[tokio::test]
async fn test_web_login_succeeds_with_callback_json() {
    // Given a page with the Truecaller script loaded
    let page = FakePage::loaded();
    let provider = web_provider(&page);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    // When the user taps login
    handle.start_login().await.unwrap();

    // Then the script is triggered with a fresh nonce and the partner options
    let options = page.wait_for_trigger(1).await;
    assert_eq!(options.request_nonce.len(), 43);
    assert_eq!(options.partner_key, "pk-integration");
    assert_eq!(options.sdk_options.custom_domain, "https://flattr.io");

    // When the page forwards the SDK callback object
    let payload = json!({
        "status": "success",
        "accessToken": "abc123",
        "requestNonce": options.request_nonce,
    })
    .to_string();
    assert!(provider.handle_callback_json(&payload).unwrap());

    // Then the UI sees the access token
    assert_eq!(
        settle(&handle).await,
        AuthState::Success {
            authorization_credential: "abc123".to_string()
        }
    );
}

#[tokio::test]
async fn test_web_login_missing_script() {
    let page = FakePage::without_script();
    let handle = AuthCoordinator::new(web_provider(&page)).spawn();

    handle.start_login().await.unwrap();

    assert_eq!(
        settle(&handle).await,
        AuthState::from(AuthError::ProviderNotReady)
    );
    assert_eq!(page.trigger_count(), 0);
}

#[tokio::test]
async fn test_web_trigger_throws() {
    let page = FakePage::loaded();
    page.set_throws(true);
    let handle = AuthCoordinator::new(web_provider(&page)).spawn();

    handle.start_login().await.unwrap();

    let state = settle(&handle).await;
    assert!(error_message(&state).starts_with("failed to initiate login"));
}

#[tokio::test]
async fn test_web_script_error_after_trigger() {
    let page = FakePage::loaded();
    let provider = web_provider(&page);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    handle.start_login().await.unwrap();
    page.wait_for_trigger(1).await;
    assert!(provider.handle_script_error());

    assert_eq!(
        settle(&handle).await,
        AuthState::from(AuthError::ScriptLoadFailed)
    );
}

#[tokio::test]
async fn test_web_user_cancelled_then_retry() {
    let page = FakePage::loaded();
    let provider = web_provider(&page);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    // First attempt: the user closes the consent sheet
    handle.start_login().await.unwrap();
    let first = page.wait_for_trigger(1).await;
    let payload = json!({ "status": "user_cancelled", "requestNonce": first.request_nonce });
    provider.handle_callback_json(&payload.to_string()).unwrap();
    assert_eq!(
        settle(&handle).await,
        AuthState::from(AuthError::UserCancelled)
    );

    // Retry after reset gets a new nonce
    handle.reset_to_initial().await.unwrap();
    handle.wait_for(|s| *s == AuthState::Initial).await.unwrap();
    handle.start_login().await.unwrap();
    let second = page.wait_for_trigger(2).await;
    assert_ne!(first.request_nonce, second.request_nonce);

    // A replay of the first callback's nonce is rejected
    let replay = json!({
        "status": "success",
        "accessToken": "abc123",
        "requestNonce": first.request_nonce,
    });
    provider.handle_callback_json(&replay.to_string()).unwrap();
    let state = settle(&handle).await;
    assert!(error_message(&state).contains("mismatch"));
}

#[tokio::test]
async fn test_callback_without_login_is_dropped() {
    let page = FakePage::loaded();
    let provider = web_provider(&page);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    let payload = json!({ "status": "success", "accessToken": "abc123", "requestNonce": "n" });
    assert!(!provider.handle_callback_json(&payload.to_string()).unwrap());
    assert_eq!(handle.state(), AuthState::Initial);
}

#[tokio::test]
async fn test_noop_provider_on_unsupported_platform() {
    let provider = Arc::new(NoOpProvider::unavailable());
    assert_eq!(provider.kind(), ProviderKind::NoOp);
    let handle = AuthCoordinator::new(provider).spawn();

    handle.start_login().await.unwrap();

    let state = settle(&handle).await;
    assert_eq!(
        error_message(&state),
        "Login failed: Truecaller login is not supported on this platform"
    );
}

#[tokio::test]
async fn test_unreadable_callback_ends_attempt() {
    let page = FakePage::loaded();
    let provider = web_provider(&page);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    // A status that is not a string cannot be read as a callback object
    handle.start_login().await.unwrap();
    page.wait_for_trigger(1).await;
    let result = provider.handle_callback_json(r#"{"status":42,"requestNonce":"x"}"#);
    assert!(matches!(result, Err(ProviderError::Serde(_))));

    // The attempt ends instead of waiting for the timeout
    assert_eq!(
        error_message(&settle(&handle).await),
        "unknown callback status: <malformed>"
    );

    // Same for a payload that is not an object at all
    handle.reset_to_initial().await.unwrap();
    handle.wait_for(|s| *s == AuthState::Initial).await.unwrap();
    handle.start_login().await.unwrap();
    page.wait_for_trigger(2).await;
    assert!(
        provider
            .handle_callback_json(r#"["not","an","object"]"#)
            .is_err()
    );
    assert_eq!(
        error_message(&settle(&handle).await),
        "unknown callback status: <malformed>"
    );
}

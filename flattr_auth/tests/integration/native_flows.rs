use std::sync::Arc;

use flattr_auth::{
    AuthCoordinator, AuthError, AuthProvider, AuthState, NativeSdkProvider, SdkOutcome,
    TEST_MODE_RESTRICTED_CODE,
};

use crate::common::{FakeSdk, REQUEST_CODE, error_message, settle};

fn native_provider(sdk: &FakeSdk) -> Arc<NativeSdkProvider<FakeSdk>> {
    Arc::new(NativeSdkProvider::with_request_code(
        Some(sdk.clone()),
        REQUEST_CODE,
    ))
}

fn success(state: String, code: &str) -> SdkOutcome {
    SdkOutcome::Success {
        state: Some(state),
        authorization_code: Some(code.to_string()),
        scopes_granted: vec!["profile".to_string(), "phone".to_string()],
    }
}

#[tokio::test]
async fn test_native_login_succeeds_and_resets() {
    // Given a usable SDK behind a running coordinator
    let sdk = FakeSdk::default();
    let provider = native_provider(&sdk);
    let handle = AuthCoordinator::new(provider.clone())
        .with_scopes(vec!["profile".to_string(), "phone".to_string()])
        .spawn();

    // When the user taps login
    handle.start_login().await.unwrap();

    // Then the SDK is prepared with a fresh state, a PKCE challenge and the scopes
    let state = sdk.wait_for_handoff(1).await;
    assert_eq!(state.len(), 43);
    assert_eq!(sdk.code_challenge().map(|c| c.len()), Some(43));
    assert_eq!(sdk.scopes(), vec!["profile", "phone"]);
    assert!(handle.state().is_loading());

    // When the Truecaller app returns with the same state
    assert!(provider.on_activity_result(REQUEST_CODE, success(state, "abc123")));

    // Then the UI sees the authorization code
    assert_eq!(
        settle(&handle).await,
        AuthState::Success {
            authorization_credential: "abc123".to_string()
        }
    );

    // And a reset brings the screen back to Initial
    handle.reset_to_initial().await.unwrap();
    handle
        .wait_for(|s| *s == AuthState::Initial)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_native_login_rejects_foreign_state() {
    let sdk = FakeSdk::default();
    let provider = native_provider(&sdk);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    handle.start_login().await.unwrap();
    sdk.wait_for_handoff(1).await;

    // A result echoing some other state must not be accepted
    assert!(provider.on_activity_result(
        REQUEST_CODE,
        success("forged-state".to_string(), "abc123")
    ));

    let state = settle(&handle).await;
    assert!(error_message(&state).contains("mismatch"));
}

#[tokio::test]
async fn test_native_login_not_ready_without_truecaller_app() {
    // Given a device without the Truecaller app
    let sdk = FakeSdk::default();
    sdk.set_usable(false);
    let provider = native_provider(&sdk);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    // When the user taps login
    handle.start_login().await.unwrap();

    // Then the attempt fails before the SDK sees a state
    assert_eq!(
        settle(&handle).await,
        AuthState::from(AuthError::ProviderNotReady)
    );
    assert_eq!(sdk.state(), None);
}

#[tokio::test]
async fn test_native_login_without_sdk_instance() {
    let provider: Arc<NativeSdkProvider<FakeSdk>> =
        Arc::new(NativeSdkProvider::with_request_code(None, REQUEST_CODE));
    assert!(provider.init().await.is_err());

    let handle = AuthCoordinator::new(provider).spawn();
    handle.start_login().await.unwrap();

    assert_eq!(
        settle(&handle).await,
        AuthState::from(AuthError::ProviderNotReady)
    );
}

#[tokio::test]
async fn test_native_test_mode_restriction() {
    let sdk = FakeSdk::default();
    let provider = native_provider(&sdk);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    handle.start_login().await.unwrap();
    sdk.wait_for_handoff(1).await;
    provider.on_activity_result(
        REQUEST_CODE,
        SdkOutcome::Failure {
            code: TEST_MODE_RESTRICTED_CODE,
            message: "Phone number not allowed".to_string(),
        },
    );

    let state = settle(&handle).await;
    assert_eq!(
        error_message(&state),
        "Test mode error: Phone number not allowed in test mode"
    );
}

#[tokio::test]
async fn test_native_generic_failure_and_verification() {
    let sdk = FakeSdk::default();
    let provider = native_provider(&sdk);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    // Generic SDK failure
    handle.start_login().await.unwrap();
    sdk.wait_for_handoff(1).await;
    provider.on_activity_result(
        REQUEST_CODE,
        SdkOutcome::Failure {
            code: 2,
            message: "Network error".to_string(),
        },
    );
    assert_eq!(error_message(&settle(&handle).await), "Login failed: Network error");

    // Second attempt after reset: the user needs OTP verification
    handle.reset_to_initial().await.unwrap();
    handle.wait_for(|s| *s == AuthState::Initial).await.unwrap();
    handle.start_login().await.unwrap();
    handle.wait_for(AuthState::is_loading).await.unwrap();
    sdk.wait_for_handoff(2).await;
    provider.on_activity_result(
        REQUEST_CODE,
        SdkOutcome::VerificationRequired {
            message: Some("not a Truecaller user".to_string()),
        },
    );
    assert_eq!(
        error_message(&settle(&handle).await),
        "verification required: not a Truecaller user"
    );
}

#[tokio::test]
async fn test_native_ignores_other_request_codes() {
    let sdk = FakeSdk::default();
    let provider = native_provider(&sdk);
    let handle = AuthCoordinator::new(provider.clone()).spawn();

    handle.start_login().await.unwrap();
    let state = sdk.wait_for_handoff(1).await;

    // Another activity's result is not consumed and the attempt keeps waiting
    assert!(!provider.on_activity_result(REQUEST_CODE + 1, success(state.clone(), "x")));
    assert!(handle.state().is_loading());

    assert!(provider.on_activity_result(REQUEST_CODE, success(state, "abc123")));
    assert!(matches!(settle(&handle).await, AuthState::Success { .. }));
}

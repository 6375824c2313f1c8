//! Test utilities shared by the unit tests in this crate
//!
//! `FakeProvider` stands in for the Truecaller integrations: it records every
//! authorization request and keeps the reply slots so a test can answer (or
//! abandon) an attempt at any point.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::Notify;

use crate::provider::{
    AuthProvider, AuthorizationRequest, ProviderError, ProviderKind, ProviderResult,
    ResultSender, WebLoginSettings,
};

/// Loads `.env_test` (falling back to `.env`) once per test binary.
pub(crate) fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }
    });
}

pub(crate) fn sample_web_settings() -> WebLoginSettings {
    WebLoginSettings {
        partner_key: "pk-test".to_string(),
        partner_name: "Flattr".to_string(),
        lang: "en".to_string(),
        privacy_url: "https://flattr.io/privacy".to_string(),
        terms_url: "https://flattr.io/tnc".to_string(),
        callback_url: "https://flattr.io/auth/true-sdk".to_string(),
        custom_domain: "https://flattr.io".to_string(),
        login_hint: String::new(),
        consent_title: "Login with Truecaller".to_string(),
        cta_text: "continue".to_string(),
        button_color: "#4285F4".to_string(),
        button_text_color: "#FFFFFF".to_string(),
    }
}

pub(crate) struct FakeProvider {
    kind: ProviderKind,
    ready: AtomicBool,
    fail_trigger: AtomicBool,
    requests: Mutex<Vec<AuthorizationRequest>>,
    replies: Mutex<Vec<ResultSender>>,
    requested: Notify,
}

impl FakeProvider {
    fn new(kind: ProviderKind) -> Arc<Self> {
        init_test_environment();
        Arc::new(Self {
            kind,
            ready: AtomicBool::new(true),
            fail_trigger: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            requested: Notify::new(),
        })
    }

    pub(crate) fn native() -> Arc<Self> {
        Self::new(ProviderKind::NativeSdk)
    }

    pub(crate) fn web() -> Arc<Self> {
        Self::new(ProviderKind::ScriptBridge)
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub(crate) fn set_fail_trigger(&self, fail: bool) {
        self.fail_trigger.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> Option<AuthorizationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub(crate) async fn wait_for_request(&self) -> AuthorizationRequest {
        loop {
            if let Some(request) = self.last_request() {
                return request;
            }
            self.requested.notified().await;
        }
    }

    /// Answers the most recent attempt; false if nobody is listening anymore.
    pub(crate) fn reply(&self, result: ProviderResult) -> bool {
        match self.replies.lock().unwrap().pop() {
            Some(reply) => reply.complete(result),
            None => false,
        }
    }

    pub(crate) fn drop_replies(&self) {
        self.replies.lock().unwrap().clear();
    }
}

#[async_trait]
impl AuthProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn request_authorization(
        &self,
        request: AuthorizationRequest,
        reply: ResultSender,
    ) -> Result<(), ProviderError> {
        if self.fail_trigger.load(Ordering::SeqCst) {
            return Err(ProviderError::Trigger("trigger threw".to_string()));
        }
        self.requests.lock().unwrap().push(request);
        self.replies.lock().unwrap().push(reply);
        self.requested.notify_one();
        Ok(())
    }
}

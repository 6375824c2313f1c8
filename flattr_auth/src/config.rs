//! Central configuration for the flattr_auth crate

use std::sync::LazyLock;

const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 120;
/// One day; longer attempts are treated as misconfiguration.
const MAX_LOGIN_TIMEOUT_SECS: u64 = 86_400;

/// How long a login attempt may stay in `Loading` before it is abandoned.
///
/// The provider callback never arrives if the user kills the external app,
/// so every attempt gets a deadline.
/// Default: 120 seconds
pub static FLATTR_LOGIN_TIMEOUT_SECS: LazyLock<u64> = LazyLock::new(|| {
    parse_login_timeout(std::env::var("FLATTR_LOGIN_TIMEOUT_SECS").ok().as_deref())
});

fn parse_login_timeout(value: Option<&str>) -> u64 {
    match value.map(str::trim) {
        None | Some("") => DEFAULT_LOGIN_TIMEOUT_SECS,
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) => {
                tracing::warn!("FLATTR_LOGIN_TIMEOUT_SECS must be positive, using default");
                DEFAULT_LOGIN_TIMEOUT_SECS
            }
            Ok(secs) if secs > MAX_LOGIN_TIMEOUT_SECS => {
                tracing::warn!(
                    "FLATTR_LOGIN_TIMEOUT_SECS {} exceeds {}, using default",
                    secs,
                    MAX_LOGIN_TIMEOUT_SECS
                );
                DEFAULT_LOGIN_TIMEOUT_SECS
            }
            Ok(secs) => secs,
            Err(e) => {
                tracing::warn!("Invalid FLATTR_LOGIN_TIMEOUT_SECS {:?}: {}", raw, e);
                DEFAULT_LOGIN_TIMEOUT_SECS
            }
        },
    }
}

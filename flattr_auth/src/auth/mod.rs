mod errors;
mod main;
mod types;

pub use errors::{AuthError, TEST_MODE_RESTRICTED_CODE};
pub use main::{AuthCoordinator, AuthHandle, PkceChallenge};
pub use types::AuthState;

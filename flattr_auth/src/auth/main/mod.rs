mod coordinator;
mod pkce;
mod runner;

pub use coordinator::AuthCoordinator;
pub use pkce::PkceChallenge;
pub use runner::AuthHandle;

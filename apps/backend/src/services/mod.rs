pub mod reaper;
pub mod rounds;
pub mod session_locks;
pub mod sessions;

pub use reaper::ExpiryReaper;
pub use rounds::{RevealOutcome, RoundCoordinator, SubmittedCaption};
pub use session_locks::SessionLocks;
pub use sessions::{PlayerCredentials, SessionRegistry, SessionState};

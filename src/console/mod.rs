//! Connection arbitration and state machine for the remote game
//! server console: single-flight session access, status refresh,
//! cooldown-gated mode/map changes and restart orchestration.

pub mod arbiter;
pub mod cooldown;
pub mod error;
pub mod protocol;
pub mod resolver;
pub mod restart;
pub mod status;
pub mod transport;

pub use arbiter::SessionArbiter;
pub use error::{ConsoleError, ConsoleResult};
pub use restart::{RecoveryPolicy, RestartOrchestrator};
pub use status::{ServerStatus, SharedStatus};

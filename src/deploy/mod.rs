// ABOUTME: Deployment lifecycle: state machine, phases, and the orchestrator.
// ABOUTME: Exports the runtime-checked state machine and the retrying driver.

mod audit;
mod cancel;
mod driver;
mod error;
mod executor;
mod machine;
mod phase;
mod shared;
mod state;

pub use audit::{AuditLog, AuditRecord};
pub use cancel::{CancelHandle, CancelToken, cancellation};
pub use driver::{CANCELLED_CONTEXT, DeploymentReport, Orchestrator};
pub use error::{DriverError, DriverErrorKind};
pub use executor::{PhaseExecutor, PhaseFailure, PhaseReport};
pub use machine::{HistoryEntry, StateMachine};
pub use phase::Phase;
pub use shared::{SharedStateMachine, Snapshot};
pub use state::{DeploymentState, ParseStateError};

//! Workflow coordination on top of the BPA boundary.
//!
//! - [`service`]: guarded "initiate-or-skip" start and pass-through perform.
//! - [`events`]: lifecycle events raised around each transition attempt.
//! - [`listener`]: dispatch of those events to business hooks.
//! - [`bus`]: bounded queue + worker pool delivering events off the request path.

pub mod bus;
pub mod error;
pub mod events;
pub mod keys;
pub mod listener;
pub mod service;

pub use bus::{EventReceiver, EventWorker, WorkflowEventBus};
pub use error::{EventError, WorkflowError};
pub use events::{EventPhase, KnownAction, WorkflowActionEvent};
pub use keys::ActivityKey;
pub use listener::{
    BeforeVerdict, DispatchOutcome, NoopHooks, WorkflowActionHooks, WorkflowEventDispatcher,
};
pub use service::{TaskProbe, WorkflowService, PROCESS_START_ACTION};

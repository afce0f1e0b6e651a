//! bpa-starter: thin integration layer over an external business-process-automation
//! (BPA) engine.
//!
//! - [`bpa`]: the boundary to the engine (`BpaClient` trait, HTTP and in-process
//!   clients, the event-publishing decorator).
//! - [`workflow`]: the start coordinator, lifecycle event dispatch and the event bus.
//! - [`api`]: the axum router exposing `POST /v1/workflow/perform`.
//! - [`config`]: service configuration (YAML + environment).
//! - [`feature`]: sample business service that kicks off an approval workflow.

pub mod bpa;
pub mod config;
pub mod feature;
pub mod workflow;

#[cfg(feature = "server")]
pub mod api;

pub use bpa::{AuthToken, BpaClient, BpaError};
pub use config::ServiceConfig;
pub use workflow::{WorkflowError, WorkflowService};

//! Boundary to the external BPA engine.
//!
//! Everything past [`BpaClient`] (state machine, persistence, retries) is owned
//! by the engine. This module only describes the two calls the starter makes and
//! the DTOs that cross the wire.

pub mod client;
pub mod error;
pub mod http;
pub mod in_process;
pub mod publishing;
pub mod types;

pub use client::{AuthToken, BpaClient};
pub use error::BpaError;
pub use http::HttpBpaClient;
pub use in_process::InProcessBpaClient;
pub use publishing::EventPublishingClient;
pub use types::{Action, TaskAction, TaskPerformRequest, TaskPerformResponse, WorkflowRequest};

//! Task chaining core
//!
//! This module contains:
//! - The task contract and the registry tasks are looked up from
//! - The chainer compiling tasks into pipelines
//! - The broker running pipelines on a worker pool and its result backends
//! - Handles used to poll submissions

pub mod backend;
mod broker;
mod chain;
mod handle;
mod registry;
mod task;
mod task_state;

pub use backend::{InMemoryBackend, ResultBackend, SubmissionRecord};
pub use broker::*;
pub use chain::*;
pub use registry::*;
pub use task::*;
pub use task_state::*;

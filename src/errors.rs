use crate::core::{TaskFailure, TaskStatus};
use diesel::result::Error as DieselError;
use std::time::Duration;

/// Storage layer errors raised by the result backends
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Diesel error: {0}")]
    DieselError(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    PoolError(#[from] diesel::r2d2::PoolError),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Corrupt submission record: {0}")]
    CorruptRecord(String),
    #[error("Blocking storage call failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

/// Misuse of the task registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("task '{0}' is already registered")]
    DuplicateName(String),
    #[error("unknown task '{0}'")]
    UnknownTask(String),
    #[error("invalid input schema for task '{name}': {reason}")]
    InvalidSchema { name: String, reason: String },
}

/// Misuse of a task chainer. Both variants are programmer errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("cannot compile an empty chain")]
    EmptyChain,
    #[error("illegal chain state: {0}")]
    IllegalState(&'static str),
}

/// Errors returned when querying a submission
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    #[error("result not ready, submission is {0}")]
    NotReady(TaskStatus),
    #[error("{0}")]
    TaskFailed(TaskFailure),
    #[error("unknown submission '{0}'")]
    UnknownSubmission(String),
    #[error("timed out after {0:?} waiting for result")]
    TimedOut(Duration),
    #[error("result backend error: {0}")]
    Backend(#[from] Error),
}

/// Errors returned when handing a pipeline to the broker
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker queue is closed")]
    QueueClosed,
    #[error("result backend error: {0}")]
    Backend(#[from] Error),
}

/// Login and bearer token failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Could not validate credentials")]
    InvalidToken,
    #[error("Inactive user")]
    InactiveUser,
    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

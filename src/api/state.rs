use crate::auth::TokenProvider;
use crate::core::{Broker, TaskRegistry};
use std::sync::Arc;

/// Shared handles every request needs
#[derive(Debug, Clone)]
pub struct AppState {
    /// Frozen task catalog
    pub registry: Arc<TaskRegistry>,
    /// Queue the chains are submitted to
    pub broker: Broker,
    /// Login and bearer token checks
    pub tokens: TokenProvider,
}

use crate::traits::{Environment, RealEnvironment};
use crate::vault::{Connector, HttpConnector};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub env: Arc<dyn Environment>,
    pub connector: Arc<dyn Connector>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            env: Arc::new(RealEnvironment),
            connector: Arc::new(HttpConnector),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(env: Arc<dyn Environment>, connector: Arc<dyn Connector>) -> Self {
        Self { env, connector }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            env: Arc::clone(&self.env),
            connector: Arc::clone(&self.connector),
        }
    }
}

#[cfg(test)]
use std::collections::HashMap;

/// Trait for reading process environment variables, allowing for mocking in tests
pub trait Environment: Send + Sync {
    /// Look up a variable. Unset and non-unicode values both read as `None`.
    fn var(&self, key: &str) -> Option<String>;
}

/// Real environment backed by `std::env`
pub struct RealEnvironment;

impl Environment for RealEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock environment for testing
#[cfg(test)]
#[derive(Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

#[cfg(test)]
impl MockEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl Environment for MockEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

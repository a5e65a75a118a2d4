use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operation-specific result fields (`status`, `rules`, `policies`, `value`)
pub type Fields = Map<String, Value>;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Fixed-shape outcome every command returns.
///
/// `rc` is 0 on success and 1 on failure; a failure always carries `failed`
/// and `msg`. Operation-specific fields are flattened into the top level when
/// serialized, so the JSON looks like `{"changed": false, "rc": 0, "value": "1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub changed: bool,
    pub rc: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Failed outcome as seen through [`CommandResult::into_outcome`]
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    pub message: String,
    pub diagnostic: Option<String>,
    pub changed: bool,
}

impl CommandResult {
    pub fn new() -> Self {
        Self {
            changed: false,
            rc: 0,
            failed: false,
            msg: None,
            stack_trace: None,
            fields: Fields::new(),
        }
    }

    /// Set an operation-specific field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    #[allow(dead_code)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.msg = Some(message.into());
    }

    /// Mark the result failed. `changed` and any fields already set are kept.
    pub fn fail(&mut self, message: impl Into<String>, diagnostic: impl Into<String>) {
        self.rc = 1;
        self.failed = true;
        self.msg = Some(message.into());
        self.stack_trace = Some(diagnostic.into());
    }

    pub fn is_success(&self) -> bool {
        self.rc == 0 && !self.failed
    }

    /// Typed view for callers that branch in Rust rather than on `rc`
    #[allow(dead_code)]
    pub fn into_outcome(self) -> std::result::Result<Fields, CommandFailure> {
        if self.is_success() {
            return Ok(self.fields);
        }

        Err(CommandFailure {
            message: self.msg.unwrap_or_default(),
            diagnostic: self.stack_trace,
            changed: self.changed,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for CommandResult {
    fn default() -> Self {
        Self::new()
    }
}

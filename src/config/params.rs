//! Parameter mapping handed to every command.
//!
//! Values arrive from the command line, from an args file written by an
//! automation host, or both. A key holding JSON `null` is treated as absent.

use crate::vault::VaultError;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// String-keyed parameter mapping with typed accessors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an args file. JSON is tried first, then YAML.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(_) => serde_yaml::from_str(content).context("Args file is neither JSON nor YAML")?,
        };

        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::new()),
            other => anyhow::bail!("Args file must contain a mapping, found {}", type_name(&other)),
        }
    }

    /// Load parameters from a JSON or YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read args file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid args file: {}", path.display()))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style `set`
    #[allow(dead_code)]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Overlay `other` on top of this mapping; its keys win
    pub fn merge(&mut self, other: Params) {
        self.values.extend(other.values);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String view of a scalar parameter. Numbers and booleans are stringified.
    pub fn str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Boolean view of a parameter. Unparseable values read as `None`.
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    /// Fail with every missing name listed when any of `keys` is absent
    pub fn check_required(&self, keys: &[&str]) -> Result<(), VaultError> {
        let missing: Vec<&str> = keys.iter().copied().filter(|k| !self.contains(k)).collect();
        if missing.is_empty() {
            return Ok(());
        }

        Err(VaultError::Configuration(format!(
            "missing required arguments: {}",
            missing.join(", ")
        )))
    }

    pub fn require_str(&self, key: &str) -> Result<String, VaultError> {
        self.check_required(&[key])?;
        self.str(key).ok_or_else(|| {
            VaultError::Configuration(format!("argument {} is not a string", key))
        })
    }

    /// Mapping parameter. A string holding a JSON object is accepted too.
    pub fn require_map(&self, key: &str) -> Result<Map<String, Value>, VaultError> {
        self.check_required(&[key])?;
        let not_a_mapping =
            || VaultError::Configuration(format!("argument {} is not a mapping", key));

        match self.get(key) {
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err(not_a_mapping()),
            },
            _ => Err(not_a_mapping()),
        }
    }
}

/// Parse the boolean spellings automation hosts commonly emit
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "y" => Some(true),
        "false" | "no" | "off" | "0" | "n" => Some(false),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

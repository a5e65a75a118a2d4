//! Secret read/write under the fixed `secret/` mount.

use super::result::CommandResult;
use super::wrapper::execute;
use crate::config::Params;
use crate::context::Context;
use crate::vault::VaultError;
use tracing::info;

/// Mount every secret path is resolved under
pub const SECRET_PREFIX: &str = "secret/";

pub fn secret_path(secret: &str) -> String {
    format!("{}{}", SECRET_PREFIX, secret)
}

/// Refuse names that would resolve outside the path they spell
fn validate_secret(secret: &str) -> Result<(), VaultError> {
    if secret.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(VaultError::Configuration(format!(
            "Vault secret path cannot contain '.' or '..' segments: {}",
            secret
        )));
    }

    Ok(())
}

/// Handles the 'read' command - returns one field of a secret
pub struct SecretReadCommand;

impl SecretReadCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            params.check_required(&["secret", "key"])?;
            let secret = params.require_str("secret")?;
            let key = params.require_str("key")?;
            validate_secret(&secret)?;

            let client = super::connect(ctx, params)?;
            let data = client
                .read(&secret_path(&secret))?
                .ok_or_else(|| VaultError::SecretNotFound {
                    secret: secret.clone(),
                })?;
            let value = data
                .get(&key)
                .cloned()
                .ok_or(VaultError::KeyNotFound { key, secret })?;

            result.insert("value", value);
            Ok(())
        })
    }
}

/// Handles the 'write' command.
///
/// With `update` the new fields are merged over what is already stored;
/// otherwise the stored value is replaced outright.
pub struct SecretWriteCommand;

impl SecretWriteCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            params.check_required(&["secret", "data"])?;
            let secret = params.require_str("secret")?;
            let data = params.require_map("data")?;
            let update = params.bool("update").unwrap_or(false);
            validate_secret(&secret)?;

            let client = super::connect(ctx, params)?;
            let path = secret_path(&secret);

            if update {
                let mut merged = client.read(&path)?.unwrap_or_default();
                merged.extend(data);
                client.write(&path, &merged)?;
                info!(secret = %secret, fields = merged.len(), "secret updated");
                result.set_message(format!("Secret {} updated", secret));
            } else {
                client.write(&path, &data)?;
                info!(secret = %secret, fields = data.len(), "secret written");
                result.set_message(format!("Secret {} written", secret));
            }

            result.changed = true;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use crate::vault::MockVault;
    use serde_json::{Value, json};

    fn object(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_secret_path_prefix() {
        assert_eq!(secret_path("app/db"), "secret/app/db");
    }

    #[test]
    fn test_validate_secret_segments() {
        assert!(validate_secret("app/db").is_ok());
        assert!(validate_secret("app..old/db").is_ok());
        assert!(validate_secret("a/../b").is_err());
        assert!(validate_secret("./foo").is_err());
        assert!(validate_secret("..").is_err());
    }

    #[test]
    fn test_write_rejects_parent_segment_before_connecting() {
        let vault = MockVault::new().with_policy("root", "path \"*\" {}");
        let params = Params::new()
            .with("secret", "../sys/policy/root")
            .with("data", json!({ "policy": "" }));
        let result = SecretWriteCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert!(!result.changed);
        assert!(result.msg.unwrap().contains("'..'"));
        assert!(vault.opened().is_empty());
        assert!(vault.writes().is_empty());
    }

    #[test]
    fn test_read_rejects_dot_segments() {
        let vault = MockVault::new().with_secret("secret/a/b", json!({ "k": "v" }));
        let params = Params::new().with("secret", "a/../b").with("key", "k");
        let result = SecretReadCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert_eq!(result.get("value"), None);
        assert!(vault.reads().is_empty());
    }

    #[test]
    fn test_read_missing_secret() {
        let vault = MockVault::new();
        let params = Params::new().with("secret", "foo").with("key", "a");
        let result = SecretReadCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert_eq!(result.rc, 1);
        assert_eq!(result.msg.as_deref(), Some("Secret foo is not in vault"));
        assert_eq!(vault.reads(), vec!["secret/foo"]);
    }

    #[test]
    fn test_read_missing_key() {
        let vault = MockVault::new().with_secret("secret/foo", json!({ "a": "1" }));
        let params = Params::new().with("secret", "foo").with("key", "b");
        let result = SecretReadCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert_eq!(result.rc, 1);
        assert_eq!(result.msg.as_deref(), Some("Key b is not in secret foo"));
    }

    #[test]
    fn test_read_existing_key() {
        let vault = MockVault::new().with_secret("secret/foo", json!({ "a": "1" }));
        let params = Params::new().with("secret", "foo").with("key", "a");
        let result = SecretReadCommand::execute(&test_support::context(&vault), &params);

        assert!(result.is_success());
        assert!(!result.failed);
        assert!(!result.changed);
        assert_eq!(result.get("value"), Some(&json!("1")));
    }

    #[test]
    fn test_read_requires_secret_and_key() {
        let vault = MockVault::new();
        let result = SecretReadCommand::execute(&test_support::context(&vault), &Params::new());

        assert_eq!(
            result.msg.as_deref(),
            Some("missing required arguments: secret, key")
        );
        assert!(vault.opened().is_empty());
    }

    #[test]
    fn test_write_replaces_existing_value() {
        let vault = MockVault::new().with_secret("secret/foo", json!({ "z": "9" }));
        let params = Params::new()
            .with("secret", "foo")
            .with("data", json!({ "a": "1" }));
        let result = SecretWriteCommand::execute(&test_support::context(&vault), &params);

        assert!(result.is_success());
        assert!(result.changed);
        assert_eq!(result.msg.as_deref(), Some("Secret foo written"));
        assert_eq!(vault.secret("secret/foo"), Some(object(json!({ "a": "1" }))));
        assert!(vault.reads().is_empty());
    }

    #[test]
    fn test_update_merges_over_existing_value() {
        let vault = MockVault::new().with_secret("secret/foo", json!({ "z": "9", "a": "0" }));
        let params = Params::new()
            .with("secret", "foo")
            .with("data", json!({ "a": "1" }))
            .with("update", true);
        let result = SecretWriteCommand::execute(&test_support::context(&vault), &params);

        assert!(result.is_success());
        assert!(result.changed);
        assert_eq!(result.msg.as_deref(), Some("Secret foo updated"));
        assert_eq!(
            vault.secret("secret/foo"),
            Some(object(json!({ "z": "9", "a": "1" })))
        );
    }

    #[test]
    fn test_update_of_missing_secret_writes_new_fields() {
        let vault = MockVault::new();
        let params = Params::new()
            .with("secret", "fresh")
            .with("data", json!({ "a": "1" }))
            .with("update", "yes");
        let result = SecretWriteCommand::execute(&test_support::context(&vault), &params);

        assert!(result.is_success());
        assert_eq!(result.msg.as_deref(), Some("Secret fresh updated"));
        assert_eq!(vault.secret("secret/fresh"), Some(object(json!({ "a": "1" }))));
    }

    #[test]
    fn test_failed_write_leaves_changed_false() {
        let vault = MockVault::new().requiring_token("s.valid");
        let params = Params::new()
            .with("secret", "foo")
            .with("data", json!({ "a": "1" }));
        let result = SecretWriteCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert!(!result.changed);
        assert!(vault.secret("secret/foo").is_none());
    }

    #[test]
    fn test_write_rejects_non_mapping_data() {
        let vault = MockVault::new();
        let params = Params::new().with("secret", "foo").with("data", "not json");
        let result = SecretWriteCommand::execute(&test_support::context(&vault), &params);

        assert_eq!(result.msg.as_deref(), Some("argument data is not a mapping"));
        assert!(vault.writes().is_empty());
    }
}

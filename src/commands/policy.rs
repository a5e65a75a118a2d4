use super::result::CommandResult;
use super::wrapper::execute;
use crate::config::Params;
use crate::context::Context;
use tracing::info;

/// Handles the 'policy-get' command - returns the rule text of one policy
pub struct PolicyGetCommand;

impl PolicyGetCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            let name = params.require_str("name")?;
            let client = super::connect(ctx, params)?;
            result.insert("rules", client.get_policy(&name)?);
            Ok(())
        })
    }
}

/// Handles the 'policy-list' command
pub struct PolicyListCommand;

impl PolicyListCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            let client = super::connect(ctx, params)?;
            result.insert("policies", client.list_policies()?);
            Ok(())
        })
    }
}

/// Handles the 'policy-set' command.
///
/// Reports a change on every run and does not read the policy back.
pub struct PolicySetCommand;

impl PolicySetCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            params.check_required(&["name", "rules"])?;
            let name = params.require_str("name")?;
            let rules = params.require_str("rules")?;

            let client = super::connect(ctx, params)?;
            client.set_policy(&name, &rules)?;
            info!(policy = %name, "policy written");
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
    use serde_json::json;

    const APP_RULES: &str = "path \"secret/app/*\" {\n  capabilities = [\"read\"]\n}\n";

    #[test]
    fn test_policy_get_returns_rules() {
        let vault = MockVault::new().with_policy("app", APP_RULES);
        let params = Params::new().with("name", "app");
        let result = PolicyGetCommand::execute(&test_support::context(&vault), &params);

        assert!(result.is_success());
        assert!(!result.changed);
        assert_eq!(result.get("rules"), Some(&json!(APP_RULES)));
    }

    #[test]
    fn test_policy_get_missing_policy_fails_with_remote_message() {
        let vault = MockVault::new();
        let params = Params::new().with("name", "ghost");
        let result = PolicyGetCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert_eq!(result.rc, 1);
        assert_eq!(result.msg.as_deref(), Some("policy 'ghost' not found"));
    }

    #[test]
    fn test_policy_list() {
        let vault = MockVault::new()
            .with_policy("root", "path \"*\" {}")
            .with_policy("default", "")
            .with_policy("app", APP_RULES);
        let result = PolicyListCommand::execute(&test_support::context(&vault), &Params::new());

        assert!(result.is_success());
        assert_eq!(
            result.get("policies"),
            Some(&json!(["app", "default", "root"]))
        );
    }

    #[test]
    fn test_policy_set_always_changed() {
        let vault = MockVault::new().with_policy("app", APP_RULES);
        let params = Params::new().with("name", "app").with("rules", APP_RULES);
        let result = PolicySetCommand::execute(&test_support::context(&vault), &params);

        assert!(result.is_success());
        assert!(result.changed);
        assert_eq!(vault.policy("app").as_deref(), Some(APP_RULES));
        assert!(vault.policy_reads().is_empty());
    }

    #[test]
    fn test_policy_set_requires_name_and_rules() {
        let vault = MockVault::new();
        let result = PolicySetCommand::execute(&test_support::context(&vault), &Params::new());

        assert_eq!(
            result.msg.as_deref(),
            Some("missing required arguments: name, rules")
        );
        assert!(!result.changed);
    }

    #[test]
    fn test_bad_token_discovered_on_first_operation() {
        let vault = MockVault::new().requiring_token("s.valid");
        let params = Params::new().with("token", "s.expired");
        let result = PolicyListCommand::execute(&test_support::context(&vault), &params);

        assert!(result.failed);
        assert_eq!(result.msg.as_deref(), Some("permission denied: invalid token"));
        assert_eq!(vault.opened().len(), 1);
    }
}

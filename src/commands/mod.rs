pub mod policy;
pub mod result;
pub mod secret;
pub mod status;
pub mod wrapper;

pub use policy::{PolicyGetCommand, PolicyListCommand, PolicySetCommand};
pub use result::CommandResult;
pub use secret::{SecretReadCommand, SecretWriteCommand};
pub use status::{SealCommand, StatusCommand, UnsealCommand};

use crate::config::{ConfigResolver, Params};
use crate::context::Context;
use crate::vault::{ClientFactory, VaultApi, VaultError};

/// Every operation the CLI can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultCommand {
    Status,
    Seal,
    Unseal,
    PolicyGet,
    PolicyList,
    PolicySet,
    SecretRead,
    SecretWrite,
}

impl VaultCommand {
    pub fn name(&self) -> &'static str {
        match self {
            VaultCommand::Status => "status",
            VaultCommand::Seal => "seal",
            VaultCommand::Unseal => "unseal",
            VaultCommand::PolicyGet => "policy-get",
            VaultCommand::PolicyList => "policy-list",
            VaultCommand::PolicySet => "policy-set",
            VaultCommand::SecretRead => "read",
            VaultCommand::SecretWrite => "write",
        }
    }

    /// Run the command. Never fails; check `rc` on the result.
    pub fn run(&self, ctx: &Context, params: &Params) -> CommandResult {
        let _span = tracing::debug_span!("command", name = self.name()).entered();

        match self {
            VaultCommand::Status => StatusCommand::execute(ctx, params),
            VaultCommand::Seal => SealCommand::execute(ctx, params),
            VaultCommand::Unseal => UnsealCommand::execute(ctx, params),
            VaultCommand::PolicyGet => PolicyGetCommand::execute(ctx, params),
            VaultCommand::PolicyList => PolicyListCommand::execute(ctx, params),
            VaultCommand::PolicySet => PolicySetCommand::execute(ctx, params),
            VaultCommand::SecretRead => SecretReadCommand::execute(ctx, params),
            VaultCommand::SecretWrite => SecretWriteCommand::execute(ctx, params),
        }
    }
}

/// Resolve the connection settings for `params` and open an authenticated session
fn connect(ctx: &Context, params: &Params) -> Result<Box<dyn VaultApi>, VaultError> {
    let config = ConfigResolver::new(ctx.env.as_ref()).resolve(params);
    ClientFactory::new(ctx.connector.as_ref()).connect(&config)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MockVault;

    #[test]
    fn test_run_dispatches_by_command() {
        let vault = MockVault::new().with_policy("root", "path \"*\" {}");
        let ctx = test_support::context(&vault);

        let result = VaultCommand::PolicyList.run(&ctx, &Params::new());
        assert!(result.is_success());
        assert_eq!(result.get("policies"), Some(&serde_json::json!(["root"])));
    }

    #[test]
    fn test_connect_uses_environment_defaults() {
        let vault = MockVault::new();
        let ctx = test_support::context(&vault);

        connect(&ctx, &Params::new()).unwrap();
        assert_eq!(
            vault.opened(),
            vec![("https://vault.test:8200".to_string(), true)]
        );
        assert_eq!(vault.token().as_deref(), Some("s.root"));
    }

    #[test]
    fn test_command_names_match_cli() {
        assert_eq!(VaultCommand::PolicyGet.name(), "policy-get");
        assert_eq!(VaultCommand::SecretWrite.name(), "write");
    }
}

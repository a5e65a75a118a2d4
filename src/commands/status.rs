use super::result::CommandResult;
use super::wrapper::execute;
use crate::config::Params;
use crate::context::Context;
use tracing::info;

/// Handles the 'status' command - reports the seal status
pub struct StatusCommand;

impl StatusCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            let client = super::connect(ctx, params)?;
            result.insert("status", client.seal_status()?);
            Ok(())
        })
    }
}

/// Handles the 'seal' command.
///
/// Always reports a change, even when the server was already sealed. The
/// change is recorded as soon as the seal request succeeds, so a failing
/// status read afterwards still reports `changed`.
pub struct SealCommand;

impl SealCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            let client = super::connect(ctx, params)?;
            client.seal()?;
            result.changed = true;
            info!("vault sealed");

            result.insert("status", client.seal_status()?);
            Ok(())
        })
    }
}

/// Handles the 'unseal' command - submits whitespace-separated key shares
pub struct UnsealCommand;

impl UnsealCommand {
    pub fn execute(ctx: &Context, params: &Params) -> CommandResult {
        execute(|result| {
            let keys = params.require_str("keys")?;
            let shares: Vec<String> = keys.split_whitespace().map(str::to_string).collect();

            let client = super::connect(ctx, params)?;
            let status = client.unseal_multi(&shares)?;
            info!(shares = shares.len(), "unseal shares submitted");
            result.insert("status", status);
            result.changed = true;
            Ok(())
        })
    }
}

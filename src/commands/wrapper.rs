//! Failure boundary shared by every command.

use super::result::CommandResult;
use anyhow::Result;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Run a command body and always hand back a well-formed [`CommandResult`].
///
/// The body starts from `changed = false, rc = 0` and mutates the result as it
/// goes. An error or a panic is never propagated: it becomes `rc = 1`,
/// `failed = true`, a one-line `msg` and anyhow's `{:?}` rendering in
/// `stack_trace`. A panic has unwound by the time it is caught, so its
/// `stack_trace` carries only the payload.
/// Whatever the body set before failing (usually nothing) is kept.
pub fn execute<F>(body: F) -> CommandResult
where
    F: FnOnce(&mut CommandResult) -> Result<()>,
{
    let mut result = CommandResult::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut result)));

    match outcome {
        Ok(Ok(())) => {
            result.rc = 0;
            result.failed = false;
        }
        Ok(Err(err)) => {
            warn!(error = %err, "command failed");
            result.fail(err.to_string(), format!("{:?}", err));
        }
        Err(payload) => {
            let message = format!("panic: {}", panic_message(payload.as_ref()));
            warn!(error = %message, "command panicked");
            result.fail(message.clone(), message);
        }
    }

    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

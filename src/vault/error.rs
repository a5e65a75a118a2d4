/// Failures raised while talking to Vault or preparing a command.
///
/// Commands never surface these directly; the command wrapper turns each one
/// into a failed `CommandResult` using the `Display` text as its message.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Missing or malformed command parameters
    #[error("{0}")]
    Configuration(String),

    #[error("Vault authentication failed: {0}")]
    Authentication(String),

    /// Unreachable server, bad address or TLS failure
    #[error("error communicating with Vault: {0}")]
    Connection(String),

    #[error("Secret {secret} is not in vault")]
    SecretNotFound { secret: String },

    #[error("Key {key} is not in secret {secret}")]
    KeyNotFound { key: String, secret: String },

    /// Any other 404, with Vault's own message passed through
    #[error("{0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("Vault returned status {status}: {message}")]
    Remote { status: u16, message: String },
}

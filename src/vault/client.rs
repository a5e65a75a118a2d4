use super::api::{Connector, VaultApi};
use super::error::VaultError;
use crate::config::{AuthType, Configuration};
use tracing::debug;

/// Produces authenticated Vault sessions from a resolved [`Configuration`]
pub struct ClientFactory<'a> {
    connector: &'a dyn Connector,
}

impl<'a> ClientFactory<'a> {
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self { connector }
    }

    /// Open a session and authenticate it.
    ///
    /// Token auth never contacts the server here, so a bad token only shows up
    /// on the first real operation. Missing usernames or passwords are sent as
    /// empty strings and left for the server to reject.
    pub fn connect(&self, config: &Configuration) -> Result<Box<dyn VaultApi>, VaultError> {
        debug!(
            url = %config.url,
            verify = config.verify,
            auth = %config.auth_type,
            "connecting to Vault"
        );

        let mut client = self.connector.open(&config.url, config.verify)?;
        let username = config.username.as_deref().unwrap_or_default();
        let password = config.password.as_deref().unwrap_or_default();

        match config.auth_type {
            AuthType::Github => client.auth_github(&config.token)?,
            AuthType::Userpass => client.auth_userpass(username, password)?,
            AuthType::Ldap => client.auth_ldap(username, password)?,
            AuthType::Token => client.set_token(&config.token),
        }

        Ok(client)
    }
}

use super::params::Params;
use crate::traits::Environment;
use std::fmt;

/// Vault address used when no `url` parameter is given
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";

/// Any non-empty value turns TLS verification off by default
pub const VAULT_SKIP_VERIFY_ENV: &str = "VAULT_SKIP_VERIFY";

/// Token used when no `token` parameter is given
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

/// Authentication backend used to obtain a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    #[default]
    Token,
    Github,
    Userpass,
    Ldap,
}

impl AuthType {
    /// Unknown names fall back to `Token`, which uses the token as-is.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "github" => AuthType::Github,
            "userpass" => AuthType::Userpass,
            "ldap" => AuthType::Ldap,
            _ => AuthType::Token,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Token => "token",
            AuthType::Github => "github",
            AuthType::Userpass => "userpass",
            AuthType::Ldap => "ldap",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection and authentication settings for one command invocation
#[derive(Clone, PartialEq)]
pub struct Configuration {
    pub url: String,
    pub verify: bool,
    pub auth_type: AuthType,
    pub token: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |present: bool| if present { "[REDACTED]" } else { "" };
        f.debug_struct("Configuration")
            .field("url", &self.url)
            .field("verify", &self.verify)
            .field("auth_type", &self.auth_type)
            .field("token", &redact(!self.token.is_empty()))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Builds a [`Configuration`] from parameters, falling back to the environment.
///
/// Precedence per field is explicit parameter, then environment variable, then
/// a hardcoded default. Nothing is validated here: an incomplete credential set
/// is left for the Vault server to reject at login.
pub struct ConfigResolver<'a> {
    env: &'a dyn Environment,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    pub fn resolve(&self, params: &Params) -> Configuration {
        let url = params
            .str("url")
            .or_else(|| self.env.var(VAULT_ADDR_ENV))
            .unwrap_or_default();

        let skip_verify = self
            .env
            .var(VAULT_SKIP_VERIFY_ENV)
            .is_some_and(|v| !v.is_empty());
        let verify = params.bool("verify").unwrap_or(!skip_verify);

        let auth_type = params
            .str("authtype")
            .map(|name| AuthType::parse(&name))
            .unwrap_or_default();

        let token = params
            .str("token")
            .or_else(|| self.env.var(VAULT_TOKEN_ENV))
            .unwrap_or_default();

        Configuration {
            url,
            verify,
            auth_type,
            token,
            username: params.str("username"),
            password: params.str("password"),
        }
    }
}

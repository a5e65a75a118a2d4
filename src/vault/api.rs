//! Capability traits for the remote Vault service.

use super::error::VaultError;
use serde_json::{Map, Value};

#[cfg(test)]
use serde_json::json;
#[cfg(test)]
use std::collections::{BTreeMap, HashMap};
#[cfg(test)]
use std::sync::{Arc, RwLock};

/// Field-mapping stored at a secret path
pub type SecretData = Map<String, Value>;

/// Operations a command can issue against Vault.
///
/// One implementation speaks HTTP to a real server; tests use an in-memory fake.
pub trait VaultApi {
    /// Log in through the github backend with a personal access token
    fn auth_github(&mut self, token: &str) -> Result<(), VaultError>;

    fn auth_userpass(&mut self, username: &str, password: &str) -> Result<(), VaultError>;

    fn auth_ldap(&mut self, username: &str, password: &str) -> Result<(), VaultError>;

    /// Use `token` as the session credential without contacting the server
    fn set_token(&mut self, token: &str);

    /// Read the field-mapping at `path`. `None` when nothing is stored there.
    fn read(&self, path: &str) -> Result<Option<SecretData>, VaultError>;

    /// Replace whatever is stored at `path` with `data`
    fn write(&self, path: &str, data: &SecretData) -> Result<(), VaultError>;

    fn seal_status(&self) -> Result<Value, VaultError>;

    /// Seal the server. The seal endpoint returns no body; read
    /// [`VaultApi::seal_status`] afterwards for the resulting state.
    fn seal(&self) -> Result<(), VaultError>;

    /// Submit each share in order and report the last seal status
    fn unseal_multi(&self, keys: &[String]) -> Result<Value, VaultError>;

    fn get_policy(&self, name: &str) -> Result<String, VaultError>;

    fn list_policies(&self) -> Result<Vec<String>, VaultError>;

    fn set_policy(&self, name: &str, rules: &str) -> Result<(), VaultError>;
}

/// Opens unauthenticated sessions against a Vault address
pub trait Connector: Send + Sync {
    fn open(&self, url: &str, verify: bool) -> Result<Box<dyn VaultApi>, VaultError>;
}

/// Login recorded by [`MockVault`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum AuthCall {
    Github(String),
    Userpass(String, String),
    Ldap(String, String),
}

#[cfg(test)]
#[derive(Debug, Default)]
struct MockVaultState {
    secrets: HashMap<String, SecretData>,
    policies: BTreeMap<String, String>,
    sealed: bool,
    token: Option<String>,
    required_token: Option<String>,
    reject_logins: bool,
    unreachable: bool,
    failing_status: bool,
    opened: Vec<(String, bool)>,
    auth_calls: Vec<AuthCall>,
    unseal_calls: Vec<Vec<String>>,
    reads: Vec<String>,
    writes: Vec<String>,
    policy_reads: Vec<String>,
}

/// In-memory Vault for testing.
///
/// Clones share state, so a test keeps one handle for assertions while the
/// command under test talks to another through [`Connector::open`].
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockVault {
    state: Arc<RwLock<MockVaultState>>,
}

#[cfg(test)]
#[allow(dead_code)]
impl MockVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` (a JSON object) at `path`
    pub fn with_secret(self, path: &str, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            other => panic!("mock secret must be a JSON object, got {other}"),
        };
        self.state.write().unwrap().secrets.insert(path.to_string(), data);
        self
    }

    pub fn with_policy(self, name: &str, rules: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .policies
            .insert(name.to_string(), rules.to_string());
        self
    }

    pub fn sealed(self) -> Self {
        self.state.write().unwrap().sealed = true;
        self
    }

    /// Data operations fail with permission denied unless this token is set
    pub fn requiring_token(self, token: &str) -> Self {
        self.state.write().unwrap().required_token = Some(token.to_string());
        self
    }

    pub fn rejecting_logins(self) -> Self {
        self.state.write().unwrap().reject_logins = true;
        self
    }

    pub fn unreachable(self) -> Self {
        self.state.write().unwrap().unreachable = true;
        self
    }

    /// Seal-status reads fail with a 503 while every other call still works
    pub fn failing_status(self) -> Self {
        self.state.write().unwrap().failing_status = true;
        self
    }

    pub fn secret(&self, path: &str) -> Option<SecretData> {
        self.state.read().unwrap().secrets.get(path).cloned()
    }

    pub fn policy(&self, name: &str) -> Option<String> {
        self.state.read().unwrap().policies.get(name).cloned()
    }

    pub fn is_sealed(&self) -> bool {
        self.state.read().unwrap().sealed
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().unwrap().token.clone()
    }

    pub fn opened(&self) -> Vec<(String, bool)> {
        self.state.read().unwrap().opened.clone()
    }

    pub fn auth_calls(&self) -> Vec<AuthCall> {
        self.state.read().unwrap().auth_calls.clone()
    }

    pub fn unseal_calls(&self) -> Vec<Vec<String>> {
        self.state.read().unwrap().unseal_calls.clone()
    }

    pub fn reads(&self) -> Vec<String> {
        self.state.read().unwrap().reads.clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.state.read().unwrap().writes.clone()
    }

    /// Policy names fetched through `get_policy`, with `*` for each listing
    pub fn policy_reads(&self) -> Vec<String> {
        self.state.read().unwrap().policy_reads.clone()
    }

    fn login(&mut self, call: AuthCall) -> Result<(), VaultError> {
        let mut state = self.state.write().unwrap();
        state.auth_calls.push(call);
        if state.reject_logins {
            return Err(VaultError::Authentication("invalid credentials".to_string()));
        }
        state.token = Some("s.mock-session".to_string());
        Ok(())
    }

    fn authorize(&self) -> Result<(), VaultError> {
        let state = self.state.read().unwrap();
        match &state.required_token {
            Some(required) if state.token.as_ref() != Some(required) => {
                Err(VaultError::PermissionDenied("invalid token".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn status_json(sealed: bool) -> Value {
        json!({ "sealed": sealed, "t": 3, "n": 5, "progress": 0, "type": "shamir" })
    }
}

#[cfg(test)]
impl VaultApi for MockVault {
    fn auth_github(&mut self, token: &str) -> Result<(), VaultError> {
        self.login(AuthCall::Github(token.to_string()))
    }

    fn auth_userpass(&mut self, username: &str, password: &str) -> Result<(), VaultError> {
        self.login(AuthCall::Userpass(username.to_string(), password.to_string()))
    }

    fn auth_ldap(&mut self, username: &str, password: &str) -> Result<(), VaultError> {
        self.login(AuthCall::Ldap(username.to_string(), password.to_string()))
    }

    fn set_token(&mut self, token: &str) {
        self.state.write().unwrap().token = Some(token.to_string());
    }

    fn read(&self, path: &str) -> Result<Option<SecretData>, VaultError> {
        self.authorize()?;
        let mut state = self.state.write().unwrap();
        state.reads.push(path.to_string());
        Ok(state.secrets.get(path).cloned())
    }

    fn write(&self, path: &str, data: &SecretData) -> Result<(), VaultError> {
        self.authorize()?;
        let mut state = self.state.write().unwrap();
        state.writes.push(path.to_string());
        state.secrets.insert(path.to_string(), data.clone());
        Ok(())
    }

    fn seal_status(&self) -> Result<Value, VaultError> {
        let state = self.state.read().unwrap();
        if state.failing_status {
            return Err(VaultError::Remote {
                status: 503,
                message: "Vault is sealed".to_string(),
            });
        }
        Ok(Self::status_json(state.sealed))
    }

    fn seal(&self) -> Result<(), VaultError> {
        self.authorize()?;
        self.state.write().unwrap().sealed = true;
        Ok(())
    }

    fn unseal_multi(&self, keys: &[String]) -> Result<Value, VaultError> {
        let mut state = self.state.write().unwrap();
        state.unseal_calls.push(keys.to_vec());
        if !keys.is_empty() {
            state.sealed = false;
        }
        Ok(Self::status_json(state.sealed))
    }

    fn get_policy(&self, name: &str) -> Result<String, VaultError> {
        self.authorize()?;
        let mut state = self.state.write().unwrap();
        state.policy_reads.push(name.to_string());
        state
            .policies
            .get(name)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(format!("policy '{}' not found", name)))
    }

    fn list_policies(&self) -> Result<Vec<String>, VaultError> {
        self.authorize()?;
        let mut state = self.state.write().unwrap();
        state.policy_reads.push("*".to_string());
        Ok(state.policies.keys().cloned().collect())
    }

    fn set_policy(&self, name: &str, rules: &str) -> Result<(), VaultError> {
        self.authorize()?;
        self.state
            .write()
            .unwrap()
            .policies
            .insert(name.to_string(), rules.to_string());
        Ok(())
    }
}

#[cfg(test)]
impl Connector for MockVault {
    fn open(&self, url: &str, verify: bool) -> Result<Box<dyn VaultApi>, VaultError> {
        let mut state = self.state.write().unwrap();
        state.opened.push((url.to_string(), verify));
        if state.unreachable {
            return Err(VaultError::Connection(format!("connection refused: {}", url)));
        }
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_vault_clones_share_state() {
        let vault = MockVault::new();
        let handle = vault.open("http://vault", true).unwrap();
        let data = json!({ "a": "1" }).as_object().cloned().unwrap();
        handle.write("secret/foo", &data).unwrap();

        assert_eq!(vault.secret("secret/foo"), Some(data));
        assert_eq!(vault.opened(), vec![("http://vault".to_string(), true)]);
    }

    #[test]
    fn test_mock_vault_required_token() {
        let mut vault = MockVault::new().requiring_token("good");
        vault.set_token("bad");
        assert!(matches!(
            vault.read("secret/foo"),
            Err(VaultError::PermissionDenied(_))
        ));

        vault.set_token("good");
        assert!(vault.read("secret/foo").unwrap().is_none());
    }

    #[test]
    fn test_mock_vault_records_policy_reads() {
        let vault = MockVault::new().with_policy("app", "path \"*\" {}");
        vault.get_policy("app").unwrap();
        vault.list_policies().unwrap();
        vault.set_policy("ops", "path \"*\" {}").unwrap();

        assert_eq!(vault.policy_reads(), vec!["app", "*"]);
    }
}

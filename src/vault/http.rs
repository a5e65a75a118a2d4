//! Vault HTTP API client on top of reqwest's blocking client.

use super::api::{Connector, SecretData, VaultApi};
use super::error::VaultError;
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

/// Opens [`HttpVault`] sessions
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn open(&self, url: &str, verify: bool) -> Result<Box<dyn VaultApi>, VaultError> {
        Ok(Box::new(HttpVault::new(url, verify)?))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReadBody {
    data: Option<SecretData>,
}

#[derive(Debug, Deserialize)]
struct PolicyBody {
    rules: Option<String>,
    policy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PolicyListBody {
    policies: Option<Vec<String>>,
    keys: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
}

/// Session against a Vault server's `/v1` API
pub struct HttpVault {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpVault {
    fn user_agent() -> String {
        format!("hashivault/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Bind a session to `url`. Certificate checks are skipped when `verify` is false.
    pub fn new(url: &str, verify: bool) -> Result<Self, VaultError> {
        let base_url = Url::parse(url).map_err(|e| {
            VaultError::Connection(format!("invalid Vault address '{}': {}", url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VaultError::Connection(format!(
                "invalid Vault address '{}'",
                url
            )));
        }

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .danger_accept_invalid_certs(!verify)
            .build()
            .map_err(|e| VaultError::Connection(error_chain(&e)))?;

        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    /// `<base>/v1/<segments..>` with each segment percent-encoded, `/` included.
    ///
    /// `.` and `..` are refused: the url crate drops them silently, which would
    /// send the request to a different path than the one asked for.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, VaultError> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(VaultError::Configuration(format!(
                "Vault path cannot contain '{}' segments: {}",
                dot,
                segments.join("/")
            )));
        }

        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("v1")
                .extend(segments.iter().filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Response, VaultError> {
        let url = self.endpoint(segments)?;
        debug!(method = %method, path = url.path(), "vault request");

        let mut request = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("X-Vault-Token", token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .map_err(|e| VaultError::Connection(error_chain(&e)))
    }

    /// Send and map any non-2xx status onto the error taxonomy
    fn call(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Response, VaultError> {
        let response = self.send(method, segments, body)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = remote_message(response, &segments.join("/"));
        Err(match status {
            StatusCode::NOT_FOUND => VaultError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                VaultError::PermissionDenied(message)
            }
            _ => VaultError::Remote {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// POST credentials to a login endpoint and keep the returned client token
    fn login(&mut self, segments: &[&str], body: Value) -> Result<(), VaultError> {
        let response = self.send(Method::POST, segments, Some(&body))?;
        if !response.status().is_success() {
            return Err(VaultError::Authentication(remote_message(
                response,
                &segments.join("/"),
            )));
        }

        let login: LoginBody = response.json().map_err(|e| {
            VaultError::Authentication(format!("unreadable login response: {}", e))
        })?;
        let token = login
            .auth
            .map(|auth| auth.client_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                VaultError::Authentication("login response carried no client token".to_string())
            })?;

        self.token = Some(token);
        Ok(())
    }
}

/// Split a slash-separated Vault path such as `secret/app/db`
fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl VaultApi for HttpVault {
    fn auth_github(&mut self, token: &str) -> Result<(), VaultError> {
        debug!("authenticating with github backend");
        self.login(&["auth", "github", "login"], json!({ "token": token }))
    }

    fn auth_userpass(&mut self, username: &str, password: &str) -> Result<(), VaultError> {
        debug!(username, "authenticating with userpass backend");
        self.login(
            &["auth", "userpass", "login", username],
            json!({ "password": password }),
        )
    }

    fn auth_ldap(&mut self, username: &str, password: &str) -> Result<(), VaultError> {
        debug!(username, "authenticating with ldap backend");
        self.login(
            &["auth", "ldap", "login", username],
            json!({ "password": password }),
        )
    }

    fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn read(&self, path: &str) -> Result<Option<SecretData>, VaultError> {
        let response = match self.call(Method::GET, &split_path(path), None) {
            Ok(response) => response,
            Err(VaultError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let body: ReadBody = decode(response, path)?;
        Ok(Some(body.data.unwrap_or_default()))
    }

    fn write(&self, path: &str, data: &SecretData) -> Result<(), VaultError> {
        self.call(
            Method::PUT,
            &split_path(path),
            Some(&Value::Object(data.clone())),
        )?;
        Ok(())
    }

    fn seal_status(&self) -> Result<Value, VaultError> {
        let response = self.call(Method::GET, &["sys", "seal-status"], None)?;
        decode(response, "sys/seal-status")
    }

    fn seal(&self) -> Result<(), VaultError> {
        self.call(Method::PUT, &["sys", "seal"], None)?;
        Ok(())
    }

    fn unseal_multi(&self, keys: &[String]) -> Result<Value, VaultError> {
        if keys.is_empty() {
            return self.seal_status();
        }

        let mut status = Value::Null;
        for (index, key) in keys.iter().enumerate() {
            debug!(share = index + 1, total = keys.len(), "submitting unseal share");
            let response =
                self.call(Method::PUT, &["sys", "unseal"], Some(&json!({ "key": key })))?;
            status = decode(response, "sys/unseal")?;
        }
        Ok(status)
    }

    fn get_policy(&self, name: &str) -> Result<String, VaultError> {
        let response = self.call(Method::GET, &["sys", "policy", name], None)?;
        let body: PolicyBody = decode(response, &format!("sys/policy/{}", name))?;
        Ok(body.rules.or(body.policy).unwrap_or_default())
    }

    fn list_policies(&self) -> Result<Vec<String>, VaultError> {
        let response = self.call(Method::GET, &["sys", "policy"], None)?;
        let body: PolicyListBody = decode(response, "sys/policy")?;
        Ok(body.policies.or(body.keys).unwrap_or_default())
    }

    fn set_policy(&self, name: &str, rules: &str) -> Result<(), VaultError> {
        self.call(
            Method::PUT,
            &["sys", "policy", name],
            Some(&json!({ "rules": rules })),
        )?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, VaultError> {
    let status = response.status().as_u16();
    response.json().map_err(|e| VaultError::Remote {
        status,
        message: format!("unreadable response from {}: {}", path, e),
    })
}

/// Vault's `errors` array, or the bare status line when it is empty
fn remote_message(response: Response, path: &str) -> String {
    let status = response.status();
    let body: ErrorBody = response.json().unwrap_or_default();
    if body.errors.is_empty() {
        format!("{} for {}", status, path)
    } else {
        body.errors.join("; ")
    }
}

/// Flatten an error and its sources into one line
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

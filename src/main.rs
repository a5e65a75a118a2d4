mod commands;
mod config;
mod context;
mod output;
mod traits;
mod vault;

use anyhow::{Context as _, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::VaultCommand;
use config::Params;
use context::Context;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter, in `tracing_subscriber::EnvFilter` syntax
const LOG_ENV: &str = "HASHIVAULT_LOG";

#[derive(Parser)]
#[command(name = "hashivault")]
#[command(about = "HashiVault - Vault seal, policy and secret commands with a structured result", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// JSON or YAML file with command parameters; explicit flags take precedence
    #[arg(long, global = true, value_name = "PATH")]
    args_file: Option<PathBuf>,

    /// Result format written to stdout
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Vault address (defaults to $VAULT_ADDR)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Verify TLS certificates (defaults to true unless $VAULT_SKIP_VERIFY is set)
    #[arg(long, global = true, value_parser = BoolishValueParser::new())]
    verify: Option<bool>,

    /// Authentication backend: token, github, userpass or ldap
    #[arg(long, global = true)]
    authtype: Option<String>,

    /// Vault token or GitHub personal access token (defaults to $VAULT_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Username for userpass and ldap
    #[arg(long, global = true)]
    username: Option<String>,

    /// Password for userpass and ldap
    #[arg(long, global = true)]
    password: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the seal status
    Status,

    /// Seal the Vault server
    Seal {
        /// Accepted for compatibility; sealing needs no key
        #[arg(long)]
        key: Option<String>,
    },

    /// Unseal the Vault server with one or more key shares
    Unseal {
        /// Whitespace-separated unseal key shares
        #[arg(long)]
        keys: Option<String>,
    },

    /// Print the rules of a policy
    PolicyGet {
        /// Policy name
        #[arg(long)]
        name: Option<String>,
    },

    /// List policy names
    PolicyList,

    /// Create or replace a policy
    PolicySet {
        /// Policy name
        #[arg(long)]
        name: Option<String>,

        /// Policy rule text
        #[arg(long, conflicts_with = "rules_file")]
        rules: Option<String>,

        /// Read the policy rule text from a file
        #[arg(long, value_name = "PATH")]
        rules_file: Option<PathBuf>,
    },

    /// Read one field of secret/<SECRET>
    Read {
        /// Secret name under secret/
        #[arg(long)]
        secret: Option<String>,

        /// Field to return
        #[arg(long)]
        key: Option<String>,
    },

    /// Write fields to secret/<SECRET>
    Write {
        /// Secret name under secret/
        #[arg(long)]
        secret: Option<String>,

        /// Field to write (repeatable)
        #[arg(long = "data", value_name = "KEY=VALUE", conflicts_with = "data_json")]
        data: Vec<String>,

        /// Fields to write as a JSON object
        #[arg(long, value_name = "JSON")]
        data_json: Option<String>,

        /// Merge into the stored fields instead of replacing them
        #[arg(long)]
        update: bool,
    },
}

impl ConnectionArgs {
    fn into_params(self) -> Params {
        let mut params = Params::new();
        set_opt(&mut params, "url", self.url);
        set_opt(&mut params, "verify", self.verify);
        set_opt(&mut params, "authtype", self.authtype);
        set_opt(&mut params, "token", self.token);
        set_opt(&mut params, "username", self.username);
        set_opt(&mut params, "password", self.password);
        params
    }
}

impl Commands {
    /// Move subcommand flags into `params` and name the command to run
    fn into_command(self, params: &mut Params) -> Result<VaultCommand> {
        let command = match self {
            Commands::Status => VaultCommand::Status,
            Commands::Seal { key } => {
                set_opt(params, "key", key);
                VaultCommand::Seal
            }
            Commands::Unseal { keys } => {
                set_opt(params, "keys", keys);
                VaultCommand::Unseal
            }
            Commands::PolicyGet { name } => {
                set_opt(params, "name", name);
                VaultCommand::PolicyGet
            }
            Commands::PolicyList => VaultCommand::PolicyList,
            Commands::PolicySet {
                name,
                rules,
                rules_file,
            } => {
                set_opt(params, "name", name);
                set_opt(params, "rules", rules);
                if let Some(path) = rules_file {
                    let rules = std::fs::read_to_string(&path).with_context(|| {
                        format!("Failed to read rules file: {}", path.display())
                    })?;
                    params.set("rules", rules);
                }
                VaultCommand::PolicySet
            }
            Commands::Read { secret, key } => {
                set_opt(params, "secret", secret);
                set_opt(params, "key", key);
                VaultCommand::SecretRead
            }
            Commands::Write {
                secret,
                data,
                data_json,
                update,
            } => {
                set_opt(params, "secret", secret);
                if !data.is_empty() {
                    params.set("data", parse_data_pairs(&data)?);
                }
                if let Some(json) = data_json {
                    let value: Value =
                        serde_json::from_str(&json).context("--data-json is not valid JSON")?;
                    params.set("data", value);
                }
                if update {
                    params.set("update", true);
                }
                VaultCommand::SecretWrite
            }
        };

        Ok(command)
    }
}

fn set_opt<V: Into<Value>>(params: &mut Params, key: &str, value: Option<V>) {
    if let Some(value) = value {
        params.set(key, value);
    }
}

/// Turn `KEY=VALUE` flags into a field mapping; values stay strings
fn parse_data_pairs(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut data = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .with_context(|| format!("Invalid --data entry '{}', expected KEY=VALUE", pair))?;
        data.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(data)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let mut params = match &cli.args_file {
        Some(path) => Params::from_file(path)?,
        None => Params::new(),
    };
    params.merge(cli.connection.into_params());
    let command = cli.command.into_command(&mut params)?;

    let ctx = Context::new();
    let result = command.run(&ctx, &params);

    match cli.output {
        OutputFormat::Json => println!("{}", result.to_json()?),
        OutputFormat::Pretty => output::print_result(command.name(), &result),
    }

    Ok(ExitCode::from(u8::try_from(result.rc).unwrap_or(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_data_pairs() {
        let data = parse_data_pairs(&["a=1".to_string(), "url=http://x?y=z".to_string()]).unwrap();
        assert_eq!(data.get("a"), Some(&Value::String("1".to_string())));
        assert_eq!(data.get("url"), Some(&Value::String("http://x?y=z".to_string())));
    }

    #[test]
    fn test_parse_data_pairs_rejects_missing_separator() {
        assert!(parse_data_pairs(&["novalue".to_string()]).is_err());
        assert!(parse_data_pairs(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_flags_override_args_file() {
        let cli = Cli::parse_from([
            "hashivault",
            "--url",
            "https://flag:8200",
            "write",
            "--secret",
            "foo",
            "--data",
            "a=1",
            "--update",
        ]);

        let mut params = Params::new()
            .with("url", "https://file:8200")
            .with("token", "file-token");
        params.merge(cli.connection.into_params());
        let command = cli.command.into_command(&mut params).unwrap();

        assert_eq!(command, VaultCommand::SecretWrite);
        assert_eq!(params.str("url").as_deref(), Some("https://flag:8200"));
        assert_eq!(params.str("token").as_deref(), Some("file-token"));
        assert_eq!(params.bool("update"), Some(true));
        assert_eq!(
            params.require_map("data").unwrap().get("a"),
            Some(&Value::String("1".to_string()))
        );
    }

    #[test]
    fn test_verify_accepts_boolish_values() {
        let cli = Cli::parse_from(["hashivault", "--verify", "no", "status"]);
        assert_eq!(cli.connection.verify, Some(false));
    }

    #[test]
    fn test_unset_flags_stay_absent() {
        let cli = Cli::parse_from(["hashivault", "policy-list"]);
        let params = cli.connection.into_params();
        assert!(!params.contains("url"));
        assert!(!params.contains("verify"));
    }
}

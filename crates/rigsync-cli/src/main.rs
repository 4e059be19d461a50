//! rigsync: command-line controller for a remote test rig.
//!
//! Connects to the machine, runs one command, and exits.  Every command goes
//! through the same [`Machine`] API a test harness would use.
//!
//! # Usage
//!
//! ```text
//! rigsync [OPTIONS] <COMMAND>
//!
//! Commands:
//!   state                           Print the machine state
//!   properties                      Print the machine properties as JSON
//!   apps                            List registered applications
//!   actions <APP>                   List an application's actions
//!   triggers                        List the machine's state triggers
//!   invoke <APP> <ACTION> [--field K=V]...
//!   trigger <ACTION> [--field K=V]...
//!   wait-ready | wait-closing | wait-not-ready [--timeout SECS]
//!   wait-app <NAME> <STATE> [--timeout SECS]
//!   watch                           Print machine-state messages until Ctrl+C
//!
//! Options:
//!   --address  <HOST:PORT>  Machine address        [env: RIGSYNC_ADDRESS]
//!   --user     <USER>       Login user             [env: RIGSYNC_USER]
//!   --password <PASSWORD>   Login password         [env: RIGSYNC_PASSWORD]
//!   --config   <FILE>       TOML configuration file
//! ```
//!
//! Flags override values from `--config`.  A wait that times out exits with
//! a non-zero status.  Set `RUST_LOG=debug` to see every request.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rigsync_client::{connect, ActionOutcome, ClientConfig, Machine};
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line controller for a remote test rig.
#[derive(Debug, Parser)]
#[command(name = "rigsync", about = "Drive and observe a remote test rig", version)]
struct Cli {
    /// Machine address (`host:port`, optionally with a scheme).
    #[arg(long, env = "RIGSYNC_ADDRESS")]
    address: Option<String>,

    /// Login user.
    #[arg(long, env = "RIGSYNC_USER")]
    user: Option<String>,

    /// Login password.
    #[arg(long, env = "RIGSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the machine state.
    State,
    /// Print the machine properties as JSON.
    Properties,
    /// List registered applications and their connect-time state.
    Apps,
    /// List an application's actions.
    Actions {
        /// Application name or alias.
        app: String,
    },
    /// List the machine's state triggers.
    Triggers,
    /// Invoke an application action.
    Invoke {
        /// Application name or alias.
        app: String,
        /// Action name.
        action: String,
        /// Request field; the value is parsed as JSON when valid.
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },
    /// Invoke a machine state trigger.
    Trigger {
        /// Action name.
        action: String,
        /// Request field; the value is parsed as JSON when valid.
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },
    /// Wait until the machine is ready for testing.
    WaitReady {
        /// Give up after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Wait until the test box is closing (or ready).
    WaitClosing {
        /// Give up after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Wait until the machine leaves the ready state.
    WaitNotReady {
        /// Give up after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Wait for an application to reach a state; error states abort the wait.
    WaitApp {
        /// Application name or alias.
        name: String,
        /// Target state.
        state: String,
        /// Give up after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Print machine-state messages until Ctrl+C.
    Watch,
}

/// Parses `KEY=VALUE`; `VALUE` is JSON when it parses, a string otherwise.
fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty field name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn to_map(fields: Vec<(String, Value)>) -> Map<String, Value> {
    fields.into_iter().collect()
}

fn secs(timeout: Option<u64>) -> Option<Duration> {
    timeout.map(Duration::from_secs)
}

impl Cli {
    /// Loads `--config` (or defaults) and applies the flag overrides.
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        if let Some(user) = &self.user {
            config.user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        Ok(config)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn print_outcome(outcome: ActionOutcome) {
    match outcome {
        ActionOutcome::Response(response) => println!("{}", response.body),
        ActionOutcome::Submitted => println!("ok"),
    }
}

fn finish_wait(what: &str, reached: bool) -> anyhow::Result<()> {
    if !reached {
        bail!("timed out waiting for {what}");
    }
    println!("{what}");
    Ok(())
}

async fn run(machine: &Machine, command: Command) -> anyhow::Result<()> {
    match command {
        Command::State => println!("{}", machine.current_machine_state().await?),
        Command::Properties => {
            let properties = Value::Object(machine.properties().await?);
            println!("{}", serde_json::to_string_pretty(&properties)?);
        }
        Command::Apps => {
            for (key, app) in machine.applications().iter() {
                let state = app.state().unwrap_or("-");
                if key == &app.name {
                    println!("{key}\t{state}");
                } else {
                    println!("{key}\t{state}\t(alias of {})", app.name);
                }
            }
        }
        Command::Actions { app } => {
            for spec in machine.application(&app)?.actions.values() {
                println!("{}\t{}\t{}", spec.name, spec.method, spec.target);
            }
        }
        Command::Triggers => {
            for spec in machine.state_triggers().values() {
                println!("{}\t{}\t{}", spec.name, spec.method, spec.target);
            }
        }
        Command::Invoke {
            app,
            action,
            fields,
        } => print_outcome(machine.invoke(&app, &action, to_map(fields)).await?),
        Command::Trigger { action, fields } => {
            print_outcome(machine.trigger(&action, to_map(fields)).await?)
        }
        Command::WaitReady { timeout } => {
            finish_wait("ready", machine.wait_ready(secs(timeout)).await?)?
        }
        Command::WaitClosing { timeout } => {
            finish_wait("closing", machine.wait_closing(secs(timeout)).await?)?
        }
        Command::WaitNotReady { timeout } => {
            finish_wait("not ready", machine.wait_not_ready(secs(timeout)).await?)?
        }
        Command::WaitApp {
            name,
            state,
            timeout,
        } => {
            machine.wait_app_state(&name, &state, secs(timeout)).await?;
            println!("{name}: {state}");
        }
        Command::Watch => watch(machine).await,
    }
    Ok(())
}

async fn watch(machine: &Machine) {
    let mut messages = machine.subscribe_machine_state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C; stopping");
                break;
            }
            message = messages.recv() => match message {
                Ok(message) => println!("{}", message.state),
                Err(RecvError::Lagged(skipped)) => warn!("skipped {skipped} machine-state message(s)"),
                Err(RecvError::Closed) => break,
            }
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.client_config()?;

    let machine = connect(&config)
        .await
        .with_context(|| format!("failed to connect to {}", config.base_url()))?;

    let result = run(&machine, cli.command).await;
    machine.shutdown().await;
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_json_value() {
        assert_eq!(parse_field("duration=30").unwrap(), ("duration".to_string(), json!(30)));
        assert_eq!(parse_field("on=true").unwrap().1, json!(true));
        assert_eq!(parse_field(r#"opts={"a":1}"#).unwrap().1, json!({"a": 1}));
    }

    #[test]
    fn test_parse_field_plain_string_value() {
        assert_eq!(parse_field("mode=manual").unwrap().1, json!("manual"));
        assert_eq!(parse_field("empty=").unwrap().1, json!(""));
    }

    #[test]
    fn test_parse_field_splits_on_first_equals() {
        assert_eq!(parse_field("expr=a=b").unwrap(), ("expr".to_string(), json!("a=b")));
    }

    #[test]
    fn test_parse_field_rejects_malformed_input() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_cli_invoke_collects_fields() {
        // Arrange / Act
        let cli = Cli::parse_from([
            "rigsync", "invoke", "camera", "capture", "--field", "mode=manual", "--field",
            "count=3",
        ]);

        // Assert
        match cli.command {
            Command::Invoke {
                app,
                action,
                fields,
            } => {
                assert_eq!(app, "camera");
                assert_eq!(action, "capture");
                assert_eq!(
                    to_map(fields),
                    json!({"mode": "manual", "count": 3}).as_object().cloned().unwrap()
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_wait_app_timeout() {
        let cli = Cli::parse_from(["rigsync", "wait-app", "app1", "Running", "--timeout", "10"]);
        match cli.command {
            Command::WaitApp {
                name,
                state,
                timeout,
            } => {
                assert_eq!((name.as_str(), state.as_str()), ("app1", "Running"));
                assert_eq!(secs(timeout), Some(Duration::from_secs(10)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_wait_ready_without_timeout_waits_forever() {
        let cli = Cli::parse_from(["rigsync", "wait-ready"]);
        assert!(matches!(cli.command, Command::WaitReady { timeout: None }));
    }

    #[test]
    fn test_client_config_defaults_without_flags() {
        let cli = Cli {
            address: None,
            user: None,
            password: None,
            config: None,
            command: Command::State,
        };
        assert_eq!(cli.client_config().unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_client_config_flags_override() {
        let cli = Cli::parse_from([
            "rigsync",
            "--address",
            "10.0.0.5:8080",
            "--user",
            "op",
            "--password",
            "pw",
            "state",
        ]);

        let config = cli.client_config().unwrap();

        assert_eq!(config.base_url(), "http://10.0.0.5:8080");
        assert_eq!(config.credentials(), Some(("op", "pw")));
    }

    #[test]
    fn test_client_config_missing_file_is_error() {
        let cli = Cli::parse_from(["rigsync", "--config", "/nonexistent/rigsync.toml", "state"]);
        assert!(cli.client_config().is_err());
    }

    #[test]
    fn test_finish_wait_timeout_is_error() {
        assert!(finish_wait("ready", false).is_err());
        assert!(finish_wait("ready", true).is_ok());
    }
}

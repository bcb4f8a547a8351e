//! Wallet CLI Submitter
//!
//! Submits Move calls through the `iota` command-line wallet. Key
//! management and signing stay inside the wallet; we only build the
//! command line and read back the digest.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;

use super::error::{LedgerError, LedgerResult};
use super::types::{MoveCall, SubmittedTransaction, TransactionEffects};
use super::TransactionSubmitter;

/// Configuration for the wallet CLI
#[derive(Debug, Clone)]
pub struct WalletCliConfig {
    /// Path or name of the wallet binary
    pub cli_path: PathBuf,
    /// Gas budget passed with every call
    pub gas_budget: u64,
    /// Optional wallet config file (`--client.config`)
    pub client_config: Option<PathBuf>,
}

impl Default for WalletCliConfig {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::from("iota"),
            gas_budget: 50_000_000,
            client_config: None,
        }
    }
}

/// Transaction submitter backed by the wallet CLI
pub struct WalletCliSubmitter {
    config: WalletCliConfig,
}

impl WalletCliSubmitter {
    pub fn new(config: WalletCliConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments for a call
    fn build_args(&self, call: &MoveCall) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(path) = &self.config.client_config {
            args.push("--client.config".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args.extend([
            "client".to_string(),
            "call".to_string(),
            "--package".to_string(),
            call.package.clone(),
            "--module".to_string(),
            call.module.clone(),
            "--function".to_string(),
            call.function.clone(),
        ]);

        if !call.arguments.is_empty() {
            args.push("--args".to_string());
            args.extend(call.arguments.iter().map(|a| a.as_cli_arg()));
        }

        if !call.type_arguments.is_empty() {
            args.push("--type-args".to_string());
            args.extend(call.type_arguments.iter().cloned());
        }

        args.extend([
            "--gas-budget".to_string(),
            self.config.gas_budget.to_string(),
            "--json".to_string(),
        ]);

        args
    }
}

#[async_trait]
impl TransactionSubmitter for WalletCliSubmitter {
    fn name(&self) -> &str {
        "wallet-cli"
    }

    async fn submit(&self, call: MoveCall) -> LedgerResult<SubmittedTransaction> {
        let args = self.build_args(&call);
        tracing::info!(target_fn = %call.target(), "Submitting transaction via wallet CLI");

        let output = Command::new(&self.config.cli_path)
            .args(&args)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LedgerError::Cli(format!(
                "{} exited with {}: {}",
                self.config.cli_path.display(),
                output.status,
                stderr.trim()
            )));
        }

        let response = parse_cli_output(&stdout)?;

        if let Some(effects) = &response.effects {
            if !effects.status.is_success() {
                return Err(LedgerError::ExecutionFailed(
                    effects
                        .status
                        .error
                        .clone()
                        .unwrap_or_else(|| effects.status.status.clone()),
                ));
            }
        }

        tracing::info!(digest = %response.digest, "Transaction submitted");
        Ok(SubmittedTransaction {
            digest: response.digest,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CliResponse {
    digest: String,
    #[serde(default)]
    effects: Option<TransactionEffects>,
}

/// Parse the wallet's `--json` output, skipping any banner lines before it
fn parse_cli_output(stdout: &str) -> LedgerResult<CliResponse> {
    let start = stdout
        .find('{')
        .ok_or_else(|| LedgerError::Cli("wallet printed no JSON response".to_string()))?;

    Ok(serde_json::from_str(&stdout[start..])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::CallArg;

    #[test]
    fn test_build_args() {
        let submitter = WalletCliSubmitter::new(WalletCliConfig::default());
        let call = MoveCall::new("0xpkg", "timeline", "create_post")
            .arg(CallArg::Object("0xtimeline".to_string()))
            .arg(CallArg::String("hello there".to_string()))
            .arg(CallArg::Object("0x6".to_string()));

        let args = submitter.build_args(&call);
        assert_eq!(
            args,
            vec![
                "client", "call", "--package", "0xpkg", "--module", "timeline", "--function",
                "create_post", "--args", "0xtimeline", "hello there", "0x6", "--gas-budget",
                "50000000", "--json",
            ]
        );
    }

    #[test]
    fn test_build_args_without_arguments() {
        let submitter = WalletCliSubmitter::new(WalletCliConfig {
            client_config: Some(PathBuf::from("/tmp/client.yaml")),
            ..Default::default()
        });
        let call = MoveCall::new("0xpkg", "timeline", "create_timeline");

        let args = submitter.build_args(&call);
        assert_eq!(args[0], "--client.config");
        assert!(!args.contains(&"--args".to_string()));
    }

    #[test]
    fn test_parse_cli_output_with_banner() {
        let stdout = r#"[warning] Client/Server api version mismatch
{
  "digest": "9xYz",
  "effects": { "status": { "status": "success" }, "created": [] }
}"#;
        let response = parse_cli_output(stdout).unwrap();
        assert_eq!(response.digest, "9xYz");
        assert!(response.effects.unwrap().status.is_success());
    }

    #[test]
    fn test_parse_cli_output_without_json() {
        let err = parse_cli_output("Error: no active address").unwrap_err();
        assert!(matches!(err, LedgerError::Cli(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let submitter = WalletCliSubmitter::new(WalletCliConfig {
            cli_path: PathBuf::from("/nonexistent/iota-wallet"),
            ..Default::default()
        });
        let err = submitter
            .submit(MoveCall::new("0xpkg", "timeline", "create_timeline"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}

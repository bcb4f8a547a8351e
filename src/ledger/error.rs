//! Ledger error types

use thiserror::Error;

/// Errors that can occur while talking to the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Node could not be reached
    #[error("Ledger node unavailable")]
    Unavailable,

    /// HTTP transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Request took longer than the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Transaction never showed up on the node
    #[error("Transaction {digest} not confirmed after {waited_ms} ms")]
    ConfirmationTimeout { digest: String, waited_ms: u64 },

    /// Transaction was included but aborted
    #[error("Transaction failed: {0}")]
    ExecutionFailed(String),

    /// Wallet CLI exited unsuccessfully or printed something unusable
    #[error("Wallet CLI error: {0}")]
    Cli(String),

    /// IO error (spawning the wallet CLI)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Decode(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::Rpc {
            code: -32602,
            message: "bad params".to_string(),
        };
        assert_eq!(err.to_string(), "RPC error -32602: bad params");

        let err = LedgerError::ConfirmationTimeout {
            digest: "Abc".to_string(),
            waited_ms: 3000,
        };
        assert_eq!(err.to_string(), "Transaction Abc not confirmed after 3000 ms");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LedgerError = json_err.into();
        assert!(matches!(err, LedgerError::Decode(_)));
    }
}

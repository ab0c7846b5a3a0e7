use thiserror::Error;

/// EVM chain vocabulary errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid abi: {0}")]
    InvalidAbi(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),
}

impl From<serde_json::Error> for EthError {
    fn from(e: serde_json::Error) -> Self {
        EthError::InvalidAbi(e.to_string())
    }
}

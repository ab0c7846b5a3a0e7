use chain_eth::EthError;
use thiserror::Error;

/// Why a transfer form refused to submit.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("invalid destination: {0}")]
    InvalidDestination(EthError),

    #[error("invalid value: {0}")]
    InvalidValue(EthError),

    #[error("token decimals are not loaded yet")]
    DecimalsUnavailable,
}

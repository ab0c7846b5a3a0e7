use thiserror::Error;

/// Start-up and persistence errors of the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("project id is not defined")]
    MissingProjectId,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("malformed session state: {0}")]
    MalformedState(#[from] serde_json::Error),
}

/// A failed wallet or chain request.
///
/// These never escape as `Err` from the hooks; they are stored in the
/// `error` field of the query or mutation they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no wallet is connected")]
    NotConnected,

    #[error("a wallet is already connected")]
    AlreadyConnected,

    #[error("request rejected by the user")]
    UserRejected,

    #[error("connector not found: {0}")]
    ConnectorNotFound(String),

    #[error("wallet is on chain {current}, request targets chain {requested}")]
    ChainMismatch { current: u64, requested: u64 },

    #[error("chain {0} is not configured")]
    UnsupportedChain(u64),

    #[error("function \"{0}\" not found on contract abi")]
    FunctionNotFound(String),

    #[error("function \"{name}\" expects {expected} arguments, got {given}")]
    ArgumentCount {
        name: String,
        expected: usize,
        given: usize,
    },

    #[error("argument {index} of \"{name}\" is not a valid {expected}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
    },

    #[error("insufficient funds for transfer")]
    InsufficientFunds,

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("transport error: {0}")]
    Transport(String),
}

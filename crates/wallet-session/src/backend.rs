use alloy_primitives::{Address, B256, U256};
use chain_eth::abi::AbiValue;

use crate::error::RequestError;
use crate::params::{
    Connection, ConnectorInfo, ReadContractParameters, SendTransactionParameters,
    WriteContractParameters,
};
use crate::state::StoredConnection;

/// The wallet and chain libraries the session layer sits on.
///
/// Implementations own everything this workspace does not: wallet pairing,
/// calldata encoding, signing and RPC transport. Calls are made from the
/// query client's work loop, never while a session lock is held.
pub trait WalletBackend: Send + Sync {
    /// Connectors offered in the connect modal.
    fn connectors(&self) -> Vec<ConnectorInfo>;

    fn connect(&self, connector_id: &str, chain_id: u64) -> Result<Connection, RequestError>;

    /// Resumes a connection remembered from a previous page load.
    fn reconnect(&self, stored: &StoredConnection) -> Result<Connection, RequestError>;

    fn disconnect(&self) -> Result<(), RequestError>;

    fn read_contract(&self, params: &ReadContractParameters) -> Result<AbiValue, RequestError>;

    /// Submits a contract transaction and returns its hash.
    fn write_contract(
        &self,
        from: Address,
        params: &WriteContractParameters,
    ) -> Result<B256, RequestError>;

    fn balance(&self, address: Address, chain_id: u64) -> Result<U256, RequestError>;

    /// Submits a native transfer and returns its hash.
    fn send_transaction(
        &self,
        from: Address,
        params: &SendTransactionParameters,
    ) -> Result<B256, RequestError>;
}

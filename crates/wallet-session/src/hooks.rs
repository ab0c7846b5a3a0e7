//! Stateful action hooks.
//!
//! Each hook owns a [`Mutation`] slot. Components create them once when
//! mounted and read their state on every render.

use std::sync::Arc;

use alloy_primitives::B256;

use crate::backend::WalletBackend;
use crate::config::SessionConfig;
use crate::error::RequestError;
use crate::params::{check_call, Connection, ConnectorInfo, SendTransactionParameters, WriteContractParameters};
use crate::query::{MutateOptions, Mutation, MutationState, QueryClient};
use crate::state::AccountStore;

/// Checks that a request targets the chain the wallet is on.
fn check_chain(account_chain: Option<u64>, requested: Option<u64>) -> Result<(), RequestError> {
    match (account_chain, requested) {
        (Some(current), Some(requested)) if current != requested => {
            Err(RequestError::ChainMismatch { current, requested })
        }
        _ => Ok(()),
    }
}

pub struct Connect {
    mutation: Mutation<Connection>,
    backend: Arc<dyn WalletBackend>,
    account: Arc<AccountStore>,
    chain_id: u64,
}

impl Connect {
    pub(crate) fn new(
        client: Arc<QueryClient>,
        backend: Arc<dyn WalletBackend>,
        account: Arc<AccountStore>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            mutation: Mutation::new(client),
            backend,
            account,
            chain_id: config.default_chain().id,
        }
    }

    pub fn connectors(&self) -> Vec<ConnectorInfo> {
        self.backend.connectors()
    }

    /// Connects through `connector_id` on the default chain.
    pub fn connect(&self, connector_id: &str, options: MutateOptions<Connection>) {
        let already_connected = self.account.snapshot().is_connected();
        if !already_connected {
            self.account.set_connecting();
        }

        let backend = Arc::clone(&self.backend);
        let account = Arc::clone(&self.account);
        let connector_id = connector_id.to_string();
        let chain_id = self.chain_id;

        self.mutation.mutate(
            move || {
                if already_connected {
                    return Err(RequestError::AlreadyConnected);
                }
                match backend.connect(&connector_id, chain_id) {
                    Ok(connection) => {
                        account.set_connected(&connection);
                        Ok(connection)
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "connect failed");
                        account.set_disconnected();
                        Err(e)
                    }
                }
            },
            options,
        );
    }

    pub fn state(&self) -> MutationState<Connection> {
        self.mutation.state()
    }

    pub fn is_pending(&self) -> bool {
        self.mutation.is_pending()
    }
}

pub struct Disconnect {
    mutation: Mutation<()>,
    client: Arc<QueryClient>,
    backend: Arc<dyn WalletBackend>,
    account: Arc<AccountStore>,
}

impl Disconnect {
    pub(crate) fn new(
        client: Arc<QueryClient>,
        backend: Arc<dyn WalletBackend>,
        account: Arc<AccountStore>,
    ) -> Self {
        Self {
            mutation: Mutation::new(Arc::clone(&client)),
            client,
            backend,
            account,
        }
    }

    /// Disconnects the wallet. On a disconnected account this settles
    /// successfully without touching the backend.
    ///
    /// Cached queries belong to the departing account and are dropped.
    pub fn disconnect(&self, options: MutateOptions<()>) {
        let client = Arc::clone(&self.client);
        let backend = Arc::clone(&self.backend);
        let account = Arc::clone(&self.account);

        self.mutation.mutate(
            move || {
                if account.snapshot().is_disconnected() {
                    return Ok(());
                }
                backend.disconnect()?;
                account.set_disconnected();
                client.clear();
                Ok(())
            },
            options,
        );
    }

    pub fn state(&self) -> MutationState<()> {
        self.mutation.state()
    }

    pub fn is_pending(&self) -> bool {
        self.mutation.is_pending()
    }
}

pub struct WriteContract {
    mutation: Mutation<B256>,
    backend: Arc<dyn WalletBackend>,
    account: Arc<AccountStore>,
}

impl WriteContract {
    pub(crate) fn new(
        client: Arc<QueryClient>,
        backend: Arc<dyn WalletBackend>,
        account: Arc<AccountStore>,
    ) -> Self {
        Self {
            mutation: Mutation::new(client),
            backend,
            account,
        }
    }

    /// Issues a contract transaction from the connected account. The
    /// mutation's data is the transaction hash.
    pub fn write_contract(&self, params: WriteContractParameters, options: MutateOptions<B256>) {
        let backend = Arc::clone(&self.backend);
        let account = Arc::clone(&self.account);

        self.mutation.mutate(
            move || {
                let snapshot = account.snapshot();
                let from = match snapshot.address {
                    Some(address) if snapshot.is_connected() => address,
                    _ => return Err(RequestError::NotConnected),
                };
                check_chain(snapshot.chain_id, params.chain_id)?;
                check_call(&params.abi, &params.function_name, &params.args)?;

                tracing::debug!(
                    contract = %params.address,
                    function = %params.function_name,
                    "submitting contract write"
                );
                backend.write_contract(from, &params)
            },
            options,
        );
    }

    pub fn state(&self) -> MutationState<B256> {
        self.mutation.state()
    }

    pub fn is_pending(&self) -> bool {
        self.mutation.is_pending()
    }

    pub fn reset(&self) {
        self.mutation.reset();
    }
}

pub struct SendTransaction {
    mutation: Mutation<B256>,
    backend: Arc<dyn WalletBackend>,
    account: Arc<AccountStore>,
    config: Arc<SessionConfig>,
}

impl SendTransaction {
    pub(crate) fn new(
        client: Arc<QueryClient>,
        backend: Arc<dyn WalletBackend>,
        account: Arc<AccountStore>,
        config: Arc<SessionConfig>,
    ) -> Self {
        Self {
            mutation: Mutation::new(client),
            backend,
            account,
            config,
        }
    }

    /// Sends the chain's native asset from the connected account.
    pub fn send_transaction(&self, params: SendTransactionParameters, options: MutateOptions<B256>) {
        let backend = Arc::clone(&self.backend);
        let account = Arc::clone(&self.account);
        let config = Arc::clone(&self.config);

        self.mutation.mutate(
            move || {
                if let Some(chain_id) = params.chain_id {
                    config
                        .chain(chain_id)
                        .ok_or(RequestError::UnsupportedChain(chain_id))?;
                }
                let snapshot = account.snapshot();
                let from = match snapshot.address {
                    Some(address) if snapshot.is_connected() => address,
                    _ => return Err(RequestError::NotConnected),
                };
                check_chain(snapshot.chain_id, params.chain_id)?;

                tracing::debug!(to = %params.to, value = %params.value, "submitting native transfer");
                backend.send_transaction(from, &params)
            },
            options,
        );
    }

    pub fn state(&self) -> MutationState<B256> {
        self.mutation.state()
    }

    pub fn is_pending(&self) -> bool {
        self.mutation.is_pending()
    }

    pub fn reset(&self) {
        self.mutation.reset();
    }
}

use std::sync::Arc;

use chain_eth::abi::AbiValue;
use chain_eth::units::format_units;
use serde_json::json;

use crate::backend::WalletBackend;
use crate::config::SessionConfig;
use crate::error::RequestError;
use crate::hooks::{Connect, Disconnect, SendTransaction, WriteContract};
use crate::modal::{ConnectModal, ModalController};
use crate::params::{check_call, Balance, BalanceParameters, ReadContractParameters};
use crate::query::{MutateOptions, Mutation, QueryClient, QueryData, QueryKey, QueryResult};
use crate::state::{AccountState, AccountStore};

/// Query kind of contract reads, for [`QueryClient::invalidate`].
pub const READ_CONTRACT_QUERY: &str = "readContract";
/// Query kind of native balance lookups, for [`QueryClient::invalidate`].
pub const BALANCE_QUERY: &str = "balance";

/// What descendants of a [`WalletSessionProvider`] reach wallet and chain
/// functionality through.
///
/// [`WalletSessionProvider`]: crate::provider::WalletSessionProvider
pub struct SessionContext {
    config: Arc<SessionConfig>,
    client: Arc<QueryClient>,
    backend: Arc<dyn WalletBackend>,
    account: Arc<AccountStore>,
    modal: &'static ConnectModal,
}

impl SessionContext {
    pub(crate) fn new(
        config: Arc<SessionConfig>,
        client: Arc<QueryClient>,
        backend: Arc<dyn WalletBackend>,
        account: Arc<AccountStore>,
        modal: &'static ConnectModal,
    ) -> Self {
        Self {
            config,
            client,
            backend,
            account,
            modal,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<QueryClient> {
        &self.client
    }

    pub fn use_account(&self) -> AccountState {
        self.account.snapshot()
    }

    pub fn use_connect(&self) -> Connect {
        Connect::new(
            Arc::clone(&self.client),
            Arc::clone(&self.backend),
            Arc::clone(&self.account),
            &self.config,
        )
    }

    pub fn use_disconnect(&self) -> Disconnect {
        Disconnect::new(
            Arc::clone(&self.client),
            Arc::clone(&self.backend),
            Arc::clone(&self.account),
        )
    }

    pub fn use_connect_modal(&self) -> ModalController<'static> {
        ModalController::new(self.modal, self.account.snapshot().is_connected())
    }

    pub fn use_write_contract(&self) -> WriteContract {
        WriteContract::new(
            Arc::clone(&self.client),
            Arc::clone(&self.backend),
            Arc::clone(&self.account),
        )
    }

    pub fn use_send_transaction(&self) -> SendTransaction {
        SendTransaction::new(
            Arc::clone(&self.client),
            Arc::clone(&self.backend),
            Arc::clone(&self.account),
            Arc::clone(&self.config),
        )
    }

    /// Observes a contract read. Unknown functions and mistyped arguments
    /// surface as the query's error.
    pub fn use_read_contract(&self, params: ReadContractParameters) -> QueryResult<AbiValue> {
        let key = QueryKey::new(READ_CONTRACT_QUERY, &params.key_params());
        let backend = Arc::clone(&self.backend);

        self.client
            .query(key, move || {
                check_call(&params.abi, &params.function_name, &params.args)?;
                backend.read_contract(&params).map(QueryData::Contract)
            })
            .map_data(|data| match data {
                QueryData::Contract(value) => Some(value),
                QueryData::Balance(_) => None,
            })
    }

    /// Observes the native balance of an address, formatted with the
    /// chain's currency. Disabled until an address is given.
    pub fn use_balance(&self, params: BalanceParameters) -> QueryResult<Balance> {
        let Some(address) = params.address else {
            return QueryResult::disabled();
        };
        let chain_id = params
            .chain_id
            .or(self.account.snapshot().chain_id)
            .unwrap_or(self.config.default_chain().id);

        let key = QueryKey::new(BALANCE_QUERY, &json!({ "address": address, "chainId": chain_id }));
        let backend = Arc::clone(&self.backend);
        let currency = self.config.chain(chain_id).map(|c| c.native_currency);

        self.client
            .query(key, move || {
                let currency = currency.ok_or(RequestError::UnsupportedChain(chain_id))?;
                let value = backend.balance(address, chain_id)?;
                Ok(QueryData::Balance(Balance {
                    value,
                    decimals: currency.decimals,
                    symbol: currency.symbol.to_string(),
                    formatted: format_units(value, currency.decimals),
                }))
            })
            .map_data(|data| match data {
                QueryData::Balance(balance) => Some(balance),
                QueryData::Contract(_) => None,
            })
    }

    /// Resumes a session restored from storage. Runs on the next
    /// [`QueryClient::run_pending`]; a no-op when nothing was restored.
    pub fn reconnect(&self) {
        let Some(stored) = self.account.take_restored() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let account = Arc::clone(&self.account);
        let config = Arc::clone(&self.config);

        // A throwaway slot: reconnection is not observed by any component.
        Mutation::new(Arc::clone(&self.client)).mutate(
            move || {
                let result = config
                    .chain(stored.chain_id)
                    .ok_or(RequestError::UnsupportedChain(stored.chain_id))
                    .and_then(|_| backend.reconnect(&stored));
                match result {
                    Ok(connection) => {
                        account.set_connected(&connection);
                        Ok(connection)
                    }
                    Err(e) => {
                        tracing::info!(error = %e, "could not resume wallet session");
                        account.set_disconnected();
                        Err(e)
                    }
                }
            },
            MutateOptions::new(),
        );
    }
}

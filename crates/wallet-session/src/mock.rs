//! In-memory [`WalletBackend`] for local development and tests.
//!
//! Simulates one injected wallet on a single chain, native balances and
//! any number of ERC-20 token ledgers.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{keccak256, Address, B256, U256};
use chain_eth::abi::AbiValue;

use crate::backend::WalletBackend;
use crate::error::RequestError;
use crate::lock;
use crate::params::{
    Connection, ConnectorInfo, ReadContractParameters, SendTransactionParameters,
    WriteContractParameters,
};
use crate::state::StoredConnection;

pub const MOCK_CONNECTOR_ID: &str = "mock";

/// A transaction accepted by the mock chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    /// Function name and arguments for contract calls.
    pub call: Option<(String, Vec<AbiValue>)>,
}

#[derive(Debug, Clone)]
struct TokenLedger {
    name: String,
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, U256>,
}

impl TokenLedger {
    fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct MockChain {
    chain_id: u64,
    accounts: Vec<Address>,
    connected: Option<Connection>,
    native: HashMap<Address, U256>,
    tokens: HashMap<Address, TokenLedger>,
    nonce: u64,
    fail_next: Option<RequestError>,
    sent: Vec<SentTransaction>,
}

impl MockChain {
    fn injected_failure(&mut self) -> Result<(), RequestError> {
        match self.fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn check_chain(&self, chain_id: Option<u64>) -> Result<(), RequestError> {
        match chain_id {
            Some(id) if id != self.chain_id => Err(RequestError::UnsupportedChain(id)),
            _ => Ok(()),
        }
    }

    fn require_sender(&self, from: Address) -> Result<(), RequestError> {
        match &self.connected {
            Some(c) if c.address == from => Ok(()),
            _ => Err(RequestError::NotConnected),
        }
    }

    fn next_hash(&mut self) -> B256 {
        self.nonce += 1;
        keccak256(format!("mock-tx-{}-{}", self.chain_id, self.nonce).as_bytes())
    }

    fn connection_for(&self, address: Address) -> Connection {
        Connection {
            connector_id: MOCK_CONNECTOR_ID.to_string(),
            address,
            chain_id: self.chain_id,
        }
    }
}

fn arg_address(args: &[AbiValue], index: usize) -> Result<Address, RequestError> {
    args.get(index)
        .and_then(AbiValue::as_address)
        .ok_or_else(|| RequestError::Reverted(format!("argument {index} is not an address")))
}

fn arg_uint(args: &[AbiValue], index: usize) -> Result<U256, RequestError> {
    args.get(index)
        .and_then(AbiValue::as_uint)
        .ok_or_else(|| RequestError::Reverted(format!("argument {index} is not a uint")))
}

/// Mock wallet backend. The first configured account is the one that
/// connects.
#[derive(Debug)]
pub struct MockBackend {
    chain: Mutex<MockChain>,
}

impl MockBackend {
    pub fn new(chain_id: u64, accounts: Vec<Address>) -> Self {
        Self {
            chain: Mutex::new(MockChain {
                chain_id,
                accounts,
                ..MockChain::default()
            }),
        }
    }

    pub fn with_native_balance(self, owner: Address, amount: U256) -> Self {
        lock(&self.chain).native.insert(owner, amount);
        self
    }

    /// Deploys an ERC-20 ledger at `contract` with the given holdings.
    pub fn with_token(
        self,
        contract: Address,
        symbol: &str,
        decimals: u8,
        holdings: &[(Address, U256)],
    ) -> Self {
        lock(&self.chain).tokens.insert(
            contract,
            TokenLedger {
                name: symbol.to_string(),
                symbol: symbol.to_string(),
                decimals,
                balances: holdings.iter().copied().collect(),
            },
        );
        self
    }

    /// Makes the next request fail with the wallet's rejection error.
    pub fn reject_next_request(&self) {
        self.fail_next_request(RequestError::UserRejected);
    }

    pub fn fail_next_request(&self, error: RequestError) {
        lock(&self.chain).fail_next = Some(error);
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        lock(&self.chain).sent.clone()
    }

    pub fn native_balance_of(&self, owner: Address) -> U256 {
        lock(&self.chain).native.get(&owner).copied().unwrap_or_default()
    }

    pub fn token_balance_of(&self, contract: Address, owner: Address) -> U256 {
        lock(&self.chain)
            .tokens
            .get(&contract)
            .map(|t| t.balance_of(&owner))
            .unwrap_or_default()
    }
}

impl WalletBackend for MockBackend {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        vec![ConnectorInfo {
            id: MOCK_CONNECTOR_ID.to_string(),
            name: "Mock Wallet".to_string(),
        }]
    }

    fn connect(&self, connector_id: &str, chain_id: u64) -> Result<Connection, RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;

        if connector_id != MOCK_CONNECTOR_ID {
            return Err(RequestError::ConnectorNotFound(connector_id.to_string()));
        }
        chain.check_chain(Some(chain_id))?;

        let address = *chain
            .accounts
            .first()
            .ok_or_else(|| RequestError::Transport("wallet exposes no accounts".into()))?;
        let connection = chain.connection_for(address);
        chain.connected = Some(connection.clone());
        Ok(connection)
    }

    fn reconnect(&self, stored: &StoredConnection) -> Result<Connection, RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;

        if stored.connector_id != MOCK_CONNECTOR_ID {
            return Err(RequestError::ConnectorNotFound(stored.connector_id.clone()));
        }
        if !chain.accounts.contains(&stored.address) {
            return Err(RequestError::NotConnected);
        }
        chain.check_chain(Some(stored.chain_id))?;

        let connection = chain.connection_for(stored.address);
        chain.connected = Some(connection.clone());
        Ok(connection)
    }

    fn disconnect(&self) -> Result<(), RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;
        chain.connected = None;
        Ok(())
    }

    fn read_contract(&self, params: &ReadContractParameters) -> Result<AbiValue, RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;
        chain.check_chain(params.chain_id)?;

        let token = chain
            .tokens
            .get(&params.address)
            .ok_or_else(|| RequestError::Reverted("no contract code at address".into()))?;
        let args = &params.args;

        match params.function_name.as_str() {
            "name" => Ok(AbiValue::String(token.name.clone())),
            "symbol" => Ok(AbiValue::String(token.symbol.clone())),
            "decimals" => Ok(AbiValue::Uint(U256::from(token.decimals))),
            "totalSupply" => Ok(AbiValue::Uint(
                token
                    .balances
                    .values()
                    .fold(U256::ZERO, |acc, v| acc.saturating_add(*v)),
            )),
            "balanceOf" => Ok(AbiValue::Uint(token.balance_of(&arg_address(args, 0)?))),
            "allowance" => Ok(AbiValue::Uint(U256::ZERO)),
            other => Err(RequestError::FunctionNotFound(other.to_string())),
        }
    }

    fn write_contract(
        &self,
        from: Address,
        params: &WriteContractParameters,
    ) -> Result<B256, RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;
        chain.check_chain(params.chain_id)?;
        chain.require_sender(from)?;

        let args = params.args.clone();
        let token = chain
            .tokens
            .get_mut(&params.address)
            .ok_or_else(|| RequestError::Reverted("no contract code at address".into()))?;

        match params.function_name.as_str() {
            "transfer" => {
                let to = arg_address(&args, 0)?;
                let amount = arg_uint(&args, 1)?;
                let held = token.balance_of(&from);
                if held < amount {
                    return Err(RequestError::Reverted(
                        "ERC20: transfer amount exceeds balance".into(),
                    ));
                }
                token.balances.insert(from, held - amount);
                *token.balances.entry(to).or_default() += amount;
            }
            "approve" => {
                arg_address(&args, 0)?;
                arg_uint(&args, 1)?;
            }
            other => return Err(RequestError::FunctionNotFound(other.to_string())),
        }

        let hash = chain.next_hash();
        chain.sent.push(SentTransaction {
            hash,
            from,
            to: params.address,
            value: params.value.unwrap_or_default(),
            call: Some((params.function_name.clone(), args)),
        });
        Ok(hash)
    }

    fn balance(&self, address: Address, chain_id: u64) -> Result<U256, RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;
        chain.check_chain(Some(chain_id))?;
        Ok(chain.native.get(&address).copied().unwrap_or_default())
    }

    fn send_transaction(
        &self,
        from: Address,
        params: &SendTransactionParameters,
    ) -> Result<B256, RequestError> {
        let mut chain = lock(&self.chain);
        chain.injected_failure()?;
        chain.check_chain(params.chain_id)?;
        chain.require_sender(from)?;

        let held = chain.native.get(&from).copied().unwrap_or_default();
        if held < params.value {
            return Err(RequestError::InsufficientFunds);
        }
        chain.native.insert(from, held - params.value);
        *chain.native.entry(params.to).or_default() += params.value;

        let hash = chain.next_hash();
        chain.sent.push(SentTransaction {
            hash,
            from,
            to: params.to,
            value: params.value,
            call: None,
        });
        Ok(hash)
    }
}

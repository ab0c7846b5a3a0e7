//! The capability bundle handed to an aggregator's children.
//!
//! Every view here borrows from the aggregator and is rebuilt on each render;
//! nothing is cached between renders.

use std::sync::Arc;

use alloy_primitives::B256;
use chain_eth::abi::AbiValue;
use wallet_session::hooks::{Connect, Disconnect, SendTransaction, WriteContract};
use wallet_session::modal::ModalController;
use wallet_session::params::{Balance, BalanceParameters};
use wallet_session::{
    AccountState, MutateOptions, MutationState, QueryClient, QueryResult, SessionContext,
};

use crate::identity::ContractIdentity;
use crate::merge::{bind_read, bind_write, ReadContractRequest, WriteContractRequest};

/// Everything a transfer view needs, for one render.
pub struct CapabilityBundle<'a> {
    pub account: AccountState,
    pub connect: &'a Connect,
    pub disconnect: &'a Disconnect,
    pub contract: ContractCapabilities<'a>,
    pub native_balance: NativeBalance<'a>,
    pub native_transaction: &'a SendTransaction,
    /// The session's shared cache, for invalidating reads after a write.
    pub query_client: &'a Arc<QueryClient>,
}

/// Capabilities bound to the aggregator's contract, plus the connect modal.
pub struct ContractCapabilities<'a> {
    pub read: ContractReader<'a>,
    pub write: ContractWriter<'a>,
    pub connect_modal: ModalController<'static>,
}

/// Contract reads with `abi` and `address` fixed to the bound contract.
#[derive(Clone, Copy)]
pub struct ContractReader<'a> {
    context: &'a SessionContext,
    identity: &'a ContractIdentity,
}

impl<'a> ContractReader<'a> {
    pub(crate) fn new(context: &'a SessionContext, identity: &'a ContractIdentity) -> Self {
        Self { context, identity }
    }

    pub fn read_contract(&self, request: ReadContractRequest) -> QueryResult<AbiValue> {
        self.context
            .use_read_contract(bind_read(self.identity, request))
    }

    pub fn contract(&self) -> &ContractIdentity {
        self.identity
    }
}

/// Contract writes with `abi` and `address` fixed to the bound contract.
///
/// `state` is the write mutation as of this render: the data is the
/// transaction hash.
pub struct ContractWriter<'a> {
    pub state: MutationState<B256>,
    writer: &'a WriteContract,
    identity: &'a ContractIdentity,
}

impl<'a> ContractWriter<'a> {
    pub(crate) fn new(writer: &'a WriteContract, identity: &'a ContractIdentity) -> Self {
        Self {
            state: writer.state(),
            writer,
            identity,
        }
    }

    pub fn write_contract(&self, request: WriteContractRequest, options: MutateOptions<B256>) {
        self.writer
            .write_contract(bind_write(self.identity, request), options);
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    pub fn reset(&self) {
        self.writer.reset();
    }
}

/// Native balance lookup. Not bound to the contract.
#[derive(Clone, Copy)]
pub struct NativeBalance<'a> {
    context: &'a SessionContext,
}

impl<'a> NativeBalance<'a> {
    pub(crate) fn new(context: &'a SessionContext) -> Self {
        Self { context }
    }

    pub fn query(&self, params: BalanceParameters) -> QueryResult<Balance> {
        self.context.use_balance(params)
    }
}

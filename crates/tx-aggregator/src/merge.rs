//! Binding caller requests to a [`ContractIdentity`].
//!
//! Precedence rule: the identity's `abi` and `address` always win. Every other
//! field (function name, arguments, chain, attached value) is taken from the
//! caller unchanged. A caller-supplied `abi` or `address` is accepted for
//! convenience but never reaches the backend; when it differs from the
//! identity a warning is logged.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use chain_eth::abi::{Abi, AbiValue};
use wallet_session::params::{ReadContractParameters, WriteContractParameters};

use crate::identity::ContractIdentity;

/// A contract read as issued by a caller of the bound reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadContractRequest {
    pub function_name: String,
    pub args: Vec<AbiValue>,
    pub chain_id: Option<u64>,
    /// Ignored in favour of the bound contract's ABI.
    pub abi: Option<Arc<Abi>>,
    /// Ignored in favour of the bound contract's address.
    pub address: Option<Address>,
}

impl ReadContractRequest {
    pub fn new(function_name: &str, args: Vec<AbiValue>) -> Self {
        Self {
            function_name: function_name.to_string(),
            args,
            ..Self::default()
        }
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

/// A contract write as issued by a caller of the bound writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteContractRequest {
    pub function_name: String,
    pub args: Vec<AbiValue>,
    pub value: Option<U256>,
    pub chain_id: Option<u64>,
    /// Ignored in favour of the bound contract's ABI.
    pub abi: Option<Arc<Abi>>,
    /// Ignored in favour of the bound contract's address.
    pub address: Option<Address>,
}

impl WriteContractRequest {
    pub fn new(function_name: &str, args: Vec<AbiValue>) -> Self {
        Self {
            function_name: function_name.to_string(),
            args,
            ..Self::default()
        }
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// Completes a read request with the identity's ABI and address.
pub fn bind_read(identity: &ContractIdentity, request: ReadContractRequest) -> ReadContractParameters {
    warn_on_override(
        identity,
        request.abi.as_ref(),
        request.address,
        &request.function_name,
    );

    ReadContractParameters {
        abi: Arc::clone(&identity.abi),
        address: identity.address,
        function_name: request.function_name,
        args: request.args,
        chain_id: request.chain_id,
    }
}

/// Completes a write request with the identity's ABI and address.
pub fn bind_write(
    identity: &ContractIdentity,
    request: WriteContractRequest,
) -> WriteContractParameters {
    warn_on_override(
        identity,
        request.abi.as_ref(),
        request.address,
        &request.function_name,
    );

    WriteContractParameters {
        abi: Arc::clone(&identity.abi),
        address: identity.address,
        function_name: request.function_name,
        args: request.args,
        value: request.value,
        chain_id: request.chain_id,
    }
}

/// Caller-supplied fields that disagree with the bound contract.
#[derive(Debug, Default, PartialEq, Eq)]
struct Overrides {
    address: Option<Address>,
    abi: bool,
}

fn overrides(
    identity: &ContractIdentity,
    abi: Option<&Arc<Abi>>,
    address: Option<Address>,
) -> Overrides {
    Overrides {
        address: address.filter(|a| *a != identity.address),
        abi: abi.is_some_and(|abi| !Arc::ptr_eq(abi, &identity.abi) && **abi != *identity.abi),
    }
}

fn warn_on_override(
    identity: &ContractIdentity,
    abi: Option<&Arc<Abi>>,
    address: Option<Address>,
    function_name: &str,
) {
    let overrides = overrides(identity, abi, address);
    if let Some(address) = overrides.address {
        tracing::warn!(
            requested = %address,
            bound = %identity.address,
            function = function_name,
            "ignoring caller address, call stays bound to the aggregator contract"
        );
    }
    if overrides.abi {
        tracing::warn!(
            bound = %identity.address,
            function = function_name,
            "ignoring caller abi, call stays bound to the aggregator contract"
        );
    }
}

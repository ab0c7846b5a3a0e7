//! Request and response shapes exchanged with the [`WalletBackend`].
//!
//! [`WalletBackend`]: crate::backend::WalletBackend

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use chain_eth::abi::{Abi, AbiFunction, AbiValue};
use serde_json::json;

use crate::error::RequestError;

/// A fully specified contract read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadContractParameters {
    pub abi: Arc<Abi>,
    pub address: Address,
    pub function_name: String,
    pub args: Vec<AbiValue>,
    pub chain_id: Option<u64>,
}

impl ReadContractParameters {
    /// Query key material. The ABI is left out: the address names the
    /// contract and the function name plus args name the call.
    pub(crate) fn key_params(&self) -> serde_json::Value {
        json!({
            "address": self.address,
            "functionName": self.function_name,
            "args": self.args,
            "chainId": self.chain_id,
        })
    }
}

/// A fully specified contract write transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteContractParameters {
    pub abi: Arc<Abi>,
    pub address: Address,
    pub function_name: String,
    pub args: Vec<AbiValue>,
    /// Native value attached to a payable call.
    pub value: Option<U256>,
    pub chain_id: Option<u64>,
}

/// Native balance lookup. Without an address the query stays disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceParameters {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
}

/// A native-asset transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTransactionParameters {
    pub to: Address,
    pub value: U256,
    pub chain_id: Option<u64>,
}

/// A native balance, pre-formatted with the chain's currency metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub value: U256,
    pub decimals: u8,
    pub symbol: String,
    pub formatted: String,
}

/// A live wallet connection as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub connector_id: String,
    pub address: Address,
    pub chain_id: u64,
}

/// A wallet connector the user can pick in the connect modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
}

/// Resolves `function_name` against the ABI and checks the arguments.
pub(crate) fn check_call<'a>(
    abi: &'a Abi,
    function_name: &str,
    args: &[AbiValue],
) -> Result<&'a AbiFunction, RequestError> {
    let function = abi
        .function(function_name, args.len())
        .ok_or_else(|| RequestError::FunctionNotFound(function_name.to_string()))?;

    if function.inputs.len() != args.len() {
        return Err(RequestError::ArgumentCount {
            name: function.name.clone(),
            expected: function.inputs.len(),
            given: args.len(),
        });
    }

    for (index, (arg, param)) in args.iter().zip(&function.inputs).enumerate() {
        if !arg.matches(param) {
            return Err(RequestError::ArgumentType {
                name: function.name.clone(),
                index,
                expected: param.canonical_type(),
            });
        }
    }

    Ok(function)
}

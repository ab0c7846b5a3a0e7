use std::sync::Arc;

use alloy_primitives::Address;
use chain_eth::abi::Abi;
use chain_eth::erc20::erc20_abi;

/// The contract an aggregator is bound to. Fixed for the aggregator's
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractIdentity {
    pub abi: Arc<Abi>,
    pub address: Address,
}

impl ContractIdentity {
    pub fn new(abi: impl Into<Arc<Abi>>, address: Address) -> Self {
        Self {
            abi: abi.into(),
            address,
        }
    }

    /// A standard ERC-20 token at `address`.
    pub fn erc20(address: Address) -> Self {
        Self::new(erc20_abi(), address)
    }
}

//! EVM chain vocabulary for the wallet transfer front-end.
//!
//! This crate provides:
//! - EVM network definitions with native currency metadata
//! - Address parsing and EIP-55 checksum validation
//! - JSON ABI descriptions (function lookup by name and arity, signatures)
//! - Dynamically typed ABI argument/return values
//! - The ERC-20 ABI fragment used by token screens
//! - Unit conversion between integer amounts and decimal strings
//!
//! Calldata encoding and transaction signing are left to the wallet backend.

pub mod abi;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod units;

pub use abi::{Abi, AbiFunction, AbiValue, StateMutability};
pub use alloy_primitives::{Address, B256, U256};
pub use chains::EvmChain;
pub use error::EthError;

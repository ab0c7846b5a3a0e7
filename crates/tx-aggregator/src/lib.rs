//! # tx-aggregator
//!
//! The transaction aggregator: given one contract, it gathers account state,
//! connect/disconnect actions, the connect modal, contract reads and writes
//! bound to that contract, and native balance/transfer capabilities into a
//! single [`CapabilityBundle`] handed to a rendering callback.
//!
//! [`page`] holds the token transfer screen built on top of it.

pub mod aggregator;
pub mod bundle;
pub mod error;
pub mod identity;
pub mod merge;
pub mod page;

pub use aggregator::TransactionAggregator;
pub use bundle::{CapabilityBundle, ContractCapabilities, ContractReader, ContractWriter, NativeBalance};
pub use error::FormError;
pub use identity::ContractIdentity;
pub use merge::{bind_read, bind_write, ReadContractRequest, WriteContractRequest};

//! # wallet-session
//!
//! Process-wide wallet session plumbing for the transfer front-end: the
//! configuration, persisted session storage, account store, shared
//! query/mutation client, connect-modal singleton and the
//! [`WalletSessionProvider`] that hands a [`SessionContext`] to descendants.
//!
//! Talking to an actual wallet or chain is delegated to a [`WalletBackend`].

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod mock;
pub mod modal;
pub mod params;
pub mod provider;
pub mod query;
pub mod state;
pub mod storage;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use backend::WalletBackend;
pub use config::{AppMetadata, SessionConfig};
pub use context::SessionContext;
pub use error::{RequestError, SessionError};
pub use provider::WalletSessionProvider;
pub use query::{MutateOptions, MutationState, QueryClient, QueryResult};
pub use state::{AccountState, ConnectionStatus, SessionState};

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

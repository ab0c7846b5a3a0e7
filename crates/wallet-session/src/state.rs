use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::lock;
use crate::params::Connection;
use crate::storage::{parse_cookie_header, SessionStorage};

/// Storage key of the persisted session.
pub const STORE_KEY: &str = "wallet.store";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Reconnecting,
    Disconnected,
}

/// Snapshot of the wallet connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub connector: Option<String>,
}

impl AccountState {
    pub fn disconnected() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            address: None,
            chain_id: None,
            connector: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    pub fn is_reconnecting(&self) -> bool {
        self.status == ConnectionStatus::Reconnecting
    }

    pub fn is_disconnected(&self) -> bool {
        self.status == ConnectionStatus::Disconnected
    }
}

/// The part of a connection worth remembering across reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConnection {
    pub connector_id: String,
    pub address: Address,
    pub chain_id: u64,
}

/// Persisted session, stored as JSON under [`STORE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub chain_id: Option<u64>,
    pub current: Option<StoredConnection>,
}

impl SessionState {
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Restores a session from a request `Cookie` header.
///
/// Returns `None` when SSR is off, the cookie is absent or unreadable, or the
/// remembered chain is no longer configured.
pub fn cookie_to_initial_state(
    config: &SessionConfig,
    cookie_header: Option<&str>,
) -> Option<SessionState> {
    if !config.ssr() {
        return None;
    }

    let jar = parse_cookie_header(cookie_header?);
    let raw = jar.get(STORE_KEY)?;
    let state = match SessionState::from_json(raw) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable session cookie");
            return None;
        }
    };

    let chain_id = state.current.as_ref().map(|c| c.chain_id).or(state.chain_id)?;
    if config.chain(chain_id).is_none() {
        tracing::debug!(chain_id, "session cookie names an unconfigured chain");
        return None;
    }

    Some(state)
}

/// Owner of the live [`AccountState`], mirrored into session storage.
pub struct AccountStore {
    state: Mutex<AccountState>,
    storage: Arc<dyn SessionStorage>,
    restored: Mutex<Option<StoredConnection>>,
}

impl AccountStore {
    /// A restored connection starts out `Reconnecting` until the backend
    /// confirms it.
    pub fn new(storage: Arc<dyn SessionStorage>, initial: Option<SessionState>) -> Self {
        let restored = initial.and_then(|s| s.current);
        let state = match &restored {
            Some(stored) => AccountState {
                status: ConnectionStatus::Reconnecting,
                address: Some(stored.address),
                chain_id: Some(stored.chain_id),
                connector: Some(stored.connector_id.clone()),
            },
            None => AccountState::disconnected(),
        };

        Self {
            state: Mutex::new(state),
            storage,
            restored: Mutex::new(restored),
        }
    }

    pub fn snapshot(&self) -> AccountState {
        lock(&self.state).clone()
    }

    /// Takes the connection awaiting reconnection, if any.
    pub fn take_restored(&self) -> Option<StoredConnection> {
        lock(&self.restored).take()
    }

    pub fn set_connecting(&self) {
        lock(&self.state).status = ConnectionStatus::Connecting;
    }

    pub fn set_connected(&self, connection: &Connection) {
        *lock(&self.state) = AccountState {
            status: ConnectionStatus::Connected,
            address: Some(connection.address),
            chain_id: Some(connection.chain_id),
            connector: Some(connection.connector_id.clone()),
        };
        tracing::info!(address = %connection.address, chain_id = connection.chain_id, "wallet connected");

        self.persist(&SessionState {
            chain_id: Some(connection.chain_id),
            current: Some(StoredConnection {
                connector_id: connection.connector_id.clone(),
                address: connection.address,
                chain_id: connection.chain_id,
            }),
        });
    }

    pub fn set_disconnected(&self) {
        let previous = std::mem::replace(&mut *lock(&self.state), AccountState::disconnected());
        if previous.address.is_some() {
            tracing::info!("wallet disconnected");
        }
        self.storage.remove(STORE_KEY);
    }

    fn persist(&self, session: &SessionState) {
        let result = serde_json::to_string(session)
            .map_err(SessionError::from)
            .and_then(|json| self.storage.set(STORE_KEY, &json));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist wallet session");
        }
    }
}

#[cfg(test)]
mod tests {
    use chain_eth::chains::{MAINNET, POLYGON};

    use super::*;
    use crate::config::AppMetadata;
    use crate::storage::MemoryStorage;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn polygon_config() -> SessionConfig {
        SessionConfig::new(Some("id".into()), vec![POLYGON], AppMetadata::default()).unwrap()
    }

    fn cookie_for(state: &SessionState) -> String {
        let json = serde_json::to_string(state).unwrap();
        format!("{STORE_KEY}={}", urlencoding::encode(&json))
    }

    fn connection() -> Connection {
        Connection {
            connector_id: "mock".into(),
            address: addr(0xaa),
            chain_id: 137,
        }
    }

    #[test]
    fn fresh_store_is_disconnected() {
        let store = AccountStore::new(Arc::new(MemoryStorage::new()), None);
        let account = store.snapshot();
        assert!(account.is_disconnected());
        assert!(account.address.is_none());
    }

    #[test]
    fn restored_store_is_reconnecting() {
        let initial = SessionState {
            chain_id: Some(137),
            current: Some(StoredConnection {
                connector_id: "mock".into(),
                address: addr(0xaa),
                chain_id: 137,
            }),
        };
        let store = AccountStore::new(Arc::new(MemoryStorage::new()), Some(initial));
        let account = store.snapshot();
        assert!(account.is_reconnecting());
        assert_eq!(account.address, Some(addr(0xaa)));
        assert!(store.take_restored().is_some());
        assert!(store.take_restored().is_none());
    }

    #[test]
    fn connect_persists_and_disconnect_clears() {
        let storage = Arc::new(MemoryStorage::new());
        let store = AccountStore::new(storage.clone(), None);

        store.set_connecting();
        assert!(store.snapshot().is_connecting());

        store.set_connected(&connection());
        assert!(store.snapshot().is_connected());
        let saved = SessionState::from_json(&storage.get(STORE_KEY).unwrap()).unwrap();
        assert_eq!(saved.current.unwrap().address, addr(0xaa));

        store.set_disconnected();
        assert_eq!(store.snapshot(), AccountState::disconnected());
        assert!(storage.get(STORE_KEY).is_none());
    }

    #[test]
    fn cookie_restores_configured_chain() {
        let state = SessionState {
            chain_id: Some(137),
            current: Some(StoredConnection {
                connector_id: "mock".into(),
                address: addr(0xbb),
                chain_id: 137,
            }),
        };
        let header = format!("other=1; {}", cookie_for(&state));
        let restored = cookie_to_initial_state(&polygon_config(), Some(&header));
        assert_eq!(restored, Some(state));
    }

    #[test]
    fn cookie_for_unconfigured_chain_is_dropped() {
        let state = SessionState {
            chain_id: Some(MAINNET.id),
            current: None,
        };
        let header = cookie_for(&state);
        assert!(cookie_to_initial_state(&polygon_config(), Some(&header)).is_none());
    }

    #[test]
    fn garbage_cookie_is_dropped() {
        let header = format!("{STORE_KEY}=not-json");
        assert!(cookie_to_initial_state(&polygon_config(), Some(&header)).is_none());
        assert!(cookie_to_initial_state(&polygon_config(), None).is_none());
    }

    #[test]
    fn ssr_disabled_ignores_cookie() {
        let state = SessionState {
            chain_id: Some(137),
            current: None,
        };
        let header = cookie_for(&state);
        let config = polygon_config().with_ssr(false);
        assert!(cookie_to_initial_state(&config, Some(&header)).is_none());
    }
}

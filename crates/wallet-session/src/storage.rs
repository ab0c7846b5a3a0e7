//! Key/value storage backing the persisted wallet session.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::error::SessionError;
use crate::lock;

/// Browsers reject cookies larger than this.
const MAX_COOKIE_BYTES: usize = 4096;

/// Storage for the serialised session state.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn remove(&self, key: &str);
}

/// Process-local storage; nothing survives a reload.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        lock(&self.entries).remove(key);
    }
}

/// Cookie-backed storage, so the server can read the session on the first
/// request and render the connected state without a flash.
///
/// Reads come from the jar parsed out of the request's `Cookie` header;
/// writes are queued as `Set-Cookie` header values for the host to emit.
#[derive(Debug)]
pub struct CookieStorage {
    jar: Mutex<BTreeMap<String, String>>,
    outgoing: Mutex<Vec<String>>,
    max_age_secs: u64,
}

impl Default for CookieStorage {
    fn default() -> Self {
        Self {
            jar: Mutex::new(BTreeMap::new()),
            outgoing: Mutex::new(Vec::new()),
            // Thirty days.
            max_age_secs: 30 * 24 * 60 * 60,
        }
    }
}

impl CookieStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the jar from a `Cookie` request header.
    ///
    /// Malformed pairs and values that are not valid percent-encoded UTF-8
    /// are skipped.
    pub fn from_header(header: &str) -> Self {
        let storage = Self::default();
        *lock(&storage.jar) = parse_cookie_header(header);
        storage
    }

    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }

    /// Drains the `Set-Cookie` values produced since the last call.
    pub fn take_set_cookie_headers(&self) -> Vec<String> {
        std::mem::take(&mut *lock(&self.outgoing))
    }
}

impl SessionStorage for CookieStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.jar).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let encoded = urlencoding::encode(value);
        let header = format!(
            "{key}={encoded}; Path=/; Max-Age={}; SameSite=Lax",
            self.max_age_secs
        );
        if header.len() > MAX_COOKIE_BYTES {
            return Err(SessionError::Storage(format!(
                "cookie '{key}' is {} bytes, limit is {MAX_COOKIE_BYTES}",
                header.len()
            )));
        }

        lock(&self.jar).insert(key.to_string(), value.to_string());
        lock(&self.outgoing).push(header);
        Ok(())
    }

    fn remove(&self, key: &str) {
        if lock(&self.jar).remove(key).is_some() {
            lock(&self.outgoing).push(format!("{key}=; Path=/; Max-Age=0; SameSite=Lax"));
        }
    }
}

/// Parses a `Cookie` header into decoded name/value pairs.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = urlencoding::decode(value.trim()).ok()?;
            Some((name.to_string(), value.into_owned()))
        })
        .collect()
}

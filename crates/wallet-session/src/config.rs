//! # Session configuration
//!
//! The wallet session is configured once at start-up. A missing project
//! identifier is fatal: no [`SessionConfig`] (and therefore no provider) can
//! exist without one.

use std::env;

use chain_eth::chains::{self, EvmChain};

use crate::error::SessionError;

/// Environment variable holding the wallet-connect project identifier.
pub const PROJECT_ID_VAR: &str = "WALLET_PROJECT_ID";

/// Application identity shown by wallets during pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    /// Origin of the app; must match the serving domain and subdomain.
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "Web3Modal".to_string(),
            description: "Web3Modal Example".to_string(),
            url: "http://localhost:3000".to_string(),
            icons: vec!["https://avatars.githubusercontent.com/u/37784886".to_string()],
        }
    }
}

/// Validated wallet session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    project_id: String,
    chains: Vec<EvmChain>,
    metadata: AppMetadata,
    ssr: bool,
}

impl SessionConfig {
    /// Builds and validates a configuration.
    ///
    /// # Errors
    ///
    /// - [`SessionError::MissingProjectId`] if `project_id` is absent or blank
    /// - [`SessionError::InvalidConfig`] if [`SessionConfig::validate`] fails
    pub fn new(
        project_id: Option<String>,
        chains: Vec<EvmChain>,
        metadata: AppMetadata,
    ) -> Result<Self, SessionError> {
        let project_id = project_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(SessionError::MissingProjectId)?;

        let config = Self {
            project_id,
            chains,
            metadata,
            ssr: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Only [`PROJECT_ID_VAR`] is required; metadata falls back to
    /// [`AppMetadata::default`] field by field and the chain set defaults
    /// to Polygon.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let defaults = AppMetadata::default();
        let metadata = AppMetadata {
            name: lookup("WALLET_APP_NAME").unwrap_or(defaults.name),
            description: lookup("WALLET_APP_DESCRIPTION").unwrap_or(defaults.description),
            url: lookup("WALLET_APP_URL").unwrap_or(defaults.url),
            icons: lookup("WALLET_APP_ICON")
                .map(|icon| vec![icon])
                .unwrap_or(defaults.icons),
        };

        Self::new(lookup(PROJECT_ID_VAR), vec![chains::POLYGON], metadata)
    }

    /// Turns server-side rendering hydration support on or off.
    pub fn with_ssr(mut self, ssr: bool) -> Self {
        self.ssr = ssr;
        self
    }

    /// Validates chain set and metadata.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.chains.is_empty() {
            return Err(SessionError::InvalidConfig(
                "at least one chain must be configured".into(),
            ));
        }

        for (i, chain) in self.chains.iter().enumerate() {
            if self.chains[..i].iter().any(|c| c.id == chain.id) {
                return Err(SessionError::InvalidConfig(format!(
                    "chain {} is configured twice",
                    chain.id
                )));
            }
        }

        if !self.metadata.url.starts_with("https://") && !self.metadata.url.starts_with("http://") {
            return Err(SessionError::InvalidConfig(
                "metadata url must be an http(s) origin".into(),
            ));
        }

        Ok(())
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn chains(&self) -> &[EvmChain] {
        &self.chains
    }

    /// The first configured chain, used when a request names none.
    pub fn default_chain(&self) -> &EvmChain {
        // `validate` guarantees at least one chain.
        &self.chains[0]
    }

    pub fn chain(&self, chain_id: u64) -> Option<&EvmChain> {
        self.chains.iter().find(|c| c.id == chain_id)
    }

    pub fn metadata(&self) -> &AppMetadata {
        &self.metadata
    }

    pub fn ssr(&self) -> bool {
        self.ssr
    }
}

use std::sync::Arc;

use crate::backend::WalletBackend;
use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::modal::{create_connect_modal, ModalOptions};
use crate::query::QueryClient;
use crate::state::{AccountStore, SessionState};
use crate::storage::{MemoryStorage, SessionStorage};

/// Wraps the application once and hands a shared [`SessionContext`] to
/// everything rendered beneath it.
///
/// A provider can only be built from a validated [`SessionConfig`], so a
/// missing project id stops start-up before any provider exists.
pub struct WalletSessionProvider {
    context: Arc<SessionContext>,
}

impl WalletSessionProvider {
    pub fn builder(config: SessionConfig, backend: Arc<dyn WalletBackend>) -> ProviderBuilder {
        ProviderBuilder {
            config,
            backend,
            storage: None,
            initial_state: None,
            modal_options: ModalOptions::default(),
        }
    }

    pub fn context(&self) -> Arc<SessionContext> {
        Arc::clone(&self.context)
    }

    /// Renders `children` with access to the session context.
    pub fn render<R>(&self, children: impl FnOnce(&Arc<SessionContext>) -> R) -> R {
        children(&self.context)
    }
}

pub struct ProviderBuilder {
    config: SessionConfig,
    backend: Arc<dyn WalletBackend>,
    storage: Option<Arc<dyn SessionStorage>>,
    initial_state: Option<SessionState>,
    modal_options: ModalOptions,
}

impl ProviderBuilder {
    /// Where the session is persisted. Defaults to [`MemoryStorage`].
    pub fn storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Session restored from a previous page load, e.g. via
    /// [`cookie_to_initial_state`](crate::state::cookie_to_initial_state).
    pub fn initial_state(mut self, state: Option<SessionState>) -> Self {
        self.initial_state = state;
        self
    }

    pub fn modal_options(mut self, options: ModalOptions) -> Self {
        self.modal_options = options;
        self
    }

    pub fn build(self) -> WalletSessionProvider {
        let modal = create_connect_modal(&self.config, self.modal_options);
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let account = Arc::new(AccountStore::new(storage, self.initial_state));

        tracing::debug!(
            project_id = self.config.project_id(),
            chains = self.config.chains().len(),
            "wallet session provider ready"
        );

        WalletSessionProvider {
            context: Arc::new(SessionContext::new(
                Arc::new(self.config),
                Arc::new(QueryClient::new()),
                self.backend,
                account,
                modal,
            )),
        }
    }
}

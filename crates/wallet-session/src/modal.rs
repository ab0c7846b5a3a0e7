//! The wallet-connect modal.
//!
//! One modal exists per process. It is registered against the session
//! configuration by [`create_connect_modal`], guarded by a [`OnceLock`], so
//! re-rendering or rebuilding providers never registers a second one.

use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};

use alloy_primitives::Address;

use crate::config::SessionConfig;
use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalView {
    Account,
    Connect,
    Networks,
    ApproveTransaction,
    OnRampProviders,
}

/// Registration options for the modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOptions {
    pub enable_analytics: bool,
    pub enable_onramp: bool,
    /// Featured token contracts by chain id.
    pub tokens: BTreeMap<u64, Address>,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            enable_analytics: true,
            enable_onramp: true,
            tokens: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalState {
    pub open: bool,
    pub view: ModalView,
}

#[derive(Debug)]
pub struct ConnectModal {
    project_id: String,
    options: ModalOptions,
    state: Mutex<ModalState>,
}

impl ConnectModal {
    pub fn new(project_id: &str, options: ModalOptions) -> Self {
        Self {
            project_id: project_id.to_string(),
            options,
            state: Mutex::new(ModalState {
                open: false,
                view: ModalView::Connect,
            }),
        }
    }

    pub fn open(&self, view: ModalView) {
        *lock(&self.state) = ModalState { open: true, view };
    }

    pub fn close(&self) {
        lock(&self.state).open = false;
    }

    pub fn state(&self) -> ModalState {
        *lock(&self.state)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn options(&self) -> &ModalOptions {
        &self.options
    }
}

static CONNECT_MODAL: OnceLock<ConnectModal> = OnceLock::new();

/// Registers the process-wide modal, or returns the one already registered.
pub fn create_connect_modal(config: &SessionConfig, options: ModalOptions) -> &'static ConnectModal {
    let mut created = false;
    let modal = CONNECT_MODAL.get_or_init(|| {
        created = true;
        ConnectModal::new(config.project_id(), options)
    });

    if created {
        tracing::debug!(project_id = modal.project_id(), "connect modal registered");
    } else {
        tracing::debug!("connect modal already registered, reusing it");
    }
    modal
}

/// The registered modal, if [`create_connect_modal`] has run.
pub fn connect_modal() -> Option<&'static ConnectModal> {
    CONNECT_MODAL.get()
}

/// Modal controller handed to components. Opening without a view picks
/// the account view for a connected wallet and the connect view otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ModalController<'a> {
    modal: &'a ConnectModal,
    connected: bool,
}

impl<'a> ModalController<'a> {
    pub fn new(modal: &'a ConnectModal, connected: bool) -> Self {
        Self { modal, connected }
    }

    pub fn open(&self, view: Option<ModalView>) {
        let default_view = if self.connected {
            ModalView::Account
        } else {
            ModalView::Connect
        };
        self.modal.open(view.unwrap_or(default_view));
    }

    pub fn close(&self) {
        self.modal.close();
    }

    pub fn state(&self) -> ModalState {
        self.modal.state()
    }
}

//! # TransactionAggregator
//!
//! Binds one contract to the session layer and hands the resulting
//! [`CapabilityBundle`] to a rendering callback:
//!
//! ```text
//! SessionContext ──┐
//!                  ├─► TransactionAggregator ─► CapabilityBundle ─► children(&bundle) ─► V
//! ContractIdentity ┘
//! ```
//!
//! The action slots (connect, disconnect, contract write, native transfer)
//! are created once when the aggregator is mounted, like hook state, and
//! survive re-renders. The bundle itself is rebuilt on every render.

use std::sync::Arc;

use wallet_session::hooks::{Connect, Disconnect, SendTransaction, WriteContract};
use wallet_session::SessionContext;

use crate::bundle::{CapabilityBundle, ContractCapabilities, ContractReader, ContractWriter, NativeBalance};
use crate::identity::ContractIdentity;

type Children<'a, V> = Box<dyn Fn(&CapabilityBundle<'_>) -> V + 'a>;

pub struct TransactionAggregator<'a, V> {
    context: Arc<SessionContext>,
    contract: ContractIdentity,
    connect: Connect,
    disconnect: Disconnect,
    writer: WriteContract,
    transactor: SendTransaction,
    children: Option<Children<'a, V>>,
}

impl<'a, V> TransactionAggregator<'a, V> {
    /// Mounts an aggregator for `contract` with no children.
    pub fn new(context: Arc<SessionContext>, contract: ContractIdentity) -> Self {
        tracing::debug!(contract = %contract.address, "mounting transaction aggregator");
        Self {
            connect: context.use_connect(),
            disconnect: context.use_disconnect(),
            writer: context.use_write_contract(),
            transactor: context.use_send_transaction(),
            context,
            contract,
            children: None,
        }
    }

    /// Sets the rendering callback.
    pub fn children(mut self, children: impl Fn(&CapabilityBundle<'_>) -> V + 'a) -> Self {
        self.children = Some(Box::new(children));
        self
    }

    pub fn contract(&self) -> &ContractIdentity {
        &self.contract
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Renders the children with a fresh bundle. Without children there is
    /// nothing to render and `None` is returned.
    pub fn render(&self) -> Option<V> {
        let children = self.children.as_ref()?;
        Some(children(&self.bundle()))
    }

    /// Runs an event handler against a fresh bundle, outside of rendering.
    pub fn dispatch<R>(&self, handler: impl FnOnce(&CapabilityBundle<'_>) -> R) -> R {
        handler(&self.bundle())
    }

    fn bundle(&self) -> CapabilityBundle<'_> {
        CapabilityBundle {
            account: self.context.use_account(),
            connect: &self.connect,
            disconnect: &self.disconnect,
            contract: ContractCapabilities {
                read: ContractReader::new(&self.context, &self.contract),
                write: ContractWriter::new(&self.writer, &self.contract),
                connect_modal: self.context.use_connect_modal(),
            },
            native_balance: NativeBalance::new(&self.context),
            native_transaction: &self.transactor,
            query_client: self.context.client(),
        }
    }
}

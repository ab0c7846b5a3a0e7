//! Token transfer screen.
//!
//! A view-model over the [`CapabilityBundle`]: [`TransferScreen::view`] turns
//! one render's bundle into plain display data, and the `send_*` and
//! `disconnect` handlers are meant to run through
//! [`TransactionAggregator::dispatch`].
//!
//! [`TransactionAggregator::dispatch`]: crate::aggregator::TransactionAggregator::dispatch

use std::cell::RefCell;
use std::sync::Arc;

use alloy_primitives::{address, Address, B256, U256};
use chain_eth::address::{checksum_address, parse_address};
use chain_eth::chains::{EvmChain, POLYGON};
use chain_eth::units::{format_units, parse_units};
use wallet_session::params::{BalanceParameters, SendTransactionParameters};
use wallet_session::context::{BALANCE_QUERY, READ_CONTRACT_QUERY};
use wallet_session::modal::ModalOptions;
use wallet_session::{MutateOptions, MutationState, QueryClient};

use crate::bundle::CapabilityBundle;
use crate::error::FormError;
use crate::identity::ContractIdentity;
use crate::merge::{ReadContractRequest, WriteContractRequest};

/// PME token on Polygon mainnet.
pub const PME_CONTRACT_ADDRESS: Address = address!("c2132D05D31c914a87C6611C10748AEb04B58e8F");

pub const LOADING: &str = "Loading...";
pub const BALANCE_ERROR: &str = "Error loading balance";

pub fn pme_contract() -> ContractIdentity {
    ContractIdentity::erc20(PME_CONTRACT_ADDRESS)
}

/// Connect modal registration for this screen, featuring PME on Polygon.
pub fn modal_options() -> ModalOptions {
    ModalOptions {
        tokens: [(POLYGON.id, PME_CONTRACT_ADDRESS)].into_iter().collect(),
        ..ModalOptions::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferTab {
    #[default]
    Native,
    Contract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    NotConnected,
    Connected { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFormView {
    pub title: String,
    pub destination: String,
    pub value: String,
    pub value_label: String,
    pub send: ButtonView,
    /// Block explorer page of the form's last successful transaction.
    pub explorer_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabsView {
    pub active: TransferTab,
    pub native: SendFormView,
    pub contract: SendFormView,
}

/// Everything the screen shows for one render. Sections that only exist
/// while connected are `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferView {
    pub banner: Banner,
    pub show_connect_button: bool,
    pub disconnect: Option<ButtonView>,
    pub token_balance: Option<String>,
    pub native_balance: Option<String>,
    pub tabs: Option<TabsView>,
    pub form_error: Option<String>,
}

#[derive(Debug, Clone)]
struct FormState {
    destination: String,
    value: String,
    tab: TransferTab,
    error: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            destination: String::new(),
            value: "0".to_string(),
            tab: TransferTab::default(),
            error: None,
        }
    }
}

/// The transfer screen. Both send forms share the destination and value
/// inputs.
#[derive(Debug)]
pub struct TransferScreen {
    token_symbol: String,
    chain: EvmChain,
    form: RefCell<FormState>,
}

impl Default for TransferScreen {
    fn default() -> Self {
        Self::new("PME", POLYGON)
    }
}

impl TransferScreen {
    pub fn new(token_symbol: &str, chain: EvmChain) -> Self {
        Self {
            token_symbol: token_symbol.to_string(),
            chain,
            form: RefCell::new(FormState::default()),
        }
    }

    pub fn set_destination(&self, destination: &str) {
        self.form.borrow_mut().destination = destination.to_string();
    }

    pub fn set_value(&self, value: &str) {
        self.form.borrow_mut().value = value.to_string();
    }

    pub fn select_tab(&self, tab: TransferTab) {
        self.form.borrow_mut().tab = tab;
    }

    pub fn view(&self, bundle: &CapabilityBundle<'_>) -> TransferView {
        let form = self.form.borrow().clone();
        let account = &bundle.account;

        let connected = match account.address {
            Some(address) if account.is_connected() => Some(address),
            _ => None,
        };
        let Some(address) = connected else {
            return TransferView {
                banner: Banner::NotConnected,
                show_connect_button: true,
                disconnect: None,
                token_balance: None,
                native_balance: None,
                tabs: None,
                form_error: form.error,
            };
        };

        let native_symbol = self.chain.native_currency.symbol;
        let form_view = |title: String, value_label: String, state: MutationState<B256>| SendFormView {
            title,
            destination: form.destination.clone(),
            value: form.value.clone(),
            value_label,
            send: ButtonView {
                label: "Send",
                is_loading: state.is_pending(),
            },
            explorer_link: if state.is_success() {
                state
                    .data
                    .map(|hash| self.chain.explorer_tx_url(&hash.to_string()))
            } else {
                None
            },
        };

        TransferView {
            banner: Banner::Connected {
                address: checksum_address(&address),
            },
            show_connect_button: false,
            disconnect: Some(ButtonView {
                label: "Disconnect",
                is_loading: bundle.disconnect.is_pending(),
            }),
            token_balance: Some(self.token_balance_text(bundle)),
            native_balance: Some(self.native_balance_text(bundle)),
            tabs: Some(TabsView {
                active: form.tab,
                native: form_view(
                    format!("Send {native_symbol} tokens"),
                    format!("Value {native_symbol}:"),
                    bundle.native_transaction.state(),
                ),
                contract: form_view(
                    format!("Send {} tokens", self.token_symbol),
                    format!("Value {}:", self.token_symbol),
                    bundle.contract.write.state.clone(),
                ),
            }),
            form_error: form.error,
        }
    }

    /// The connected account's token balance, or a loading/error text.
    pub fn token_balance_text(&self, bundle: &CapabilityBundle<'_>) -> String {
        let Some(owner) = bundle.account.address else {
            return BALANCE_ERROR.to_string();
        };
        let read = &bundle.contract.read;
        let balance = read.read_contract(ReadContractRequest::new("balanceOf", vec![owner.into()]));
        let decimals = read.read_contract(ReadContractRequest::new("decimals", vec![]));

        if balance.is_loading() || decimals.is_loading() {
            return LOADING.to_string();
        }
        if balance.error.is_some() || decimals.error.is_some() {
            return BALANCE_ERROR.to_string();
        }
        let balance = balance.data.as_ref().and_then(|v| v.as_uint());
        let decimals = decimals.data.as_ref().and_then(|v| v.as_u8());
        match (balance, decimals) {
            (Some(balance), Some(decimals)) => {
                format!("{} {}", format_units(balance, decimals), self.token_symbol)
            }
            _ => BALANCE_ERROR.to_string(),
        }
    }

    /// The connected account's native balance on the screen's chain.
    pub fn native_balance_text(&self, bundle: &CapabilityBundle<'_>) -> String {
        let balance = bundle.native_balance.query(BalanceParameters {
            address: bundle.account.address,
            chain_id: Some(self.chain.id),
        });
        if balance.is_loading() {
            return LOADING.to_string();
        }
        match (balance.data, balance.error) {
            (Some(balance), None) => format!("{} {}", balance.formatted, balance.symbol),
            _ => BALANCE_ERROR.to_string(),
        }
    }

    /// Transfers the entered amount of the bound token to the destination.
    ///
    /// Input is validated before anything is sent; a rejected form keeps its
    /// error until the next successful submission. Balances are refetched
    /// once the transfer lands.
    pub fn send_token(&self, bundle: &CapabilityBundle<'_>) -> Result<(), FormError> {
        let request = self.token_transfer(bundle);
        self.record(request.map(|request| {
            bundle
                .contract
                .write
                .write_contract(request, refresh_balances(bundle.query_client))
        }))
    }

    /// Sends the entered amount of the chain's native asset.
    pub fn send_native(&self, bundle: &CapabilityBundle<'_>) -> Result<(), FormError> {
        let params = self.native_transfer(bundle);
        self.record(params.map(|params| {
            bundle
                .native_transaction
                .send_transaction(params, refresh_balances(bundle.query_client))
        }))
    }

    pub fn disconnect(&self, bundle: &CapabilityBundle<'_>) {
        bundle.disconnect.disconnect(MutateOptions::new());
    }

    pub fn open_connect_modal(&self, bundle: &CapabilityBundle<'_>) {
        bundle.contract.connect_modal.open(None);
    }

    fn token_transfer(&self, bundle: &CapabilityBundle<'_>) -> Result<WriteContractRequest, FormError> {
        if !bundle.account.is_connected() {
            return Err(FormError::NotConnected);
        }
        let form = self.form.borrow();
        let to = parse_address(&form.destination).map_err(FormError::InvalidDestination)?;
        let decimals = bundle
            .contract
            .read
            .read_contract(ReadContractRequest::new("decimals", vec![]))
            .data
            .and_then(|v| v.as_u8())
            .ok_or(FormError::DecimalsUnavailable)?;
        let amount = parse_units(&form.value, decimals).map_err(FormError::InvalidValue)?;

        Ok(WriteContractRequest::new("transfer", vec![to.into(), amount.into()]).chain_id(self.chain.id))
    }

    fn native_transfer(
        &self,
        bundle: &CapabilityBundle<'_>,
    ) -> Result<SendTransactionParameters, FormError> {
        if !bundle.account.is_connected() {
            return Err(FormError::NotConnected);
        }
        let form = self.form.borrow();
        let to = parse_address(&form.destination).map_err(FormError::InvalidDestination)?;
        let value: U256 = parse_units(&form.value, self.chain.native_currency.decimals)
            .map_err(FormError::InvalidValue)?;

        Ok(SendTransactionParameters {
            to,
            value,
            chain_id: Some(self.chain.id),
        })
    }

    fn record(&self, outcome: Result<(), FormError>) -> Result<(), FormError> {
        let mut form = self.form.borrow_mut();
        match &outcome {
            Ok(()) => form.error = None,
            Err(e) => {
                tracing::debug!(error = %e, "transfer form rejected");
                form.error = Some(e.to_string());
            }
        }
        outcome
    }
}

fn refresh_balances(client: &Arc<QueryClient>) -> MutateOptions<B256> {
    let client = Arc::clone(client);
    MutateOptions::new().on_success(move |_| {
        client.invalidate(READ_CONTRACT_QUERY);
        client.invalidate(BALANCE_QUERY);
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wallet_session::mock::{MockBackend, MOCK_CONNECTOR_ID};
    use wallet_session::modal::ConnectModal;
    use wallet_session::RequestError;
    use wallet_session::{AppMetadata, SessionConfig, SessionContext, WalletSessionProvider};

    use super::*;
    use crate::aggregator::TransactionAggregator;

    const ALICE: Address = Address::repeat_byte(0x01);
    const BOB: Address = Address::repeat_byte(0x02);

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    fn setup() -> (Arc<MockBackend>, Arc<SessionContext>) {
        let backend = Arc::new(
            MockBackend::new(137, vec![ALICE])
                .with_native_balance(ALICE, ether(2))
                .with_token(PME_CONTRACT_ADDRESS, "PME", 18, &[(ALICE, ether(3) / U256::from(2u64))]),
        );
        let config = SessionConfig::new(Some("page-test".into()), vec![POLYGON], AppMetadata::default())
            .unwrap();
        let provider = WalletSessionProvider::builder(config, backend.clone())
            .modal_options(modal_options())
            .build();
        (backend, provider.context())
    }

    fn connect(context: &SessionContext) {
        context.use_connect().connect(MOCK_CONNECTOR_ID, MutateOptions::new());
        context.client().run_pending();
    }

    #[test]
    fn modal_features_pme_on_polygon() {
        let modal = ConnectModal::new("page-test", modal_options());
        let options = modal.options();
        assert_eq!(options.tokens.get(&137), Some(&PME_CONTRACT_ADDRESS));
        assert_eq!(options.tokens.len(), 1);
        assert!(options.enable_analytics);
        assert!(options.enable_onramp);
    }

    #[test]
    fn disconnected_screen_shows_warning_only() {
        let (_, context) = setup();
        let screen = TransferScreen::default();
        let aggregator = TransactionAggregator::new(context, pme_contract()).children(|b| screen.view(b));

        let view = aggregator.render().unwrap();
        assert_eq!(view.banner, Banner::NotConnected);
        assert!(view.show_connect_button);
        assert!(view.disconnect.is_none());
        assert!(view.token_balance.is_none());
        assert!(view.tabs.is_none());
    }

    #[test]
    fn balances_load_then_render() {
        let (_, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        let aggregator =
            TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));

        let view = aggregator.render().unwrap();
        assert_eq!(
            view.banner,
            Banner::Connected {
                address: checksum_address(&ALICE)
            }
        );
        assert_eq!(view.token_balance.as_deref(), Some(LOADING));
        assert_eq!(view.native_balance.as_deref(), Some(LOADING));

        context.client().run_pending();
        let view = aggregator.render().unwrap();
        assert_eq!(view.token_balance.as_deref(), Some("1.5 PME"));
        assert_eq!(view.native_balance.as_deref(), Some("2 MATIC"));

        let tabs = view.tabs.unwrap();
        assert_eq!(tabs.active, TransferTab::Native);
        assert_eq!(tabs.native.title, "Send MATIC tokens");
        assert_eq!(tabs.contract.value_label, "Value PME:");
        assert_eq!(tabs.contract.value, "0");
    }

    #[test]
    fn unknown_token_contract_shows_balance_error() {
        let (_, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        let aggregator = TransactionAggregator::new(
            context.clone(),
            ContractIdentity::erc20(Address::repeat_byte(0x44)),
        )
        .children(|b| screen.view(b));

        aggregator.render();
        context.client().run_pending();
        let view = aggregator.render().unwrap();
        assert_eq!(view.token_balance.as_deref(), Some(BALANCE_ERROR));
    }

    #[test]
    fn token_send_requires_loaded_decimals() {
        let (backend, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        screen.set_destination(&checksum_address(&BOB));
        screen.set_value("1");
        let aggregator: TransactionAggregator<'_, ()> =
            TransactionAggregator::new(context, pme_contract());

        let err = aggregator.dispatch(|b| screen.send_token(b)).unwrap_err();
        assert!(matches!(err, FormError::DecimalsUnavailable));
        assert!(backend.sent_transactions().is_empty());
    }

    #[test]
    fn token_send_transfers_parsed_amount() {
        let (backend, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        let aggregator =
            TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));
        aggregator.render();
        context.client().run_pending();

        screen.select_tab(TransferTab::Contract);
        screen.set_destination(&checksum_address(&BOB));
        screen.set_value("0.25");
        aggregator.dispatch(|b| screen.send_token(b)).unwrap();
        let tabs = aggregator.render().unwrap().tabs.unwrap();
        assert!(tabs.contract.send.is_loading);
        assert!(!tabs.native.send.is_loading);

        context.client().run_pending();
        assert_eq!(
            backend.token_balance_of(PME_CONTRACT_ADDRESS, BOB),
            ether(1) / U256::from(4u64)
        );

        // The same tick refetched the balances after the transfer landed.
        let view = aggregator.render().unwrap();
        assert_eq!(view.token_balance.as_deref(), Some("1.25 PME"));
        assert!(view.form_error.is_none());

        let hash = backend.sent_transactions()[0].hash;
        let tabs = view.tabs.unwrap();
        assert_eq!(
            tabs.contract.explorer_link,
            Some(format!("https://polygonscan.com/tx/{hash}"))
        );
        assert_eq!(tabs.native.explorer_link, None);
    }

    #[test]
    fn native_send_refreshes_native_balance() {
        let (_, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        let aggregator =
            TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));
        aggregator.render();
        context.client().run_pending();
        assert_eq!(
            aggregator.render().unwrap().native_balance.as_deref(),
            Some("2 MATIC")
        );

        screen.set_destination(&checksum_address(&BOB));
        screen.set_value("0.5");
        aggregator.dispatch(|b| screen.send_native(b)).unwrap();
        context.client().run_pending();

        let view = aggregator.render().unwrap();
        assert_eq!(view.native_balance.as_deref(), Some("1.5 MATIC"));
        assert!(view.tabs.unwrap().native.explorer_link.is_some());
    }

    #[test]
    fn transient_read_failure_recovers() {
        let (backend, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        screen.set_destination(&checksum_address(&BOB));
        screen.set_value("1");
        let aggregator =
            TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));

        // 1. The first decimals fetch hits a transport failure
        backend.fail_next_request(RequestError::Transport("connection reset".into()));
        aggregator.dispatch(|b| {
            b.contract
                .read
                .read_contract(ReadContractRequest::new("decimals", vec![]))
        });
        context.client().run_pending();
        let err = aggregator.dispatch(|b| screen.send_token(b)).unwrap_err();
        assert!(matches!(err, FormError::DecimalsUnavailable));

        // 2. The next render retries it
        aggregator.render();
        context.client().run_pending();
        let view = aggregator.render().unwrap();
        assert_eq!(view.token_balance.as_deref(), Some("1.5 PME"));

        // 3. Sending works again
        aggregator.dispatch(|b| screen.send_token(b)).unwrap();
        context.client().run_pending();
        assert_eq!(backend.token_balance_of(PME_CONTRACT_ADDRESS, BOB), ether(1));
    }

    #[test]
    fn invalid_destination_is_reported_and_nothing_sent() {
        let (backend, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        screen.set_destination("not-an-address");
        screen.set_value("1");
        let aggregator =
            TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));

        let err = aggregator.dispatch(|b| screen.send_native(b)).unwrap_err();
        assert!(matches!(err, FormError::InvalidDestination(_)));
        context.client().run_pending();

        let view = aggregator.render().unwrap();
        assert!(view.form_error.unwrap().starts_with("invalid destination"));
        assert!(backend.sent_transactions().is_empty());
    }

    #[test]
    fn invalid_value_is_reported() {
        let (_, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        screen.set_destination(&checksum_address(&BOB));
        screen.set_value("-1");
        let aggregator: TransactionAggregator<'_, ()> =
            TransactionAggregator::new(context, pme_contract());

        let err = aggregator.dispatch(|b| screen.send_native(b)).unwrap_err();
        assert!(matches!(err, FormError::InvalidValue(_)));
    }

    #[test]
    fn native_send_moves_balance() {
        let (backend, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        screen.set_destination(&checksum_address(&BOB));
        screen.set_value("0.5");
        let aggregator: TransactionAggregator<'_, ()> =
            TransactionAggregator::new(context.clone(), pme_contract());

        aggregator.dispatch(|b| screen.send_native(b)).unwrap();
        context.client().run_pending();

        assert_eq!(backend.native_balance_of(BOB), ether(1) / U256::from(2u64));
        let sent = backend.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, BOB);
        assert!(sent[0].call.is_none());
    }

    #[test]
    fn sends_require_connection() {
        let (_, context) = setup();
        let screen = TransferScreen::default();
        screen.set_destination(&checksum_address(&BOB));
        let aggregator: TransactionAggregator<'_, ()> =
            TransactionAggregator::new(context, pme_contract());

        let err = aggregator.dispatch(|b| screen.send_native(b)).unwrap_err();
        assert!(matches!(err, FormError::NotConnected));
    }

    #[test]
    fn disconnect_handler_ends_session() {
        let (_, context) = setup();
        connect(&context);
        let screen = TransferScreen::default();
        let aggregator =
            TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));

        aggregator.dispatch(|b| screen.disconnect(b));
        assert!(aggregator.render().unwrap().disconnect.unwrap().is_loading);
        context.client().run_pending();
        assert_eq!(aggregator.render().unwrap().banner, Banner::NotConnected);
    }
}

//! Cross-crate integration tests exercising the full pipeline:
//! configuration -> provider -> aggregator -> bundle -> mock chain.
//!
//! These go through the public API only, the same surface a host
//! application renders against, to catch regressions at crate boundaries.

use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, B256, U256};
use chain_eth::abi::AbiValue;
use chain_eth::address::checksum_address;
use chain_eth::chains::{MAINNET, POLYGON};
use tx_aggregator::page::{
    modal_options, pme_contract, Banner, TransferScreen, BALANCE_ERROR, PME_CONTRACT_ADDRESS,
};
use tx_aggregator::{ContractIdentity, ReadContractRequest, TransactionAggregator, WriteContractRequest};
use wallet_session::config::PROJECT_ID_VAR;
use wallet_session::mock::{MockBackend, MOCK_CONNECTOR_ID};
use wallet_session::state::cookie_to_initial_state;
use wallet_session::storage::CookieStorage;
use wallet_session::{
    AppMetadata, MutateOptions, RequestError, SessionConfig, SessionContext, SessionError,
    WalletSessionProvider,
};

const HOLDER: Address = Address::repeat_byte(0x11);
const RECIPIENT: Address = Address::repeat_byte(0x22);

fn holdings() -> U256 {
    // 1,234,567.89 tokens with 18 decimals.
    U256::from(1_234_567_890_000_000_000_000_000u128)
}

fn config() -> SessionConfig {
    SessionConfig::from_vars(|name| (name == PROJECT_ID_VAR).then(|| "pipeline".to_string()))
        .unwrap()
}

fn backend() -> Arc<MockBackend> {
    Arc::new(
        MockBackend::new(POLYGON.id, vec![HOLDER])
            .with_native_balance(HOLDER, U256::from(5_000_000_000_000_000_000u128))
            .with_token(PME_CONTRACT_ADDRESS, "PME", 18, &[(HOLDER, holdings())]),
    )
}

fn connected_context(backend: Arc<MockBackend>) -> Arc<SessionContext> {
    let provider = WalletSessionProvider::builder(config(), backend)
        .modal_options(modal_options())
        .build();
    let context = provider.context();
    context.use_connect().connect(MOCK_CONNECTOR_ID, MutateOptions::new());
    context.client().run_pending();
    assert!(context.use_account().is_connected());
    context
}

// ─── Configuration ─────────────────────────────────────────────────

#[test]
fn missing_project_id_yields_no_provider() {
    let err = SessionConfig::from_vars(|_| None).unwrap_err();
    assert!(matches!(err, SessionError::MissingProjectId));

    let err = SessionConfig::new(Some("  ".into()), vec![POLYGON], AppMetadata::default())
        .unwrap_err();
    assert!(matches!(err, SessionError::MissingProjectId));
}

#[test]
fn default_configuration_targets_polygon() {
    let config = config();
    assert_eq!(config.project_id(), "pipeline");
    assert_eq!(config.default_chain().id, POLYGON.id);
    assert_eq!(config.metadata(), &AppMetadata::default());
}

// ─── Reads: provider -> aggregator -> bound read ───────────────────

#[test]
fn erc20_reads_through_bound_reader() {
    let context = connected_context(backend());
    let aggregator: TransactionAggregator<'_, ()> =
        TransactionAggregator::new(context.clone(), pme_contract());

    // 1. First observation schedules both reads
    let read = |name: &str, args: Vec<AbiValue>| {
        aggregator.dispatch(|b| b.contract.read.read_contract(ReadContractRequest::new(name, args)))
    };
    assert!(read("decimals", vec![]).is_loading());
    assert!(read("balanceOf", vec![HOLDER.into()]).is_loading());

    // 2. Host tick runs the fetches
    assert_eq!(context.client().run_pending(), 2);

    // 3. Results are cached under the same keys
    assert_eq!(read("decimals", vec![]).data, Some(AbiValue::Uint(U256::from(18u8))));
    assert_eq!(
        read("balanceOf", vec![HOLDER.into()]).data,
        Some(AbiValue::Uint(holdings()))
    );
}

#[test]
fn caller_address_cannot_redirect_a_read() {
    let context = connected_context(backend());
    let aggregator: TransactionAggregator<'_, ()> =
        TransactionAggregator::new(context.clone(), pme_contract());

    // The caller names a contract the chain does not know; the read still
    // lands on the bound token.
    let request = || ReadContractRequest {
        address: Some(Address::repeat_byte(0x99)),
        ..ReadContractRequest::new("decimals", vec![])
    };
    aggregator.dispatch(|b| b.contract.read.read_contract(request()));
    context.client().run_pending();
    let result = aggregator.dispatch(|b| b.contract.read.read_contract(request()));
    assert!(result.is_success());
    assert_eq!(result.data, Some(AbiValue::Uint(U256::from(18u8))));
}

// ─── Writes: bound writer -> mock chain ────────────────────────────

#[test]
fn transfer_goes_pending_then_succeeds() {
    let backend = backend();
    let context = connected_context(backend.clone());
    let aggregator = TransactionAggregator::new(context.clone(), pme_contract())
        .children(|b| b.contract.write.state.clone());

    let settled: Arc<Mutex<Vec<&str>>> = Arc::default();
    let log = Arc::clone(&settled);
    let hash: Arc<Mutex<Option<B256>>> = Arc::default();
    let seen = Arc::clone(&hash);

    // 1. Issue the transfer
    aggregator.dispatch(|b| {
        b.contract.write.write_contract(
            WriteContractRequest::new("transfer", vec![RECIPIENT.into(), U256::from(1_000u64).into()]),
            MutateOptions::new()
                .on_success(move |h| *seen.lock().unwrap() = Some(*h))
                .on_settled(move || log.lock().unwrap().push("settled")),
        )
    });

    // 2. Pending immediately, nothing on chain yet
    assert!(aggregator.render().unwrap().is_pending());
    assert!(backend.sent_transactions().is_empty());

    // 3. Host tick: success with a transaction hash
    context.client().run_pending();
    let state = aggregator.render().unwrap();
    assert!(state.is_success());
    assert_eq!(state.data, *hash.lock().unwrap());
    assert_eq!(*settled.lock().unwrap(), vec!["settled"]);

    // 4. The transaction hit the bound contract
    let sent = backend.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].hash, state.data.unwrap());
    assert_eq!(sent[0].to, PME_CONTRACT_ADDRESS);
    assert_eq!(
        backend.token_balance_of(PME_CONTRACT_ADDRESS, RECIPIENT),
        U256::from(1_000u64)
    );
}

#[test]
fn overspending_transfer_settles_with_error() {
    let backend = backend();
    let context = connected_context(backend.clone());
    let aggregator = TransactionAggregator::new(context.clone(), pme_contract())
        .children(|b| b.contract.write.state.clone());

    aggregator.dispatch(|b| {
        b.contract.write.write_contract(
            WriteContractRequest::new("transfer", vec![RECIPIENT.into(), (holdings() + U256::from(1u8)).into()]),
            MutateOptions::new(),
        )
    });
    context.client().run_pending();

    let state = aggregator.render().unwrap();
    assert!(state.is_error());
    assert_eq!(
        state.error,
        Some(RequestError::Reverted("ERC20: transfer amount exceeds balance".into()))
    );
    assert!(backend.sent_transactions().is_empty());
}

#[test]
fn rejected_transfer_surfaces_user_rejection() {
    let backend = backend();
    let context = connected_context(backend.clone());
    let aggregator = TransactionAggregator::new(context.clone(), pme_contract())
        .children(|b| b.contract.write.state.clone());

    backend.reject_next_request();
    aggregator.dispatch(|b| {
        b.contract.write.write_contract(
            WriteContractRequest::new("transfer", vec![RECIPIENT.into(), U256::from(1u8).into()]),
            MutateOptions::new(),
        )
    });
    context.client().run_pending();
    assert_eq!(aggregator.render().unwrap().error, Some(RequestError::UserRejected));

    // A fresh write after reset starts from idle
    aggregator.dispatch(|b| b.contract.write.reset());
    assert!(aggregator.render().unwrap().is_idle());
}

#[test]
fn write_on_other_chain_is_refused() {
    let context = connected_context(backend());
    let aggregator = TransactionAggregator::new(context.clone(), pme_contract())
        .children(|b| b.contract.write.state.clone());

    aggregator.dispatch(|b| {
        b.contract.write.write_contract(
            WriteContractRequest::new("transfer", vec![RECIPIENT.into(), U256::from(1u8).into()])
                .chain_id(MAINNET.id),
            MutateOptions::new(),
        )
    });
    context.client().run_pending();
    assert_eq!(
        aggregator.render().unwrap().error,
        Some(RequestError::ChainMismatch {
            current: POLYGON.id,
            requested: MAINNET.id
        })
    );
}

// ─── Rendering ─────────────────────────────────────────────────────

#[test]
fn aggregator_without_children_renders_nothing() {
    let context = connected_context(backend());
    let aggregator: TransactionAggregator<'_, String> =
        TransactionAggregator::new(context, ContractIdentity::erc20(PME_CONTRACT_ADDRESS));
    assert_eq!(aggregator.render(), None);
}

#[test]
fn disconnected_account_then_connect_and_disconnect() {
    let provider = WalletSessionProvider::builder(config(), backend()).build();
    let context = provider.context();
    let aggregator = TransactionAggregator::new(context.clone(), pme_contract())
        .children(|b| b.account.clone());

    // 1. Disconnected: disconnect is a no-op
    assert!(!aggregator.render().unwrap().is_connected());
    aggregator.dispatch(|b| b.disconnect.disconnect(MutateOptions::new()));
    context.client().run_pending();
    assert!(aggregator.render().unwrap().is_disconnected());

    // 2. Connect moves toward connected
    aggregator.dispatch(|b| b.connect.connect(MOCK_CONNECTOR_ID, MutateOptions::new()));
    assert!(aggregator.render().unwrap().is_connecting());
    context.client().run_pending();
    assert_eq!(aggregator.render().unwrap().address, Some(HOLDER));

    // 3. Disconnect for real
    aggregator.dispatch(|b| b.disconnect.disconnect(MutateOptions::new()));
    context.client().run_pending();
    assert!(aggregator.render().unwrap().is_disconnected());
}

#[test]
fn transfer_screen_end_to_end() {
    let backend = backend();
    let context = connected_context(backend.clone());
    let screen = TransferScreen::default();
    let aggregator =
        TransactionAggregator::new(context.clone(), pme_contract()).children(|b| screen.view(b));

    aggregator.render();
    context.client().run_pending();
    let view = aggregator.render().unwrap();
    assert_eq!(view.token_balance.as_deref(), Some("1234567.89 PME"));
    assert_eq!(view.native_balance.as_deref(), Some("5 MATIC"));

    screen.set_destination(&checksum_address(&RECIPIENT));
    screen.set_value("0.89");
    aggregator.dispatch(|b| screen.send_token(b)).unwrap();
    context.client().run_pending();

    let view = aggregator.render().unwrap();
    assert_eq!(view.token_balance.as_deref(), Some("1234567 PME"));
    assert_ne!(view.token_balance.as_deref(), Some(BALANCE_ERROR));
}

// ─── Session persistence ───────────────────────────────────────────

#[test]
fn session_survives_reload_through_cookie() {
    let backend = backend();

    // 1. First visit: connect with cookie storage
    let storage = Arc::new(CookieStorage::new());
    let provider = WalletSessionProvider::builder(config(), backend.clone())
        .storage(storage.clone())
        .build();
    let context = provider.context();
    context.use_connect().connect(MOCK_CONNECTOR_ID, MutateOptions::new());
    context.client().run_pending();

    let set_cookie = storage.take_set_cookie_headers();
    let cookie_header = set_cookie
        .last()
        .and_then(|h| h.split(';').next())
        .unwrap()
        .to_string();

    // 2. Reload: hydrate from the request cookie
    let config = config();
    let initial = cookie_to_initial_state(&config, Some(cookie_header.as_str()));
    assert!(initial.is_some());
    let provider = WalletSessionProvider::builder(config, backend)
        .storage(Arc::new(CookieStorage::from_header(&cookie_header)))
        .initial_state(initial)
        .build();
    let context = provider.context();
    let aggregator = TransactionAggregator::new(context.clone(), pme_contract())
        .children(|b| screen_banner(&b.account));
    assert!(context.use_account().is_reconnecting());

    // 3. Reconnect resumes the stored connection
    context.reconnect();
    context.client().run_pending();
    assert_eq!(
        aggregator.render(),
        Some(Banner::Connected {
            address: checksum_address(&HOLDER)
        })
    );
}

fn screen_banner(account: &wallet_session::AccountState) -> Banner {
    match account.address {
        Some(address) if account.is_connected() => Banner::Connected {
            address: checksum_address(&address),
        },
        _ => Banner::NotConnected,
    }
}

/*
[INPUT]:  Test configuration and fake backend requirements
[OUTPUT]: Shared fixtures: layers, fake Auth API, wired session stores
[POS]:    Test infrastructure - shared across all integration test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for launchpad-wallet-session tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use launchpad_wallet_session::{
    AuthApi, GeneratedMessage, Layer, LayerRegistry, LayerSource, LayerType, LinkWalletData,
    LoginData, MemoryStorage, MockWalletProvider, Network, Result, SessionConfig, SessionDeps,
    SessionStorage, SessionStore, TokenPair, UserLayerSummary, UserSummary, WalletAuthError,
    WalletAuthRequest, WalletConnector, WalletKind, WalletProviders,
};
use tokio::sync::{Notify, Semaphore};

pub const BTC_MAIN: &str = "btc-main";
pub const BTC_TEST: &str = "btc-test";
pub const CITREA_TEST: &str = "citrea-test";
pub const FRACTAL_MAIN: &str = "fractal-main";

pub const BTC_ADDRESS: &str = "bc1qtestaddress";
pub const EVM_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn layer(id: &str, layer: LayerType, network: Network, name: &str) -> Layer {
    Layer {
        id: id.to_string(),
        layer,
        network,
        name: name.to_string(),
        coming_soon: false,
    }
}

pub fn sample_layers() -> Vec<Layer> {
    vec![
        layer(BTC_MAIN, LayerType::Bitcoin, Network::Mainnet, "Bitcoin"),
        layer(BTC_TEST, LayerType::Bitcoin, Network::Testnet, "Bitcoin Testnet"),
        layer(CITREA_TEST, LayerType::Citrea, Network::Testnet, "Citrea Testnet"),
        layer(FRACTAL_MAIN, LayerType::Fractal, Network::Mainnet, "Fractal"),
    ]
}

/// Scriptable in-process Auth API
pub struct FakeAuthApi {
    pub login_user_layer: Mutex<Option<String>>,
    pub link_user_layer: Mutex<Option<String>>,
    pub link_tokens: Mutex<Option<TokenPair>>,
    pub conflict: AtomicBool,
    pub reject_login: AtomicBool,
    gated: AtomicBool,
    gate: Semaphore,
    link_gated: AtomicBool,
    link_parked: Notify,
    link_gate: Notify,
    calls: Mutex<Vec<String>>,
}

impl FakeAuthApi {
    pub fn new() -> Self {
        Self {
            login_user_layer: Mutex::new(Some("user-layer-1".to_string())),
            link_user_layer: Mutex::new(Some("user-layer-2".to_string())),
            link_tokens: Mutex::new(None),
            conflict: AtomicBool::new(false),
            reject_login: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            link_gated: AtomicBool::new(false),
            link_parked: Notify::new(),
            link_gate: Notify::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Park every challenge request until [`Self::release`] is called
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    /// Park every link request until [`Self::release_link`] is called
    pub fn hold_link(&self) {
        self.link_gated.store(true, Ordering::SeqCst);
    }

    /// Resolves once a link request is parked
    pub async fn link_parked(&self) {
        self.link_parked.notified().await;
    }

    pub fn release_link(&self) {
        self.link_gate.notify_one();
    }

    pub fn set_conflict(&self, conflict: bool) {
        self.conflict.store(conflict, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn generate_message(&self, address: &str) -> Result<GeneratedMessage> {
        self.record("generate_message");
        if self.gated.load(Ordering::SeqCst) {
            self.gate.acquire().await.unwrap().forget();
        }
        Ok(GeneratedMessage {
            message: format!("Sign this message to log in: {address}"),
        })
    }

    async fn login(&self, request: &WalletAuthRequest) -> Result<LoginData> {
        self.record("login");
        if self.reject_login.load(Ordering::SeqCst) {
            return Err(WalletAuthError::Authentication {
                message: "Invalid signature".to_string(),
            });
        }
        Ok(LoginData {
            tokens: TokenPair::new(
                format!("access-{}", request.layer_id),
                format!("refresh-{}", request.layer_id),
            ),
            user: UserSummary {
                id: "user-1".to_string(),
            },
            user_layer: self
                .login_user_layer
                .lock()
                .unwrap()
                .clone()
                .map(|id| UserLayerSummary { id }),
        })
    }

    async fn link_wallet(
        &self,
        access_token: &str,
        _request: &WalletAuthRequest,
    ) -> Result<LinkWalletData> {
        self.record(&format!("link_wallet:{access_token}"));
        if self.link_gated.load(Ordering::SeqCst) {
            self.link_parked.notify_one();
            self.link_gate.notified().await;
        }
        if self.conflict.load(Ordering::SeqCst) {
            return Ok(LinkWalletData {
                has_already_been_linked_to_another_user: true,
                ..LinkWalletData::default()
            });
        }
        Ok(LinkWalletData {
            tokens: self.link_tokens.lock().unwrap().clone(),
            user_layer: self
                .link_user_layer
                .lock()
                .unwrap()
                .clone()
                .map(|id| UserLayerSummary { id }),
            ..LinkWalletData::default()
        })
    }

    async fn confirm_link(
        &self,
        access_token: &str,
        request: &WalletAuthRequest,
    ) -> Result<serde_json::Value> {
        self.record(&format!("confirm_link:{access_token}"));
        Ok(serde_json::json!({
            "address": request.address,
            "layerId": request.layer_id,
        }))
    }
}

#[async_trait]
impl LayerSource for FakeAuthApi {
    async fn fetch_layers(&self) -> Result<Vec<Layer>> {
        self.record("fetch_layers");
        Ok(sample_layers())
    }
}

pub struct Harness {
    pub store: SessionStore,
    pub api: Arc<FakeAuthApi>,
    pub storage: Arc<MemoryStorage>,
    pub btc_wallet: Arc<MockWalletProvider>,
    pub evm_wallet: Arc<MockWalletProvider>,
}

pub fn config() -> SessionConfig {
    SessionConfig::new("http://localhost:4000/api/v1")
}

pub fn btc_wallet() -> Arc<MockWalletProvider> {
    Arc::new(MockWalletProvider::new(WalletKind::Utxo, BTC_ADDRESS, "btc-signature"))
}

pub fn evm_wallet() -> Arc<MockWalletProvider> {
    Arc::new(MockWalletProvider::new(WalletKind::Evm, EVM_ADDRESS, "0xevm-signature"))
}

pub fn store_with(
    api: Arc<FakeAuthApi>,
    storage: Arc<MemoryStorage>,
    providers: WalletProviders,
    config: &SessionConfig,
) -> SessionStore {
    let deps = SessionDeps {
        registry: Arc::new(LayerRegistry::new(api.clone())),
        api: api.clone(),
        connector: WalletConnector::new(providers),
        storage: storage as Arc<dyn SessionStorage>,
    };
    let store = SessionStore::init(deps, config);
    store.set_layers(sample_layers());
    store
}

/// Fresh store with both wallet kinds installed and layers loaded
pub fn harness() -> Harness {
    init_tracing();
    let api = Arc::new(FakeAuthApi::new());
    let storage = Arc::new(MemoryStorage::new());
    let btc = btc_wallet();
    let evm = evm_wallet();
    let providers = WalletProviders::new().with(btc.clone()).with(evm.clone());
    let store = store_with(api.clone(), storage.clone(), providers, &config());

    Harness {
        store,
        api,
        storage,
        btc_wallet: btc,
        evm_wallet: evm,
    }
}

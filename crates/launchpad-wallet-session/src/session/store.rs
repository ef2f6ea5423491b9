/*
[INPUT]:  Layer registry, Auth API, wallet connector, persisted storage
[OUTPUT]: Authenticated session state observable by the UI
[POS]:    Session layer - single source of truth for wallet auth status
[UPDATE]: When connect/disconnect/link/logout semantics change
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{WalletConnector, WalletProviders};
use crate::config::SessionConfig;
use crate::http::{AuthApi, Result, WalletAuthError};
use crate::layers::LayerRegistry;
use crate::session::guard::LayerGuards;
use crate::session::storage::{SessionPersistence, SessionStorage};
use crate::types::{
    AuthState, ConnectedWallet, Layer, PendingWalletLink, SessionState, TokenPair,
    WalletAuthRequest,
};

/// Collaborators injected into a [`SessionStore`]
#[derive(Clone)]
pub struct SessionDeps {
    pub registry: Arc<LayerRegistry>,
    pub api: Arc<dyn AuthApi>,
    pub connector: WalletConnector,
    pub storage: Arc<dyn SessionStorage>,
}

/// What a successful backend call contributes to the auth state.
/// `None` keeps the current value.
struct AuthUpdate {
    tokens: Option<TokenPair>,
    user_id: Option<Option<String>>,
    user_layer_id: Option<Option<String>>,
}

/// Wallet session store.
///
/// Every mutation goes through here and is published on a watch channel.
/// Operations on the same layer are single-flight; a second concurrent call
/// fails with [`WalletAuthError::OperationInProgress`].
pub struct SessionStore {
    registry: Arc<LayerRegistry>,
    api: Arc<dyn AuthApi>,
    connector: WalletConnector,
    persistence: SessionPersistence,
    state: watch::Sender<SessionState>,
    guards: LayerGuards,
    busy: AtomicUsize,
    epoch: AtomicU64,
    pending_link_ttl: chrono::Duration,
}

/// Holds `loading = true` while any operation is in flight
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let busy = &self.store.busy;
        self.store.state.send_modify(|state| {
            let remaining = busy.fetch_sub(1, Ordering::SeqCst) - 1;
            state.auth_state.loading = remaining > 0;
        });
    }
}

impl SessionStore {
    /// Create a store, restoring persisted state unless the config disables it.
    ///
    /// Unreadable storage yields the logged-out default; this never fails.
    pub fn init(deps: SessionDeps, config: &SessionConfig) -> Self {
        let persistence = SessionPersistence::new(deps.storage, config.storage_keys());
        let initial = if config.restore_wallet_state {
            persistence.load_or_default()
        } else {
            SessionState::default()
        };
        info!(
            authenticated = initial.auth_state.authenticated,
            wallets = initial.connected_wallets.len(),
            "session store initialized"
        );

        let (state, _) = watch::channel(initial);
        Self {
            registry: deps.registry,
            api: deps.api,
            connector: deps.connector,
            persistence,
            state,
            guards: LayerGuards::new(),
            busy: AtomicUsize::new(0),
            epoch: AtomicU64::new(0),
            pending_link_ttl: config.pending_link_ttl(),
        }
    }

    /// Wire an HTTP Auth API client and file storage from configuration.
    pub fn from_config(config: &SessionConfig, providers: WalletProviders) -> Result<Self> {
        let client = Arc::new(config.auth_client()?);
        let deps = SessionDeps {
            registry: Arc::new(LayerRegistry::new(client.clone())),
            api: client,
            connector: WalletConnector::new(providers),
            storage: Arc::new(config.file_storage()?),
        };
        Ok(Self::init(deps, config))
    }

    /// Persist the final state and release the store.
    pub fn teardown(self) -> Result<()> {
        let snapshot = self.snapshot();
        if snapshot.auth_state.authenticated {
            self.persistence.save_state(&snapshot)?;
        }
        debug!("session store torn down");
        Ok(())
    }

    pub fn registry(&self) -> &Arc<LayerRegistry> {
        &self.registry
    }

    pub fn layers(&self) -> Vec<Layer> {
        self.registry.layers()
    }

    /// Replace the registry's layers and drop wallets on layers it no longer has.
    pub fn set_layers(&self, layers: Vec<Layer>) {
        self.registry.set_layers(layers);
        self.reconcile_with_registry();
    }

    /// Load layers through the registry cache, then reconcile wallets.
    pub async fn load_layers(&self) -> Result<Vec<Layer>> {
        let layers = self.registry.load().await?;
        self.reconcile_with_registry();
        Ok(layers)
    }

    /// Refetch layers, then reconcile wallets.
    pub async fn refresh_layers(&self) -> Result<Vec<Layer>> {
        let layers = self.registry.refresh().await?;
        self.reconcile_with_registry();
        Ok(layers)
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change, including `loading`.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.borrow().auth_state.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().auth_state.authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().auth_state.loading
    }

    pub fn connected_wallets(&self) -> Vec<ConnectedWallet> {
        self.state.borrow().connected_wallets.clone()
    }

    pub fn is_wallet_connected(&self, layer_id: &str) -> bool {
        self.state.borrow().is_wallet_connected(layer_id)
    }

    pub fn wallet_for_layer(&self, layer_id: &str) -> Option<ConnectedWallet> {
        self.state.borrow().wallet_for_layer(layer_id).cloned()
    }

    pub fn selected_layer_id(&self) -> Option<String> {
        self.state.borrow().selected_layer_id.clone()
    }

    pub fn set_selected_layer_id(&self, layer_id: impl Into<String>) {
        let layer_id = layer_id.into();
        self.state
            .send_modify(|state| state.selected_layer_id = Some(layer_id));
        // Logged-out selection stays in memory; logout leaves no keys behind.
        if self.is_authenticated() {
            self.persist_state();
        }
    }

    /// Wallet bound to the currently selected layer
    pub fn wallet_for_selected_layer(&self) -> Option<ConnectedWallet> {
        let state = self.state.borrow();
        let selected = state.selected_layer_id.as_deref()?;
        state.wallet_for_layer(selected).cloned()
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.state.send_modify(|state| {
            self.busy.fetch_add(1, Ordering::SeqCst);
            state.auth_state.loading = true;
        });
        LoadingGuard { store: self }
    }

    fn persist_state(&self) {
        let snapshot = self.snapshot();
        if let Err(e) = self.persistence.save_state(&snapshot) {
            warn!(error = %e, "failed to persist wallet state");
        }
    }

    /// Fails if a logout happened since `epoch` was read.
    fn ensure_same_session(&self, epoch: u64) -> Result<()> {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return Err(WalletAuthError::Authentication {
                message: "Session ended while linking".to_string(),
            });
        }
        Ok(())
    }

    fn access_token(&self) -> Result<String> {
        self.state
            .borrow()
            .auth_state
            .tokens
            .access_token
            .clone()
            .ok_or_else(|| WalletAuthError::Authentication {
                message: "Session has no access token".to_string(),
            })
    }

    /// Connect the wallet for `layer_id` and authenticate it.
    ///
    /// With `is_linking` on an authenticated session the wallet is attached to
    /// the current account; otherwise it logs in and replaces the session
    /// tokens. If the backend reports the address as bound to another account,
    /// the link is staged and [`WalletAuthError::AlreadyLinked`] is returned.
    pub async fn connect_wallet(&self, layer_id: &str, is_linking: bool) -> Result<ConnectedWallet> {
        let layer = self.registry.resolve(layer_id)?;
        let kind = layer
            .wallet_kind()
            .ok_or_else(|| WalletAuthError::UnsupportedLayer {
                layer_id: layer.id.clone(),
                layer: layer.layer,
            })?;

        let _permit = self.guards.try_acquire(layer_id)?;
        let _loading = self.begin_loading();
        let epoch = self.epoch.load(Ordering::SeqCst);
        let linking = is_linking && self.is_authenticated();
        debug!(%layer_id, %kind, linking, "connecting wallet");

        let connection = self
            .connector
            .connect(kind, self.api.as_ref())
            .await
            .inspect_err(|e| warn!(%layer_id, error = %e, "wallet provider failed"))?;

        let request = WalletAuthRequest {
            address: connection.address.clone(),
            layer_id: layer.id.clone(),
            signed_message: connection.signed_message.clone(),
            pubkey: connection.pubkey.clone(),
        };

        let update = if linking {
            let access_token = self.access_token()?;
            let owner_user_id = self.state.borrow().auth_state.user_id.clone();
            let data = self.api.link_wallet(&access_token, &request).await?;
            // Nothing is staged or committed for a session that has ended.
            self.ensure_same_session(epoch)?;

            if data.has_already_been_linked_to_another_user {
                let pending = PendingWalletLink {
                    address: request.address,
                    layer_id: request.layer_id,
                    signed_message: request.signed_message,
                    pubkey: request.pubkey,
                    owner_user_id,
                    created_at: chrono::Utc::now(),
                };
                self.persistence.save_pending_link(&pending)?;
                warn!(%layer_id, address = %pending.address, "wallet linked to another account, link staged");
                return Err(WalletAuthError::AlreadyLinked {
                    pending: Box::new(pending),
                });
            }

            AuthUpdate {
                tokens: data.tokens,
                user_id: data.user.map(|user| Some(user.id)),
                user_layer_id: data.user_layer.map(|user_layer| Some(user_layer.id)),
            }
        } else {
            let data = self.api.login(&request).await?;
            if !data.tokens.is_complete() {
                return Err(WalletAuthError::InvalidResponse(
                    "login response missing session tokens".to_string(),
                ));
            }
            AuthUpdate {
                tokens: Some(data.tokens),
                user_id: Some(Some(data.user.id)),
                user_layer_id: Some(data.user_layer.map(|user_layer| user_layer.id)),
            }
        };

        let wallet = ConnectedWallet::new(connection.address, &layer);
        self.commit_connection(wallet.clone(), update);
        info!(%layer_id, address = %wallet.address, linking, "wallet connected");
        Ok(wallet)
    }

    fn commit_connection(&self, wallet: ConnectedWallet, update: AuthUpdate) {
        let layer_id = wallet.layer_id.clone();
        let tokens = update.tokens.filter(TokenPair::is_complete);
        if let Some(tokens) = &tokens {
            if let Err(e) = self.persistence.save_tokens(tokens) {
                warn!(error = %e, "failed to persist session tokens");
            }
        }

        self.state.send_modify(|state| {
            state.upsert_wallet(wallet);
            // Evaluated on the set that already includes the new wallet.
            let only_bitcoin = state.has_only_bitcoin();

            let auth = &mut state.auth_state;
            if let Some(tokens) = tokens {
                auth.tokens = tokens;
            }
            if let Some(user_id) = update.user_id {
                auth.user_id = user_id;
            }
            if only_bitcoin {
                auth.user_layer_id = None;
            } else if let Some(user_layer_id) = update.user_layer_id {
                auth.user_layer_id = user_layer_id;
            }
            auth.layer_id = Some(layer_id);
            auth.authenticated = true;
        });
        self.persist_state();
    }

    /// Remove the wallet for `layer_id`. Removing the last wallet logs out.
    pub async fn disconnect_wallet(&self, layer_id: &str) -> Result<Option<ConnectedWallet>> {
        let _permit = self.guards.try_acquire(layer_id)?;

        let mut removed = None;
        self.state.send_if_modified(|state| {
            removed = state.remove_wallet(layer_id);
            removed.is_some()
        });

        if self.state.borrow().connected_wallets.is_empty() {
            self.logout();
        } else {
            self.persist_state();
        }

        if let Some(wallet) = &removed {
            info!(%layer_id, address = %wallet.address, "wallet disconnected");
        }
        Ok(removed)
    }

    /// Staged link, if any. Expired links are discarded.
    pub fn pending_link(&self) -> Result<Option<PendingWalletLink>> {
        let Some(link) = self.persistence.load_pending_link()? else {
            return Ok(None);
        };
        if link.is_expired(self.pending_link_ttl) {
            info!(layer_id = %link.layer_id, "pending wallet link expired");
            self.persistence.clear_pending_link()?;
            return Ok(None);
        }
        Ok(Some(link))
    }

    /// Drop the staged link without contacting the backend.
    pub fn cancel_linking(&self) -> Result<Option<PendingWalletLink>> {
        let pending = self.pending_link()?;
        self.persistence.clear_pending_link()?;
        if let Some(link) = &pending {
            info!(layer_id = %link.layer_id, "pending wallet link cancelled");
        }
        Ok(pending)
    }

    /// Commit the staged link after explicit user confirmation.
    ///
    /// Attaches the wallet to the current account; session tokens are left
    /// untouched.
    pub async fn proceed_with_linking(&self) -> Result<serde_json::Value> {
        let _loading = self.begin_loading();

        let pending = self.pending_link()?.ok_or(WalletAuthError::NoPendingLink)?;
        let layer = self.registry.resolve(&pending.layer_id)?;
        let _permit = self.guards.try_acquire(&layer.id)?;
        let access_token = self.access_token()?;
        let epoch = self.epoch.load(Ordering::SeqCst);

        let user_id = self.state.borrow().auth_state.user_id.clone();
        if !pending.is_owned_by(user_id.as_deref()) {
            warn!(layer_id = %pending.layer_id, "pending wallet link staged by another account, discarding");
            self.persistence.clear_pending_link()?;
            return Err(WalletAuthError::Authentication {
                message: "Pending wallet link belongs to another session".to_string(),
            });
        }

        let data = self
            .api
            .confirm_link(&access_token, &WalletAuthRequest::from(&pending))
            .await?;
        self.ensure_same_session(epoch)?;

        let wallet = ConnectedWallet::new(pending.address, &layer);
        self.state.send_modify(|state| state.upsert_wallet(wallet));
        if let Err(e) = self.persistence.clear_pending_link() {
            warn!(error = %e, "failed to clear pending wallet link");
        }
        self.persist_state();

        info!(layer_id = %layer.id, "wallet link confirmed");
        Ok(data)
    }

    /// Drop wallets whose layer the loaded registry no longer knows.
    ///
    /// Does nothing before the registry holds at least one layer.
    pub fn reconcile_with_registry(&self) -> Vec<ConnectedWallet> {
        if self.registry.layers().is_empty() {
            return Vec::new();
        }

        let mut stale = Vec::new();
        self.state.send_if_modified(|state| {
            state.connected_wallets.retain(|wallet| {
                let known = self.registry.contains(&wallet.layer_id);
                if !known {
                    stale.push(wallet.clone());
                }
                known
            });
            !stale.is_empty()
        });

        if stale.is_empty() {
            return stale;
        }
        for wallet in &stale {
            warn!(layer_id = %wallet.layer_id, "dropping wallet for unknown layer");
        }

        if self.state.borrow().connected_wallets.is_empty() {
            self.logout();
        } else {
            self.persist_state();
        }
        stale
    }

    /// Clear wallets, auth state, selection and every persisted key.
    /// Idempotent.
    pub fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let busy = &self.busy;
        self.state.send_modify(|state| {
            *state = SessionState::default();
            state.auth_state.loading = busy.load(Ordering::SeqCst) > 0;
        });
        if let Err(e) = self.persistence.clear_all() {
            warn!(error = %e, "failed to clear persisted session");
        }
        info!("logged out");
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.state.borrow())
            .field("registry", &self.registry)
            .finish()
    }
}

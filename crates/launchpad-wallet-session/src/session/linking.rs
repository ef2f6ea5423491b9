/*
[INPUT]:  Connect results and user confirm/cancel decisions
[OUTPUT]: Tagged connect outcomes and committed or discarded wallet links
[POS]:    Session layer - glue between the already-linked conflict and confirmation
[UPDATE]: When the conflict resolution flow changes
*/

use crate::http::{Result, WalletAuthError};
use crate::session::SessionStore;
use crate::types::{ConnectedWallet, PendingWalletLink};

/// Result of a connect attempt, with the already-linked conflict lifted out
/// of the error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(ConnectedWallet),
    /// Address belongs to another account; waiting on the user
    NeedsConfirmation(PendingWalletLink),
}

/// Drives the already-linked flow. Holds no state of its own; the staged
/// link lives in session storage.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'a> {
    store: &'a SessionStore,
}

impl<'a> LinkResolver<'a> {
    pub fn new(store: &'a SessionStore) -> Self {
        Self { store }
    }

    /// Connect, turning [`WalletAuthError::AlreadyLinked`] into
    /// [`ConnectOutcome::NeedsConfirmation`]. Other failures pass through.
    pub async fn connect(&self, layer_id: &str, is_linking: bool) -> Result<ConnectOutcome> {
        match self.store.connect_wallet(layer_id, is_linking).await {
            Ok(wallet) => Ok(ConnectOutcome::Connected(wallet)),
            Err(WalletAuthError::AlreadyLinked { pending }) => {
                Ok(ConnectOutcome::NeedsConfirmation(*pending))
            }
            Err(e) => Err(e),
        }
    }

    pub fn pending(&self) -> Result<Option<PendingWalletLink>> {
        self.store.pending_link()
    }

    /// User approved moving the wallet onto the current account
    pub async fn confirm(&self) -> Result<serde_json::Value> {
        self.store.proceed_with_linking().await
    }

    /// User declined; the staged link is discarded
    pub fn cancel(&self) -> Result<Option<PendingWalletLink>> {
        self.store.cancel_linking()
    }
}

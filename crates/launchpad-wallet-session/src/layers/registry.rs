/*
[INPUT]:  Remote layer list (LayerSource) or layers set by the host
[OUTPUT]: Session-cached layers, selectable list, connectable layer lookup
[POS]:    Layer registry - supported chains/networks for wallet connections
[UPDATE]: When layer filtering rules or coming-soon entries change
*/

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::http::{LayerSource, Result, WalletAuthError};
use crate::types::{Layer, LayerType, Network};

/// Display-only layers appended to the selectable list. Never connectable.
pub fn coming_soon_layers() -> Vec<Layer> {
    vec![Layer {
        id: "static-1".to_string(),
        layer: LayerType::Nubit,
        network: Network::Testnet,
        name: "Nubit Testnet".to_string(),
        coming_soon: true,
    }]
}

/// Supported layers, fetched once and cached for the session (no TTL).
pub struct LayerRegistry {
    source: Arc<dyn LayerSource>,
    layers: RwLock<Option<Arc<Vec<Layer>>>>,
    fetch_lock: Mutex<()>,
}

impl LayerRegistry {
    pub fn new(source: Arc<dyn LayerSource>) -> Self {
        Self {
            source,
            layers: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    fn cached(&self) -> RwLockReadGuard<'_, Option<Arc<Vec<Layer>>>> {
        self.layers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Option<Arc<Vec<Layer>>> {
        self.cached().clone()
    }

    fn store(&self, layers: Vec<Layer>) -> Arc<Vec<Layer>> {
        let layers = Arc::new(layers);
        *self.layers.write().unwrap_or_else(PoisonError::into_inner) = Some(layers.clone());
        layers
    }

    /// Cached layers, fetching them on first use.
    pub async fn load(&self) -> Result<Vec<Layer>> {
        if let Some(layers) = self.snapshot() {
            return Ok(layers.as_ref().clone());
        }

        let _guard = self.fetch_lock.lock().await;
        // Another caller may have fetched while we waited.
        if let Some(layers) = self.snapshot() {
            return Ok(layers.as_ref().clone());
        }

        let fetched = self.source.fetch_layers().await?;
        info!(count = fetched.len(), "layers loaded");
        Ok(self.store(fetched).as_ref().clone())
    }

    /// Refetch and replace the cached list.
    pub async fn refresh(&self) -> Result<Vec<Layer>> {
        let _guard = self.fetch_lock.lock().await;
        let fetched = self.source.fetch_layers().await?;
        info!(count = fetched.len(), "layers refreshed");
        Ok(self.store(fetched).as_ref().clone())
    }

    /// Replace the cached list with layers the host already fetched.
    pub fn set_layers(&self, layers: Vec<Layer>) {
        debug!(count = layers.len(), "layers set");
        self.store(layers);
    }

    /// Currently cached layers, empty before the first load.
    pub fn layers(&self) -> Vec<Layer> {
        self.cached()
            .as_ref()
            .map(|layers| layers.as_ref().clone())
            .unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.cached().is_some()
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.cached()
            .as_ref()
            .is_some_and(|layers| layers.iter().any(|l| l.id == layer_id))
    }

    /// Layers offered to the user: Bitcoin testnet removed, coming-soon
    /// layers appended at the end.
    pub fn selectable(&self) -> Vec<Layer> {
        selectable_layers(&self.layers())
    }

    /// Look up a layer a wallet may be connected to.
    pub fn resolve(&self, layer_id: &str) -> Result<Layer> {
        let found = self
            .cached()
            .as_ref()
            .and_then(|layers| layers.iter().find(|l| l.id == layer_id).cloned());

        match found {
            Some(layer) if layer.coming_soon => Err(WalletAuthError::LayerComingSoon {
                layer_id: layer_id.to_string(),
            }),
            Some(layer) => Ok(layer),
            None if coming_soon_layers().iter().any(|l| l.id == layer_id) => {
                Err(WalletAuthError::LayerComingSoon {
                    layer_id: layer_id.to_string(),
                })
            }
            None => Err(WalletAuthError::UnknownLayer {
                layer_id: layer_id.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("layers", &self.cached().as_ref().map(|l| l.len()))
            .finish()
    }
}

/// Deterministic, idempotent filter behind [`LayerRegistry::selectable`].
pub fn selectable_layers(layers: &[Layer]) -> Vec<Layer> {
    let statics = coming_soon_layers();
    let mut selectable: Vec<Layer> = layers
        .iter()
        .filter(|layer| !layer.is_bitcoin_testnet())
        .filter(|layer| !statics.iter().any(|s| s.id == layer.id))
        .cloned()
        .collect();
    selectable.extend(statics);
    selectable
}

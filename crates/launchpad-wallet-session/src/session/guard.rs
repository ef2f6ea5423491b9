/*
[INPUT]:  Layer ids of connect/disconnect/link operations
[OUTPUT]: At most one in-flight operation per layer id
[POS]:    Session layer - per-layer single-flight guard
[UPDATE]: When switching from reject to queue semantics
*/

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::http::{Result, WalletAuthError};

/// Tracks layers with an operation in flight. A second operation on the
/// same layer is rejected, other layers are unaffected.
#[derive(Debug, Default)]
pub struct LayerGuards {
    in_flight: Mutex<HashSet<String>>,
}

impl LayerGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `layer_id` until the returned permit drops.
    pub fn try_acquire(&self, layer_id: &str) -> Result<LayerPermit<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(layer_id.to_string()) {
            return Err(WalletAuthError::OperationInProgress {
                layer_id: layer_id.to_string(),
            });
        }
        Ok(LayerPermit {
            guards: self,
            layer_id: layer_id.to_string(),
        })
    }

    pub fn is_busy(&self, layer_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(layer_id)
    }
}

#[derive(Debug)]
pub struct LayerPermit<'a> {
    guards: &'a LayerGuards,
    layer_id: String,
}

impl Drop for LayerPermit<'_> {
    fn drop(&mut self) {
        self.guards
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.layer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_layer_is_rejected_until_release() {
        let guards = LayerGuards::new();

        let permit = guards.try_acquire("btc").unwrap();
        assert!(guards.is_busy("btc"));
        assert!(matches!(
            guards.try_acquire("btc"),
            Err(WalletAuthError::OperationInProgress { .. })
        ));

        drop(permit);
        assert!(!guards.is_busy("btc"));
        assert!(guards.try_acquire("btc").is_ok());
    }

    #[test]
    fn test_different_layers_are_independent() {
        let guards = LayerGuards::new();
        let _btc = guards.try_acquire("btc").unwrap();
        let _citrea = guards.try_acquire("citrea").unwrap();
        assert!(guards.is_busy("citrea"));
    }
}

/*
[INPUT]:  Overlapping connect/disconnect calls against a gated fake backend
[OUTPUT]: Test results for per-layer single-flight and loading bookkeeping
[POS]:    Integration tests - concurrency hazards of the session store
[UPDATE]: When per-layer serialization policy changes
*/

mod common;

use common::{BTC_MAIN, CITREA_TEST, harness};
use launchpad_wallet_session::WalletAuthError;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_second_connect_same_layer_is_rejected() {
    let h = harness();
    h.api.hold();

    let (first, second) = tokio::join!(h.store.connect_wallet(CITREA_TEST, false), async {
        let result = h.store.connect_wallet(CITREA_TEST, false).await;
        h.api.release(1);
        result
    });

    assert_ok!(first);
    let err = assert_err!(second);
    assert!(matches!(err, WalletAuthError::OperationInProgress { .. }));
    assert!(err.is_retryable());
    assert_eq!(h.store.connected_wallets().len(), 1);
    assert!(!h.store.is_loading());
}

#[tokio::test]
async fn test_disconnect_during_connect_same_layer_is_rejected() {
    let h = harness();
    h.api.hold();

    let (connected, disconnected) = tokio::join!(h.store.connect_wallet(CITREA_TEST, false), async {
        let result = h.store.disconnect_wallet(CITREA_TEST).await;
        h.api.release(1);
        result
    });

    assert_ok!(connected);
    assert!(matches!(
        disconnected,
        Err(WalletAuthError::OperationInProgress { .. })
    ));
    assert!(h.store.is_wallet_connected(CITREA_TEST));
    assert!(h.store.is_authenticated());
}

#[tokio::test]
async fn test_different_layers_run_concurrently() {
    let h = harness();
    h.api.hold();
    let mut rx = h.store.subscribe();

    let (citrea, btc, ()) = tokio::join!(
        h.store.connect_wallet(CITREA_TEST, false),
        h.store.connect_wallet(BTC_MAIN, false),
        async {
            rx.wait_for(|state| state.auth_state.loading).await.unwrap();
            h.api.release(2);
        }
    );

    assert_ok!(citrea);
    assert_ok!(btc);
    assert_eq!(h.store.connected_wallets().len(), 2);
    assert!(!h.store.is_loading());
}

#[tokio::test]
async fn test_loading_stays_set_while_another_layer_is_in_flight() {
    let h = harness();
    h.api.hold();

    let (slow, ()) = tokio::join!(h.store.connect_wallet(CITREA_TEST, false), async {
        // Fails fast on an unknown layer while Citrea is parked.
        assert_err!(h.store.connect_wallet("missing", false).await);
        assert!(h.store.is_loading());
        h.api.release(1);
    });

    assert_ok!(slow);
    assert!(!h.store.is_loading());
}

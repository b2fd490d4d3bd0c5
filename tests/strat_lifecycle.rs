//! Strategy lifecycle tests: activation guards, teardown, kill switch, and
//! cancel-request bookkeeping.

use std::sync::Arc;

use rust_decimal_macros::dec;

use strat_manager::activation::{ActivationRegistry, InMemoryActivationRegistry};
use strat_manager::engine::ReconciliationEngine;
use strat_manager::error::EngineError;
use strat_manager::market::{StaticMarketData, StaticReferenceData, UsdQuotedPricing};
use strat_manager::orders::{
    OrderBrief, OrderEventType, OrderId, OrderJournal, Security, Side, StratId,
};
use strat_manager::store::{
    CancelOrderStore, InMemoryStore, OrderSnapshotStore, PairStratStore, StratBriefStore,
    SymbolSideSnapshotStore,
};
use strat_manager::strat::{PairStrat, StratLeg, StratLimits, StratState};

struct Harness {
    store: Arc<InMemoryStore>,
    registry: Arc<InMemoryActivationRegistry>,
    engine: ReconciliationEngine,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let registry = Arc::new(InMemoryActivationRegistry::new());
    let market_data = Arc::new(StaticMarketData::new());
    market_data.set_last_trade_px(Security::new("CB_Sec_1"), dec!(100));
    market_data.set_last_trade_px(Security::new("EQT_Sec_1"), dec!(50));
    let engine = ReconciliationEngine::new(
        store.clone(),
        Arc::new(UsdQuotedPricing),
        Arc::new(StaticReferenceData::new()),
        market_data,
        registry.clone(),
    );
    engine.mark_ready();
    Harness {
        store,
        registry,
        engine,
    }
}

fn strat(id: u32, leg1_sec: &str, leg1_side: Side, leg2_sec: &str) -> PairStrat {
    let mut limits = StratLimits::permissive();
    limits.max_cb_notional = dec!(100000);
    limits.max_open_cb_notional = dec!(50000);
    PairStrat::new(
        StratId(id),
        StratLeg::new(Security::new(leg1_sec), leg1_side),
        StratLeg::new(Security::new(leg2_sec), leg1_side.opposite()),
        limits,
    )
}

async fn state_of(h: &Harness, id: u32) -> StratState {
    h.store
        .read_pair_strat(StratId(id))
        .await
        .unwrap()
        .unwrap()
        .strat_status
        .strat_state
}

#[tokio::test]
async fn test_activation_creates_brief_and_marks_day() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();

    assert!(h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .is_none());
    h.engine.activate_pair_strat(StratId(1)).await.unwrap();

    assert_eq!(state_of(&h, 1).await, StratState::Active);
    let brief = h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        brief.pair_buy_side_trading_brief.security,
        Security::new("CB_Sec_1")
    );
    assert!(h.registry.has_activated_today(&Security::new("CB_Sec_1")));
    assert!(h.registry.has_activated_today(&Security::new("EQT_Sec_1")));
}

#[tokio::test]
async fn test_activation_blocked_by_symbol_side_occupancy() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();
    h.store
        .create_pair_strat(strat(2, "CB_Sec_1", Side::Buy, "EQT_Sec_2"))
        .await
        .unwrap();

    h.engine.activate_pair_strat(StratId(1)).await.unwrap();
    let err = h
        .engine
        .activate_pair_strat(StratId(2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ActivationBlocked { .. }));
    assert_eq!(state_of(&h, 2).await, StratState::Ready);
}

#[tokio::test]
async fn test_activation_blocked_by_day_guard_after_unload() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();
    h.store
        .create_pair_strat(strat(2, "CB_Sec_1", Side::Sell, "EQT_Sec_2"))
        .await
        .unwrap();

    h.engine.activate_pair_strat(StratId(1)).await.unwrap();
    h.engine.mark_strat_done(StratId(1)).await.unwrap();
    h.engine.unload_pair_strat(StratId(1)).await.unwrap();
    assert_eq!(state_of(&h, 1).await, StratState::Snoozed);

    // Strat 1 no longer occupies the symbol/side, but CB_Sec_1 already saw
    // an activation today: the opposite-side strat must wait for tomorrow.
    let err = h
        .engine
        .activate_pair_strat(StratId(2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ActivationBlocked { .. }));
}

#[tokio::test]
async fn test_unload_tears_down_derived_records() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();
    h.engine.activate_pair_strat(StratId(1)).await.unwrap();

    let brief = OrderBrief::new(
        "O1",
        Security::new("CB_Sec_1"),
        Side::Buy,
        dec!(100),
        dec!(90),
    );
    h.engine
        .handle_order_journal(OrderJournal::new(brief, OrderEventType::New))
        .await
        .unwrap();
    assert!(h
        .store
        .read_symbol_side_snapshot(&Security::new("CB_Sec_1"), Side::Buy)
        .await
        .unwrap()
        .is_some());

    h.engine.mark_strat_done(StratId(1)).await.unwrap();
    h.engine.unload_pair_strat(StratId(1)).await.unwrap();

    assert!(h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .is_none());
    assert!(h
        .store
        .read_symbol_side_snapshot(&Security::new("CB_Sec_1"), Side::Buy)
        .await
        .unwrap()
        .is_none());
    assert!(h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .is_none());

    // And back: SNOOZED -> READY re-enters the loaded set.
    h.engine.reload_pair_strat(StratId(1)).await.unwrap();
    assert_eq!(state_of(&h, 1).await, StratState::Ready);
}

#[tokio::test]
async fn test_unload_rejected_while_active() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();
    h.engine.activate_pair_strat(StratId(1)).await.unwrap();

    let err = h.engine.unload_pair_strat(StratId(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidStratTransition { .. }));
    assert_eq!(state_of(&h, 1).await, StratState::Active);
}

#[tokio::test]
async fn test_operator_pause_and_reactivate() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();
    h.engine.activate_pair_strat(StratId(1)).await.unwrap();

    h.engine.pause_pair_strat(StratId(1)).await.unwrap();
    assert_eq!(state_of(&h, 1).await, StratState::Paused);

    h.engine.activate_pair_strat(StratId(1)).await.unwrap();
    assert_eq!(state_of(&h, 1).await, StratState::Active);
}

#[tokio::test]
async fn test_kill_switch_round_trip() {
    let h = harness();
    let status = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert!(!status.kill_switch);

    h.engine.set_kill_switch(true).await.unwrap();
    let status = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert!(status.kill_switch);

    // Re-setting to the same state is a logged no-op.
    h.engine.set_kill_switch(true).await.unwrap();

    h.engine.set_kill_switch(false).await.unwrap();
    let status = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert!(!status.kill_switch);
}

#[tokio::test]
async fn test_duplicate_cancel_request_is_noop() {
    let h = harness();
    h.store
        .create_pair_strat(strat(1, "CB_Sec_1", Side::Buy, "EQT_Sec_1"))
        .await
        .unwrap();
    h.engine.activate_pair_strat(StratId(1)).await.unwrap();

    let brief = OrderBrief::new(
        "O1",
        Security::new("CB_Sec_1"),
        Side::Buy,
        dec!(100),
        dec!(90),
    );
    h.engine
        .handle_order_journal(OrderJournal::new(brief.clone(), OrderEventType::New))
        .await
        .unwrap();
    h.engine
        .handle_order_journal(OrderJournal::new(brief, OrderEventType::Ack))
        .await
        .unwrap();

    h.engine
        .request_cancel(&OrderId::from("O1"))
        .await
        .unwrap();
    let first = h
        .store
        .read_cancel_order(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!first.cxl_confirmed);

    // Second request while the first is unconfirmed: no-op.
    h.engine
        .request_cancel(&OrderId::from("O1"))
        .await
        .unwrap();
    let second = h
        .store
        .read_cancel_order(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!second.cxl_confirmed);
}

#[tokio::test]
async fn test_portfolio_status_singleton_created_once() {
    let h = harness();
    let first = h.engine.get_or_create_portfolio_status().await.unwrap();
    let second = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.id, strat_manager::portfolio::PORTFOLIO_STATUS_ID);
}

//! End-to-end reconciliation tests: order/fill journal events driven through
//! the engine against the in-memory store and static adapters.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use strat_manager::activation::InMemoryActivationRegistry;
use strat_manager::engine::ReconciliationEngine;
use strat_manager::error::EngineError;
use strat_manager::market::{StaticMarketData, StaticReferenceData, UsdQuotedPricing};
use strat_manager::orders::{
    FillId, FillJournal, OrderBrief, OrderEventType, OrderId, OrderJournal, OrderStatus,
    Security, Side, StratId,
};
use strat_manager::store::{
    CancelOrderStore, InMemoryStore, OrderSnapshotStore, PairStratStore, StratBriefStore,
    SymbolSideSnapshotStore,
};
use strat_manager::strat::{PairStrat, StratLeg, StratLimits, StratState};

const BUY_SEC: &str = "CB_Sec_1";
const SELL_SEC: &str = "EQT_Sec_1";

struct Harness {
    store: Arc<InMemoryStore>,
    market_data: Arc<StaticMarketData>,
    engine: ReconciliationEngine,
}

impl Harness {
    async fn new() -> Self {
        Self::with_limits(test_limits()).await
    }

    async fn with_limits(limits: StratLimits) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let market_data = Arc::new(StaticMarketData::new());
        let reference_data = Arc::new(StaticReferenceData::new());
        reference_data.set_security_float(Security::new(BUY_SEC), dec!(1000000));
        market_data.set_last_trade_px(Security::new(BUY_SEC), dec!(100));
        market_data.set_last_trade_px(Security::new(SELL_SEC), dec!(50));

        let engine = ReconciliationEngine::new(
            store.clone(),
            Arc::new(UsdQuotedPricing),
            reference_data,
            market_data.clone(),
            Arc::new(InMemoryActivationRegistry::new()),
        );
        engine.mark_ready();

        let harness = Self {
            store,
            market_data,
            engine,
        };
        harness.setup_strat(limits).await;
        harness
    }

    async fn setup_strat(&self, limits: StratLimits) {
        let strat = PairStrat::new(
            StratId(1),
            StratLeg::new(Security::new(BUY_SEC), Side::Buy),
            StratLeg::new(Security::new(SELL_SEC), Side::Sell),
            limits,
        );
        self.store.create_pair_strat(strat).await.unwrap();
        self.engine.activate_pair_strat(StratId(1)).await.unwrap();
    }

    async fn strat(&self) -> PairStrat {
        self.store
            .read_pair_strat(StratId(1))
            .await
            .unwrap()
            .unwrap()
    }

    async fn send(&self, order_id: &str, qty: Decimal, px: Decimal, event: OrderEventType) {
        self.try_send(order_id, qty, px, event).await.unwrap();
    }

    async fn try_send(
        &self,
        order_id: &str,
        qty: Decimal,
        px: Decimal,
        event: OrderEventType,
    ) -> Result<(), EngineError> {
        let brief = OrderBrief::new(order_id, Security::new(BUY_SEC), Side::Buy, px, qty);
        self.engine
            .handle_order_journal(OrderJournal::new(brief, event))
            .await
    }

    async fn fill(
        &self,
        fill_id: &str,
        order_id: &str,
        qty: Decimal,
        px: Decimal,
    ) -> Result<(), EngineError> {
        self.engine
            .handle_fill_journal(FillJournal {
                id: FillId::new(fill_id),
                order_id: OrderId::from(order_id),
                fill_px: px,
                fill_qty: qty,
                fill_symbol: Security::new(BUY_SEC),
                fill_side: Side::Buy,
                fill_date_time: Utc::now(),
            })
            .await
    }
}

fn test_limits() -> StratLimits {
    let mut limits = StratLimits::permissive();
    limits.max_cb_notional = dec!(100000);
    limits.max_open_cb_notional = dec!(50000);
    limits.max_concentration = dec!(10);
    limits.max_open_orders_per_side = 5;
    limits.residual_restriction.max_residual = dec!(1000000);
    limits
}

async fn harness() -> Harness {
    Harness::new().await
}

async fn harness_with(limits: StratLimits) -> Harness {
    Harness::with_limits(limits).await
}

#[tokio::test]
async fn test_new_order_creates_snapshots_and_aggregates() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Unack);
    assert_eq!(snapshot.filled_qty, Decimal::ZERO);
    assert_eq!(snapshot.order_brief.order_notional, dec!(9000));

    let symbol_side = h
        .store
        .read_symbol_side_snapshot(&Security::new(BUY_SEC), Side::Buy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(symbol_side.total_qty, dec!(90));
    assert_eq!(symbol_side.order_count, 1);

    let strat = h.strat().await;
    assert_eq!(strat.strat_status.total_buy_qty, dec!(90));
    assert_eq!(strat.strat_status.total_open_buy_notional, dec!(9000));
    assert_eq!(strat.strat_status.avg_open_buy_px, dec!(100));
    assert!(strat.frequency > 0);

    let brief = h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .unwrap();
    let side_brief = brief.side_brief(Side::Buy);
    assert_eq!(side_brief.open_qty, dec!(90));
    assert_eq!(side_brief.open_notional, dec!(9000));
    // max_cb_notional 100000 - fills 0 - open 9000
    assert_eq!(side_brief.consumable_notional, dec!(91000));
    assert_eq!(side_brief.consumable_open_notional, dec!(41000));
    // float 1000000 / 100 * 10 - (90 + 0)
    assert_eq!(side_brief.consumable_concentration, dec!(99910));
    assert_eq!(side_brief.consumable_open_orders, 4);

    let portfolio = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(portfolio.overall_buy_notional, dec!(9000));
    assert_eq!(portfolio.overall_sell_notional, Decimal::ZERO);
}

#[tokio::test]
async fn test_ack_transition_and_duplicate_ack_rejected() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Acked);

    let portfolio = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(portfolio.overall_buy_notional, dec!(9000));

    // Re-applying ACK to an already-ACKED order is rejected without mutation.
    let err = h
        .try_send("O1", dec!(90), dec!(100), OrderEventType::Ack)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedTransition { .. }));
    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Acked);
}

#[tokio::test]
async fn test_partial_fill_keeps_order_open() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;
    h.fill("F1", "O1", dec!(45), dec!(100)).await.unwrap();

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.filled_qty, dec!(45));
    assert_eq!(snapshot.order_status, OrderStatus::Acked);
    assert_eq!(snapshot.avg_fill_px, dec!(100));

    let symbol_side = h
        .store
        .read_symbol_side_snapshot(&Security::new(BUY_SEC), Side::Buy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(symbol_side.total_filled_qty, dec!(45));

    let strat = h.strat().await;
    assert_eq!(strat.strat_status.total_fill_buy_qty, dec!(45));
    assert_eq!(strat.strat_status.total_fill_buy_notional, dec!(4500));
    assert_eq!(strat.strat_status.total_open_buy_qty, dec!(45));
    // max_cb_notional 100000 - max(fill notionals)
    assert_eq!(strat.strat_status.balance_notional, dec!(95500));

    let portfolio = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(portfolio.overall_buy_fill_notional, dec!(4500));
    // Fill at order px: overall notional unchanged.
    assert_eq!(portfolio.overall_buy_notional, dec!(9000));
}

#[tokio::test]
async fn test_complete_fill_then_extra_fill_rejected() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;
    h.fill("F1", "O1", dec!(45), dec!(100)).await.unwrap();
    h.fill("F2", "O1", dec!(45), dec!(100)).await.unwrap();

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Filled);
    assert_eq!(snapshot.filled_qty, dec!(90));

    let err = h.fill("F3", "O1", dec!(10), dec!(100)).await.unwrap_err();
    assert!(matches!(err, EngineError::FillOnFilledOrder { .. }));

    // No mutation, but an error alert lands on the strategy.
    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.filled_qty, dec!(90));
    let strat = h.strat().await;
    assert!(!strat.strat_status.strat_alerts.is_empty());

    // Conservation held throughout.
    assert!(snapshot.filled_qty + snapshot.cxled_qty <= snapshot.order_brief.qty);
}

#[tokio::test]
async fn test_overfill_truncated_and_strategy_paused() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;
    h.fill("F1", "O1", dec!(80), dec!(100)).await.unwrap();
    h.fill("F2", "O1", dec!(30), dec!(100)).await.unwrap();

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    // Excess 20 truncated; only the vacant 10 booked.
    assert_eq!(snapshot.filled_qty, dec!(90));
    assert_eq!(snapshot.order_status, OrderStatus::Filled);

    let strat = h.strat().await;
    assert_eq!(strat.strat_status.strat_state, StratState::Paused);
    assert_eq!(strat.strat_status.total_fill_buy_qty, dec!(90));

    let portfolio = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(portfolio.overall_buy_fill_notional, dec!(9000));
}

#[tokio::test]
async fn test_unsolicited_cancel_books_unfilled_qty() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlAck)
        .await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Dod);
    assert_eq!(snapshot.cxled_qty, dec!(90));
    assert_eq!(snapshot.cxled_notional, dec!(9000));
    assert_eq!(snapshot.avg_cxled_px, dec!(100));

    let brief = h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .unwrap();
    let side_brief = brief.side_brief(Side::Buy);
    assert_eq!(side_brief.open_qty, Decimal::ZERO);
    assert_eq!(side_brief.residual_qty, dec!(90));
    assert_eq!(side_brief.all_bkr_cxlled_qty, dec!(90));

    let strat = h.strat().await;
    assert_eq!(strat.strat_status.total_cxl_buy_qty, dec!(90));
    assert_eq!(strat.strat_status.total_open_buy_qty, Decimal::ZERO);

    // Unsolicited: a confirmed cancel order record appears.
    let cancel = h
        .store
        .read_cancel_order(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert!(cancel.cxl_confirmed);

    // Portfolio notional returns to zero for the unfilled quantity.
    let portfolio = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(portfolio.overall_buy_notional, Decimal::ZERO);
}

#[tokio::test]
async fn test_cxl_then_cxl_ack_full_path() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;
    h.engine
        .request_cancel(&OrderId::from("O1"))
        .await
        .unwrap();
    h.send("O1", dec!(90), dec!(100), OrderEventType::Cxl).await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::CxlUnack);

    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlAck)
        .await;
    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Dod);

    let cancel = h
        .store
        .read_cancel_order(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert!(cancel.cxl_confirmed);
}

#[tokio::test]
async fn test_rej_appends_text_and_books_cancellation() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;

    let mut brief = OrderBrief::new("O1", Security::new(BUY_SEC), Side::Buy, dec!(100), dec!(90));
    brief.text.push("venue rejected: price band".to_string());
    h.engine
        .handle_order_journal(OrderJournal::new(brief, OrderEventType::Rej))
        .await
        .unwrap();

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Dod);
    assert_eq!(snapshot.cxled_qty, dec!(90));
    assert!(snapshot
        .order_brief
        .text
        .iter()
        .any(|t| t.contains("venue rejected")));
}

#[tokio::test]
async fn test_cxl_rej_reverts_to_acked() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Cxl).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlRej)
        .await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::Acked);
}

#[tokio::test]
async fn test_cxl_rej_with_ambiguous_history_stays_cxl_unack() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Ack).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Cxl).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlRej)
        .await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::Cxl).await;
    // Journal tail is now [CXL_REJ, CXL, CXL_REJ]: no ACK/NEW in the window,
    // so the reversion is ambiguous and the order stays CXL_UNACK.
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlRej)
        .await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_status, OrderStatus::CxlUnack);
}

#[tokio::test]
async fn test_fill_after_dod_is_dropped_and_pauses() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlAck)
        .await;

    h.fill("F1", "O1", dec!(45), dec!(100)).await.unwrap();

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    // The fill's notional is permanently dropped.
    assert_eq!(snapshot.filled_qty, Decimal::ZERO);
    assert_eq!(snapshot.order_status, OrderStatus::Dod);

    let strat = h.strat().await;
    assert_eq!(strat.strat_status.strat_state, StratState::Paused);
    assert!(strat
        .strat_status
        .strat_alerts
        .iter()
        .any(|a| a.alert_brief.contains("fill dropped")));

    let portfolio = h.engine.get_or_create_portfolio_status().await.unwrap();
    assert_eq!(portfolio.overall_buy_fill_notional, Decimal::ZERO);
}

#[tokio::test]
async fn test_symbol_side_snapshot_is_singleton() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O2", dec!(30), dec!(110), OrderEventType::New).await;

    let symbol_side = h
        .store
        .read_symbol_side_snapshot(&Security::new(BUY_SEC), Side::Buy)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(symbol_side.order_count, 2);
    assert_eq!(symbol_side.total_qty, dec!(120));
    // (100*90 + 110*30) / 120
    assert_eq!(symbol_side.avg_px, dec!(102.5));
}

#[tokio::test]
async fn test_zero_px_new_substitutes_last_trade_px() {
    let h = harness().await;
    h.send("O1", dec!(90), dec!(0), OrderEventType::New).await;

    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.order_brief.px, dec!(100));
    assert_eq!(snapshot.order_brief.order_notional, dec!(9000));
}

#[tokio::test]
async fn test_zero_px_new_without_book_fails_fatally() {
    let h = harness().await;
    h.market_data.clear_book(&Security::new(BUY_SEC));

    let err = h
        .try_send("O1", dec!(90), dec!(0), OrderEventType::New)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MarketDataUnavailable { .. }));

    // Nothing was created.
    let snapshot = h
        .store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap();
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn test_not_ready_engine_rejects_events_without_mutation() {
    let store = Arc::new(InMemoryStore::new());
    let engine = ReconciliationEngine::new(
        store.clone(),
        Arc::new(UsdQuotedPricing),
        Arc::new(StaticReferenceData::new()),
        Arc::new(StaticMarketData::new()),
        Arc::new(InMemoryActivationRegistry::new()),
    );

    let brief = OrderBrief::new("O1", Security::new(BUY_SEC), Side::Buy, dec!(100), dec!(90));
    let err = engine
        .handle_order_journal(OrderJournal::new(brief, OrderEventType::New))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotReady));

    let snapshot = store
        .read_order_snapshot(&OrderId::from("O1"))
        .await
        .unwrap();
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn test_fill_for_unknown_order_is_fatal() {
    let h = harness().await;
    let err = h.fill("F1", "NO_SUCH", dec!(10), dec!(100)).await.unwrap_err();
    assert!(matches!(err, EngineError::NoOrderForFill { .. }));
}

#[tokio::test]
async fn test_residual_breach_pauses_and_stays_paused() {
    let mut limits = test_limits();
    limits.residual_restriction.max_residual = Decimal::ZERO;
    let h = harness_with(limits).await;

    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlAck)
        .await;

    // residual_qty 90 x last trade 100 vs other leg 0: breach of max 0.
    let strat = h.strat().await;
    assert_eq!(strat.strat_status.strat_state, StratState::Paused);
    assert_eq!(strat.strat_status.residual.residual_notional, dec!(9000));
    assert_eq!(
        strat.strat_status.residual.security,
        Some(Security::new(BUY_SEC))
    );
    assert!(strat
        .strat_status
        .strat_alerts
        .iter()
        .any(|a| a.alert_brief.contains("residual notional")));

    // Pause monotonicity: further events must not silently re-activate.
    h.send("O2", dec!(10), dec!(100), OrderEventType::New).await;
    let strat = h.strat().await;
    assert_eq!(strat.strat_status.strat_state, StratState::Paused);

    // Only an explicit operator re-activation resumes trading.
    h.engine.activate_pair_strat(StratId(1)).await.unwrap();
    let strat = h.strat().await;
    assert_eq!(strat.strat_status.strat_state, StratState::Active);
}

#[tokio::test]
async fn test_residual_is_pure_over_its_inputs() {
    let mut limits = test_limits();
    limits.residual_restriction.max_residual = dec!(500000);
    let h = harness_with(limits).await;

    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlAck)
        .await;
    let first = h.strat().await.strat_status.residual.residual_notional;
    assert!(first >= Decimal::ZERO);

    // Same inputs, another pass: same residual.
    h.send("O2", dec!(1), dec!(100), OrderEventType::New).await;
    let second = h.strat().await.strat_status.residual.residual_notional;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cancel_rate_breach_pauses_past_waiver() {
    let mut limits = test_limits();
    limits.cancel_rate.max_cancel_rate = dec!(20);
    limits.cancel_rate.waived_min_orders = 1;
    let h = harness_with(limits).await;

    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;
    h.send("O2", dec!(90), dec!(100), OrderEventType::New).await;
    // Cancel one of two orders: cancelled 90 of 180 submitted, far past 20%.
    h.send("O1", dec!(90), dec!(100), OrderEventType::CxlAck)
        .await;

    let brief = h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .unwrap();
    assert!(brief.side_brief(Side::Buy).consumable_cxl_qty < Decimal::ZERO);

    let strat = h.strat().await;
    assert_eq!(strat.strat_status.strat_state, StratState::Paused);
    assert!(strat
        .strat_status
        .strat_alerts
        .iter()
        .any(|a| a.alert_brief.contains("Consumable cxl qty")));
}

#[tokio::test]
async fn test_participation_consumable_tracks_window() {
    let mut limits = test_limits();
    limits.market_trade_volume_participation.max_participation_rate = dec!(10);
    limits.market_trade_volume_participation.applicable_period_seconds = 300;
    let h = harness_with(limits).await;
    h.market_data
        .set_market_trade_volume(Security::new(BUY_SEC), dec!(1000));

    h.send("O1", dec!(90), dec!(100), OrderEventType::New).await;

    let brief = h
        .store
        .read_strat_brief(StratId(1))
        .await
        .unwrap()
        .unwrap();
    let side_brief = brief.side_brief(Side::Buy);
    assert_eq!(side_brief.participation_period_order_qty_sum, dec!(90));
    // 1000 * 10% - 90
    assert_eq!(side_brief.indicative_consumable_participation_qty, dec!(10));
}

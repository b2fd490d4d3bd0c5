//! Pair strategy definition, risk limits, and running status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::alerts::Alert;
use crate::orders::{Security, Side, StratId};

/// Pair-strategy lifecycle state.
///
/// State transitions:
/// ```text
/// READY ──activate (limits pass)──► ACTIVE
/// ACTIVE ──limit breach──► PAUSED | ERROR
/// PAUSED / ERROR ──operator re-activate──► ACTIVE
/// READY / DONE ──unload──► SNOOZED (removed from loaded set)
/// SNOOZED ──reload──► READY
/// ACTIVE ──terminal business condition──► DONE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StratState {
    /// Configured and loaded, not yet trading
    #[default]
    Ready,
    /// Trading; events are reconciled into its status
    Active,
    /// Halted by a limit breach or operator; awaiting re-activation
    Paused,
    /// Halted by an unrecoverable business-rule violation
    Error,
    /// Unloaded; not part of the loaded set
    Snoozed,
    /// Finished its business; no further trading
    Done,
}

impl StratState {
    /// True while the strategy occupies its (security, side) pairs - i.e.
    /// any state other than snoozed/done.
    pub fn is_ongoing(&self) -> bool {
        matches!(
            self,
            StratState::Ready | StratState::Active | StratState::Paused | StratState::Error
        )
    }

    /// True when order/fill events for this strategy are expected
    pub fn is_active(&self) -> bool {
        matches!(self, StratState::Active)
    }

    /// Check if a transition from the current state to `target` is valid
    pub fn can_transition_to(&self, target: StratState) -> bool {
        match self {
            StratState::Ready => matches!(target, StratState::Active | StratState::Snoozed),
            StratState::Active => matches!(
                target,
                StratState::Paused | StratState::Error | StratState::Done
            ),
            StratState::Paused | StratState::Error => matches!(target, StratState::Active),
            StratState::Snoozed => matches!(target, StratState::Ready),
            StratState::Done => matches!(target, StratState::Snoozed),
        }
    }
}

impl fmt::Display for StratState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StratState::Ready => write!(f, "READY"),
            StratState::Active => write!(f, "ACTIVE"),
            StratState::Paused => write!(f, "PAUSED"),
            StratState::Error => write!(f, "ERROR"),
            StratState::Snoozed => write!(f, "SNOOZED"),
            StratState::Done => write!(f, "DONE"),
        }
    }
}

/// One leg of a pair strategy: a security traded on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratLeg {
    pub security: Security,
    pub side: Side,
}

impl StratLeg {
    pub fn new(security: Security, side: Side) -> Self {
        Self { security, side }
    }
}

/// Cancel-rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRate {
    /// Max percentage of traded quantity that may be cancelled
    pub max_cancel_rate: Decimal,
    /// Orders below this count are exempt from the cancel-rate check
    pub waived_min_orders: u32,
    /// Rolling window the rate applies over
    pub applicable_period_seconds: u64,
}

/// Residual limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualRestriction {
    /// Max USD notional imbalance tolerated between the two legs
    pub max_residual: Decimal,
    /// Age after which the external sweep cancels a resting order
    pub residual_mark_seconds: u64,
}

/// Market participation limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketTradeVolumeParticipation {
    /// Max percentage of market volume this strategy may represent
    pub max_participation_rate: Decimal,
    /// Rolling window the participation applies over
    pub applicable_period_seconds: u64,
}

/// Risk configuration of one pair strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratLimits {
    /// Max per-leg USD consumable notional
    pub max_cb_notional: Decimal,
    /// Max per-leg USD open notional
    pub max_open_cb_notional: Decimal,
    /// Max percentage of security float held (open + filled)
    pub max_concentration: Decimal,
    /// Max simultaneously open orders per side
    pub max_open_orders_per_side: u32,
    pub cancel_rate: CancelRate,
    pub residual_restriction: ResidualRestriction,
    pub market_trade_volume_participation: MarketTradeVolumeParticipation,
}

impl StratLimits {
    /// Permissive limits for tests and dry runs.
    pub fn permissive() -> Self {
        Self {
            max_cb_notional: Decimal::MAX,
            max_open_cb_notional: Decimal::MAX,
            max_concentration: Decimal::ONE_HUNDRED,
            max_open_orders_per_side: u32::MAX,
            cancel_rate: CancelRate {
                max_cancel_rate: Decimal::ONE_HUNDRED,
                waived_min_orders: u32::MAX,
                applicable_period_seconds: 0,
            },
            residual_restriction: ResidualRestriction {
                max_residual: Decimal::MAX,
                residual_mark_seconds: 0,
            },
            market_trade_volume_participation: MarketTradeVolumeParticipation {
                max_participation_rate: Decimal::ONE_HUNDRED,
                applicable_period_seconds: 0,
            },
        }
    }
}

/// The notional imbalance between the two legs' unexecuted exposure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Residual {
    /// Leg carrying the larger unexecuted exposure
    pub security: Option<Security>,
    /// Absolute USD notional imbalance
    pub residual_notional: Decimal,
}

/// Running totals of one pair strategy, owned by the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StratStatus {
    pub total_buy_qty: Decimal,
    pub total_sell_qty: Decimal,
    /// Sum of buy and sell submitted quantity
    pub total_order_qty: Decimal,

    pub total_open_buy_qty: Decimal,
    pub total_open_sell_qty: Decimal,
    pub total_open_buy_notional: Decimal,
    pub total_open_sell_notional: Decimal,
    pub avg_open_buy_px: Decimal,
    pub avg_open_sell_px: Decimal,
    /// open buy notional minus open sell notional
    pub total_open_exposure: Decimal,

    pub total_fill_buy_qty: Decimal,
    pub total_fill_sell_qty: Decimal,
    pub total_fill_buy_notional: Decimal,
    pub total_fill_sell_notional: Decimal,
    pub avg_fill_buy_px: Decimal,
    pub avg_fill_sell_px: Decimal,
    /// fill buy notional minus fill sell notional
    pub total_fill_exposure: Decimal,

    pub total_cxl_buy_qty: Decimal,
    pub total_cxl_sell_qty: Decimal,
    pub total_cxl_buy_notional: Decimal,
    pub total_cxl_sell_notional: Decimal,
    pub avg_cxl_buy_px: Decimal,
    pub avg_cxl_sell_px: Decimal,
    /// cxl buy notional minus cxl sell notional
    pub total_cxl_exposure: Decimal,

    pub residual: Residual,
    /// Consumable budget against the more-consumed leg's fills
    pub balance_notional: Decimal,
    pub strat_state: StratState,
    pub strat_alerts: Vec<Alert>,
}

impl StratStatus {
    /// Fold a NEW order into the totals: submitted quantity plus open
    /// quantity/notional for the order's side.
    pub fn add_new_order(&mut self, side: Side, qty: Decimal, usd_notional: Decimal) {
        match side {
            Side::Buy => {
                self.total_buy_qty += qty;
                self.total_open_buy_qty += qty;
                self.total_open_buy_notional += usd_notional;
            }
            Side::Sell => {
                self.total_sell_qty += qty;
                self.total_open_sell_qty += qty;
                self.total_open_sell_notional += usd_notional;
            }
        }
        self.recompute_derived();
    }

    /// Fold a cancel/reject confirmation: the unfilled quantity leaves the
    /// open aggregates and enters the cancel aggregates.
    pub fn add_cancel(&mut self, side: Side, cxled_qty: Decimal, cxled_notional: Decimal) {
        match side {
            Side::Buy => {
                self.total_open_buy_qty -= cxled_qty;
                self.total_open_buy_notional -= cxled_notional;
                self.total_cxl_buy_qty += cxled_qty;
                self.total_cxl_buy_notional += cxled_notional;
            }
            Side::Sell => {
                self.total_open_sell_qty -= cxled_qty;
                self.total_open_sell_notional -= cxled_notional;
                self.total_cxl_sell_qty += cxled_qty;
                self.total_cxl_sell_notional += cxled_notional;
            }
        }
        self.recompute_derived();
    }

    /// Fold one booked fill: quantity/notional moves from open to filled.
    ///
    /// `open_notional_delta` is the USD notional of the filled quantity at
    /// the order price (what the open aggregates were carrying for it).
    pub fn add_fill(
        &mut self,
        side: Side,
        applied_qty: Decimal,
        applied_notional: Decimal,
        open_notional_delta: Decimal,
        max_cb_notional: Decimal,
    ) {
        match side {
            Side::Buy => {
                self.total_open_buy_qty -= applied_qty;
                self.total_open_buy_notional -= open_notional_delta;
                self.total_fill_buy_qty += applied_qty;
                self.total_fill_buy_notional += applied_notional;
            }
            Side::Sell => {
                self.total_open_sell_qty -= applied_qty;
                self.total_open_sell_notional -= open_notional_delta;
                self.total_fill_sell_qty += applied_qty;
                self.total_fill_sell_notional += applied_notional;
            }
        }
        self.balance_notional = max_cb_notional
            - self
                .total_fill_buy_notional
                .max(self.total_fill_sell_notional);
        self.recompute_derived();
    }

    fn recompute_derived(&mut self) {
        self.total_order_qty = self.total_buy_qty + self.total_sell_qty;
        self.avg_open_buy_px = avg_px(self.total_open_buy_notional, self.total_open_buy_qty);
        self.avg_open_sell_px = avg_px(self.total_open_sell_notional, self.total_open_sell_qty);
        self.avg_fill_buy_px = avg_px(self.total_fill_buy_notional, self.total_fill_buy_qty);
        self.avg_fill_sell_px = avg_px(self.total_fill_sell_notional, self.total_fill_sell_qty);
        self.avg_cxl_buy_px = avg_px(self.total_cxl_buy_notional, self.total_cxl_buy_qty);
        self.avg_cxl_sell_px = avg_px(self.total_cxl_sell_notional, self.total_cxl_sell_qty);
        self.total_open_exposure = self.total_open_buy_notional - self.total_open_sell_notional;
        self.total_fill_exposure = self.total_fill_buy_notional - self.total_fill_sell_notional;
        self.total_cxl_exposure = self.total_cxl_buy_notional - self.total_cxl_sell_notional;
    }
}

fn avg_px(notional: Decimal, qty: Decimal) -> Decimal {
    if qty.is_zero() {
        Decimal::ZERO
    } else {
        notional / qty
    }
}

/// A configured pairing of two securities+sides under shared risk limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairStrat {
    pub id: StratId,
    /// Buy-side leg
    pub leg1: StratLeg,
    /// Sell-side leg
    pub leg2: StratLeg,
    pub strat_limits: StratLimits,
    pub strat_status: StratStatus,
    /// Executor address
    pub host: String,
    pub port: u16,
    /// Bumped on every persisted status update
    pub frequency: u64,
    pub last_active_date_time: DateTime<Utc>,
}

impl PairStrat {
    pub fn new(id: StratId, leg1: StratLeg, leg2: StratLeg, strat_limits: StratLimits) -> Self {
        Self {
            id,
            leg1,
            leg2,
            strat_limits,
            strat_status: StratStatus::default(),
            host: "127.0.0.1".to_string(),
            port: 0,
            frequency: 0,
            last_active_date_time: Utc::now(),
        }
    }

    /// True when either leg matches the given (security, side).
    pub fn matches_symbol_side(&self, security: &Security, side: Side) -> bool {
        (self.leg1.security == *security && self.leg1.side == side)
            || (self.leg2.security == *security && self.leg2.side == side)
    }

    /// True when either leg trades the given security.
    pub fn matches_symbol(&self, security: &Security) -> bool {
        self.leg1.security == *security || self.leg2.security == *security
    }

    /// The leg opposite the one trading `security`.
    pub fn other_leg(&self, security: &Security) -> &StratLeg {
        if self.leg1.security == *security {
            &self.leg2
        } else {
            &self.leg1
        }
    }

    /// The leg trading `security`.
    pub fn leg_for(&self, security: &Security) -> &StratLeg {
        if self.leg1.security == *security {
            &self.leg1
        } else {
            &self.leg2
        }
    }
}

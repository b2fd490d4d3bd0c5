//! Per-strategy consumable-limit counters (the strat brief).
//!
//! Exactly one `StratBrief` exists per active strategy, spanning both legs.
//! The reconciliation engine recomputes the touched leg's brief on every
//! order-affecting event; the consumable fields measure remaining budget
//! against the strategy's configured limits before further orders would
//! breach them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pair_strat::PairStrat;
use crate::orders::{Security, Side, StratId};

/// Consumable-limit counters for one leg of a pair strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSideTradingBrief {
    pub security: Security,
    pub side: Side,
    /// Remaining USD notional before `max_cb_notional` is consumed
    pub consumable_notional: Decimal,
    /// Remaining USD open notional before `max_open_cb_notional` is consumed
    pub consumable_open_notional: Decimal,
    /// Remaining quantity before the float-concentration cap is consumed
    pub consumable_concentration: Decimal,
    /// Submitted quantity within the participation window
    pub participation_period_order_qty_sum: Decimal,
    /// Remaining cancellable quantity before the cancel-rate cap
    pub consumable_cxl_qty: Decimal,
    /// Remaining quantity before the market-participation cap
    pub indicative_consumable_participation_qty: Decimal,
    /// Unexecuted quantity carried from cancel-confirmed orders
    pub residual_qty: Decimal,
    /// Remaining USD residual headroom before `max_residual`
    pub indicative_consumable_residual: Decimal,
    /// Total broker-cancelled quantity for this leg
    pub all_bkr_cxlled_qty: Decimal,
    /// USD notional of currently open quantity
    pub open_notional: Decimal,
    /// Currently open quantity
    pub open_qty: Decimal,
    /// Remaining simultaneously-open-order slots
    pub consumable_open_orders: i64,
    pub last_update_date_time: DateTime<Utc>,
}

impl PairSideTradingBrief {
    /// Zeroed brief for one leg; consumables are seeded from the limits on
    /// the first recomputation.
    pub fn new(security: Security, side: Side, at: DateTime<Utc>) -> Self {
        Self {
            security,
            side,
            consumable_notional: Decimal::ZERO,
            consumable_open_notional: Decimal::ZERO,
            consumable_concentration: Decimal::ZERO,
            participation_period_order_qty_sum: Decimal::ZERO,
            consumable_cxl_qty: Decimal::ZERO,
            indicative_consumable_participation_qty: Decimal::ZERO,
            residual_qty: Decimal::ZERO,
            indicative_consumable_residual: Decimal::ZERO,
            all_bkr_cxlled_qty: Decimal::ZERO,
            open_notional: Decimal::ZERO,
            open_qty: Decimal::ZERO,
            consumable_open_orders: 0,
            last_update_date_time: at,
        }
    }
}

/// Pair of per-leg trading briefs for one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratBrief {
    pub id: StratId,
    pub pair_buy_side_trading_brief: PairSideTradingBrief,
    pub pair_sell_side_trading_brief: PairSideTradingBrief,
}

impl StratBrief {
    /// Create the brief for a strategy at activation time.
    pub fn for_strat(strat: &PairStrat, at: DateTime<Utc>) -> Self {
        let (buy_leg, sell_leg) = if strat.leg1.side == Side::Buy {
            (&strat.leg1, &strat.leg2)
        } else {
            (&strat.leg2, &strat.leg1)
        };
        Self {
            id: strat.id,
            pair_buy_side_trading_brief: PairSideTradingBrief::new(
                buy_leg.security.clone(),
                Side::Buy,
                at,
            ),
            pair_sell_side_trading_brief: PairSideTradingBrief::new(
                sell_leg.security.clone(),
                Side::Sell,
                at,
            ),
        }
    }

    /// The brief for the given side.
    pub fn side_brief(&self, side: Side) -> &PairSideTradingBrief {
        match side {
            Side::Buy => &self.pair_buy_side_trading_brief,
            Side::Sell => &self.pair_sell_side_trading_brief,
        }
    }

    /// Mutable brief for the given side.
    pub fn side_brief_mut(&mut self, side: Side) -> &mut PairSideTradingBrief {
        match side {
            Side::Buy => &mut self.pair_buy_side_trading_brief,
            Side::Sell => &mut self.pair_sell_side_trading_brief,
        }
    }

    /// The brief trading the given security, if either leg matches.
    pub fn brief_for_security(&self, security: &Security) -> Option<&PairSideTradingBrief> {
        if self.pair_buy_side_trading_brief.security == *security {
            Some(&self.pair_buy_side_trading_brief)
        } else if self.pair_sell_side_trading_brief.security == *security {
            Some(&self.pair_sell_side_trading_brief)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strat::{StratLeg, StratLimits};
    use crate::orders::StratId;

    #[test]
    fn test_brief_legs_follow_strat_sides() {
        let strat = PairStrat::new(
            StratId(7),
            StratLeg::new(Security::new("EQT_Sec_2"), Side::Sell),
            StratLeg::new(Security::new("CB_Sec_2"), Side::Buy),
            StratLimits::permissive(),
        );
        let brief = StratBrief::for_strat(&strat, Utc::now());
        assert_eq!(
            brief.pair_buy_side_trading_brief.security,
            Security::new("CB_Sec_2")
        );
        assert_eq!(
            brief.pair_sell_side_trading_brief.security,
            Security::new("EQT_Sec_2")
        );
        assert_eq!(brief.side_brief(Side::Sell).side, Side::Sell);
        assert!(brief
            .brief_for_security(&Security::new("EQT_Sec_2"))
            .is_some());
        assert!(brief
            .brief_for_security(&Security::new("UNKNOWN"))
            .is_none());
    }
}

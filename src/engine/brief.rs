//! Consumable-limit recomputation and paired-leg residual computation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::ReconciliationEngine;
use crate::orders::{Security, SymbolSideSnapshot};
use crate::strat::{PairSideTradingBrief, PairStrat, Residual, StratBrief, StratLimits};

impl ReconciliationEngine {
    /// Recompute the touched leg's trading brief from the freshly updated
    /// symbol-side aggregates.
    ///
    /// `trigger_px` is the local price of the order that caused this event;
    /// `cxled_qty_add` carries the just-confirmed cancelled quantity (zero
    /// for non-cancel events) into the residual and broker-cancel counters.
    pub(crate) async fn recompute_side_brief(
        &self,
        side_brief: &mut PairSideTradingBrief,
        limits: &StratLimits,
        snapshot: &SymbolSideSnapshot,
        trigger_px: Decimal,
        cxled_qty_add: Decimal,
        at: DateTime<Utc>,
    ) {
        let usd_px = self
            .pricing
            .usd_px(trigger_px, &side_brief.security)
            .await;
        let open_qty = snapshot.open_qty();
        let open_notional = open_qty * usd_px;
        side_brief.open_qty = open_qty;
        side_brief.open_notional = open_notional;
        side_brief.consumable_notional =
            limits.max_cb_notional - snapshot.total_fill_notional - open_notional;
        side_brief.consumable_open_notional = limits.max_open_cb_notional - open_notional;

        side_brief.consumable_concentration = match self
            .reference_data
            .security_float(&side_brief.security)
            .await
        {
            Some(float) => {
                float / Decimal::ONE_HUNDRED * limits.max_concentration
                    - (open_qty + snapshot.total_filled_qty)
            }
            None => Decimal::ZERO,
        };

        match self
            .store
            .open_order_count(&side_brief.security, side_brief.side)
            .await
        {
            Ok(live_open) => {
                side_brief.consumable_open_orders =
                    i64::from(limits.max_open_orders_per_side) - i64::from(live_open);
            }
            Err(e) => {
                warn!(security = %side_brief.security, %e, "open order count unavailable; keeping prior consumable_open_orders");
            }
        }

        side_brief.consumable_cxl_qty = (snapshot.total_filled_qty
            + open_qty
            + snapshot.total_cxled_qty)
            / Decimal::ONE_HUNDRED
            * limits.cancel_rate.max_cancel_rate
            - snapshot.total_cxled_qty;

        let participation = &limits.market_trade_volume_participation;
        let window_secs = participation.applicable_period_seconds;
        let since = at - chrono::Duration::seconds(window_secs as i64);
        match self
            .store
            .order_qty_sum_since(&side_brief.security, side_brief.side, since)
            .await
        {
            Ok(qty_sum) => side_brief.participation_period_order_qty_sum = qty_sum,
            Err(e) => {
                warn!(security = %side_brief.security, %e, "participation qty sum unavailable");
            }
        }
        match self
            .market_data
            .market_trade_volume(&side_brief.security, Duration::from_secs(window_secs))
            .await
        {
            Some(volume) => {
                side_brief.indicative_consumable_participation_qty = volume
                    * participation.max_participation_rate
                    / Decimal::ONE_HUNDRED
                    - side_brief.participation_period_order_qty_sum;
            }
            None => {
                debug!(security = %side_brief.security, "no market volume; participation consumable unchanged");
            }
        }

        if !cxled_qty_add.is_zero() {
            side_brief.residual_qty += cxled_qty_add;
            side_brief.all_bkr_cxlled_qty += cxled_qty_add;
        }
        side_brief.last_update_date_time = at;
    }

    /// Recompute the strategy residual across both legs.
    ///
    /// `residual_notional = |own_qty x usd(own_last_trade) -
    /// other_qty x usd(other_last_trade)|`; the residual security is the leg
    /// with the larger product. When no top of book exists for either leg
    /// the computation is skipped: logged, residual untouched, the strategy
    /// is not paused for missing market data here.
    pub(crate) async fn compute_residual(
        &self,
        strat: &PairStrat,
        brief: &mut StratBrief,
        touched: &Security,
    ) -> Option<Residual> {
        let own_security = touched.clone();
        let other_security = strat.other_leg(touched).security.clone();

        let own_tob = self.market_data.top_of_book(&own_security).await;
        let other_tob = self.market_data.top_of_book(&other_security).await;
        if own_tob.is_none() && other_tob.is_none() {
            error!(%own_security, %other_security, "residual computation failed: no top of book for either leg");
            return None;
        }

        let own_brief = brief.brief_for_security(&own_security)?.clone();
        let other_brief = brief.brief_for_security(&other_security)?.clone();

        let own_px = match own_tob {
            Some(tob) => self.pricing.usd_px(tob.last_trade_px, &own_security).await,
            None => Decimal::ZERO,
        };
        let other_px = match other_tob {
            Some(tob) => {
                self.pricing
                    .usd_px(tob.last_trade_px, &other_security)
                    .await
            }
            None => Decimal::ZERO,
        };

        let own_product = own_brief.residual_qty * own_px;
        let other_product = other_brief.residual_qty * other_px;
        let residual_notional = (own_product - other_product).abs();
        let security = if own_product.is_zero() && other_product.is_zero() {
            None
        } else if own_product >= other_product {
            Some(own_security)
        } else {
            Some(other_security)
        };

        let max_residual = strat.strat_limits.residual_restriction.max_residual;
        let headroom = max_residual - residual_notional;
        brief.pair_buy_side_trading_brief.indicative_consumable_residual = headroom;
        brief.pair_sell_side_trading_brief.indicative_consumable_residual = headroom;

        Some(Residual {
            security,
            residual_notional,
        })
    }
}

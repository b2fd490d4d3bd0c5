//! Strategy-status update step of the cascade.
//!
//! After an event's order snapshot and symbol-side snapshot mutations commit,
//! this step folds the event into the owning strategy: trading brief
//! consumables, status counters, residual, limit evaluation, and finally the
//! portfolio aggregates. Any missing prior record logs an error and aborts
//! the remaining steps for that event; upstream mutations stay applied.

use tracing::{debug, error, info};

use super::context::{CascadeContext, CascadeEffect};
use super::limits::EvalContext;
use crate::alerts::{merge_alert, Alert};
use crate::orders::SymbolSideSnapshot;
use crate::strat::{PairStrat, StratState};

impl super::ReconciliationEngine {
    /// Steps (b)-(d) of the cascade: strat brief, strat status, portfolio.
    pub(crate) async fn cascade_strat_and_portfolio(
        &self,
        ctx: &CascadeContext,
        snapshot: &SymbolSideSnapshot,
    ) {
        let mut strat = match self
            .store
            .read_pair_strat_by_symbol_side(&ctx.security, ctx.side)
            .await
        {
            Ok(Some(strat)) => strat,
            Ok(None) => {
                error!(security = %ctx.security, side = %ctx.side, "no ongoing pair strat for event; aborting cascade");
                return;
            }
            Err(e) => {
                error!(security = %ctx.security, side = %ctx.side, %e, "pair strat lookup failed; aborting cascade");
                return;
            }
        };

        let mut brief = match self.store.read_strat_brief(strat.id).await {
            Ok(Some(brief)) => brief,
            Ok(None) => {
                error!(strat_id = %strat.id, "no strat brief for ongoing strat; aborting cascade");
                return;
            }
            Err(e) => {
                error!(strat_id = %strat.id, %e, "strat brief lookup failed; aborting cascade");
                return;
            }
        };

        let limits = strat.strat_limits.clone();
        self.recompute_side_brief(
            brief.side_brief_mut(ctx.side),
            &limits,
            snapshot,
            ctx.trigger_px,
            ctx.cxled_qty(),
            ctx.at,
        )
        .await;

        match ctx.effect {
            CascadeEffect::NewOrder { qty, usd_notional } => {
                strat
                    .strat_status
                    .add_new_order(ctx.side, qty, usd_notional);
            }
            CascadeEffect::Cancel {
                cxled_qty,
                cxled_notional,
            } => {
                strat
                    .strat_status
                    .add_cancel(ctx.side, cxled_qty, cxled_notional);
            }
            CascadeEffect::Fill {
                applied_qty,
                applied_notional,
                open_notional_delta,
                ..
            } => {
                strat.strat_status.add_fill(
                    ctx.side,
                    applied_qty,
                    applied_notional,
                    open_notional_delta,
                    limits.max_cb_notional,
                );
            }
        }

        if let Some(residual) = self.compute_residual(&strat, &mut brief, &ctx.security).await {
            strat.strat_status.residual = residual;
        }

        let evaluation = self.evaluator.evaluate(&EvalContext {
            pair_strat: &strat,
            strat_brief: &brief,
            symbol_side_snapshot: snapshot,
        });
        for alert in evaluation.alerts {
            info!(strat_id = %strat.id, %alert, "limit evaluation alert");
            merge_alert(&mut strat.strat_status.strat_alerts, alert);
        }
        if evaluation.pause {
            self.force_pause(&mut strat);
        }

        if let Err(e) = self.store.update_strat_brief(brief).await {
            error!(strat_id = %strat.id, %e, "strat brief update failed; aborting cascade");
            return;
        }
        // Errors already logged; downstream aggregates still get the event.
        let _ = self.try_persist_strat(strat).await;

        self.apply_portfolio_effect(ctx).await;
    }

    /// Transition to PAUSED when the state machine allows it; once paused,
    /// the strategy stays paused until an operator re-activates it.
    pub(crate) fn force_pause(&self, strat: &mut PairStrat) {
        let current = strat.strat_status.strat_state;
        if current == StratState::Paused {
            return;
        }
        if current.can_transition_to(StratState::Paused) {
            info!(strat_id = %strat.id, "pausing strat on limit breach");
            strat.strat_status.strat_state = StratState::Paused;
        } else {
            debug!(strat_id = %strat.id, state = %current, "pause requested but state does not transition");
        }
    }

    /// Attach an alert to the owning strategy and force a pause; used by the
    /// business-rule violation paths (over-fill, fill after DOD).
    pub(crate) async fn alert_and_pause_strat(
        &self,
        security: &crate::orders::Security,
        side: crate::orders::Side,
        alert: Alert,
    ) {
        self.alert_strat_inner(security, side, alert, true).await;
    }

    /// Attach an alert without forcing a pause; used when the offending
    /// event was fully rejected and state stayed consistent.
    pub(crate) async fn alert_strat(
        &self,
        security: &crate::orders::Security,
        side: crate::orders::Side,
        alert: Alert,
    ) {
        self.alert_strat_inner(security, side, alert, false).await;
    }

    async fn alert_strat_inner(
        &self,
        security: &crate::orders::Security,
        side: crate::orders::Side,
        alert: Alert,
        pause: bool,
    ) {
        match self
            .store
            .read_pair_strat_by_symbol_side(security, side)
            .await
        {
            Ok(Some(mut strat)) => {
                merge_alert(&mut strat.strat_status.strat_alerts, alert);
                if pause {
                    self.force_pause(&mut strat);
                }
                let _ = self.try_persist_strat(strat).await;
            }
            Ok(None) => {
                error!(%security, %side, "no ongoing pair strat to alert");
            }
            Err(e) => {
                error!(%security, %side, %e, "pair strat lookup failed while alerting");
            }
        }
    }

    /// Step (d): portfolio status aggregates, under the singleton lock.
    pub(crate) async fn apply_portfolio_effect(&self, ctx: &CascadeContext) {
        let _guard = self.portfolio_lock.lock().await;
        let mut status = match self.get_or_create_portfolio_status_locked().await {
            Ok(status) => status,
            Err(e) => {
                error!(%e, "portfolio status unavailable; aborting portfolio step");
                return;
            }
        };

        match ctx.effect {
            CascadeEffect::NewOrder { usd_notional, .. } => {
                status.add_notional(ctx.side, usd_notional, ctx.at);
            }
            CascadeEffect::Cancel { cxled_notional, .. } => {
                status.add_notional(ctx.side, -cxled_notional, ctx.at);
            }
            CascadeEffect::Fill {
                applied_notional,
                overall_notional_adjustment,
                ..
            } => {
                status.add_notional(ctx.side, overall_notional_adjustment, ctx.at);
                status.add_fill_notional(ctx.side, applied_notional, ctx.at);
            }
        }

        if let Err(e) = self.store.update_portfolio_status(status).await {
            error!(%e, "portfolio status update failed");
        }
    }
}

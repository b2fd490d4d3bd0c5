//! Strategy lifecycle operations and system-wide controls.
//!
//! Activation enforces the single-occupancy invariant (at most one ongoing
//! strategy per (security, side)) and the calendar-day activation guard;
//! unloading tears down the strategy's derived records. The kill switch and
//! cancel-request guard also live here.

use tracing::{error, info, warn};

use super::ReconciliationEngine;
use crate::error::{EngineError, StoreError};
use crate::orders::{CancelOrder, OrderId, StratId};
use crate::strat::{StratBrief, StratState};

impl ReconciliationEngine {
    /// Activate a strategy: READY -> ACTIVE on first activation (limits,
    /// occupancy, and day-guard checked), PAUSED/ERROR -> ACTIVE for
    /// operator re-activation.
    pub async fn activate_pair_strat(&self, id: StratId) -> Result<(), EngineError> {
        let mut strat = self.load_strat(id).await?;
        let from = strat.strat_status.strat_state;
        if !from.can_transition_to(StratState::Active) {
            return Err(EngineError::InvalidStratTransition {
                id,
                from,
                to: StratState::Active,
            });
        }

        if from == StratState::Ready {
            self.check_activation_limits(&strat)?;

            let _guard = self.activation_lock.lock().await;
            for leg in [&strat.leg1, &strat.leg2] {
                // Another ongoing strategy on the same (security, side)?
                // The query sees the activating strategy too, so a shared
                // leg shows up as either a foreign holder or a cardinality
                // violation; both block the activation.
                let holder = match self
                    .store
                    .read_pair_strat_by_symbol_side(&leg.security, leg.side)
                    .await
                {
                    Ok(holder) => holder,
                    Err(StoreError::Cardinality { .. }) => {
                        return Err(EngineError::ActivationBlocked {
                            strat_id: id,
                            security: leg.security.to_string(),
                            reason: format!(
                                "multiple ongoing strategies hold {} {}",
                                leg.security, leg.side
                            ),
                        });
                    }
                    Err(e) => return Err(EngineError::Store(e)),
                };
                if let Some(holder) = holder {
                    if holder.id != id {
                        return Err(EngineError::ActivationBlocked {
                            strat_id: id,
                            security: leg.security.to_string(),
                            reason: format!(
                                "strat {} already holds {} {}",
                                holder.id, leg.security, leg.side
                            ),
                        });
                    }
                }
                // One activation per security per calendar day.
                if let Some(activated_by) = self.activation_registry.activated_by(&leg.security) {
                    if activated_by != id {
                        return Err(EngineError::ActivationBlocked {
                            strat_id: id,
                            security: leg.security.to_string(),
                            reason: format!("strat {activated_by} already activated today"),
                        });
                    }
                }
            }

            strat.strat_status.strat_state = StratState::Active;
            // Exactly one strat brief per active strategy, created on the
            // READY -> ACTIVE transition.
            if self.store.read_strat_brief(id).await?.is_none() {
                let brief = StratBrief::for_strat(&strat, chrono::Utc::now());
                self.store.create_strat_brief(brief).await?;
            }
            for leg in [&strat.leg1, &strat.leg2] {
                self.activation_registry
                    .mark_activated(leg.security.clone(), id);
            }
            info!(strat_id = %id, "pair strat activated");
        } else {
            strat.strat_status.strat_state = StratState::Active;
            info!(strat_id = %id, %from, "pair strat re-activated by operator");
        }

        self.try_persist_strat(strat).await
    }

    /// Operator-requested pause.
    pub async fn pause_pair_strat(&self, id: StratId) -> Result<(), EngineError> {
        self.transition_strat(id, StratState::Paused).await
    }

    /// Force the strategy into the ERROR state.
    pub async fn mark_strat_error(&self, id: StratId) -> Result<(), EngineError> {
        self.transition_strat(id, StratState::Error).await
    }

    /// Terminal business condition reached.
    pub async fn mark_strat_done(&self, id: StratId) -> Result<(), EngineError> {
        self.transition_strat(id, StratState::Done).await
    }

    /// Unload a READY or DONE strategy: SNOOZED, and its derived records
    /// (strat brief, symbol-side snapshots, order snapshots) are deleted.
    pub async fn unload_pair_strat(&self, id: StratId) -> Result<(), EngineError> {
        let mut strat = self.load_strat(id).await?;
        let from = strat.strat_status.strat_state;
        if !from.can_transition_to(StratState::Snoozed) {
            return Err(EngineError::InvalidStratTransition {
                id,
                from,
                to: StratState::Snoozed,
            });
        }

        let _guard = self.cascade_lock.lock().await;
        strat.strat_status.strat_state = StratState::Snoozed;

        self.store.delete_strat_brief(id).await?;
        for leg in [strat.leg1.clone(), strat.leg2.clone()] {
            self.store
                .delete_symbol_side_snapshot(&leg.security, leg.side)
                .await?;
            self.store
                .delete_order_snapshots_for_security(&leg.security)
                .await?;
        }
        info!(strat_id = %id, "pair strat unloaded");
        self.try_persist_strat(strat).await
    }

    /// Reload a snoozed strategy back into the loaded set.
    pub async fn reload_pair_strat(&self, id: StratId) -> Result<(), EngineError> {
        self.transition_strat(id, StratState::Ready).await
    }

    /// Set or clear the global kill switch.
    ///
    /// A failed update is logged and surfaced; it never panics - the caller
    /// retries on the next control action.
    pub async fn set_kill_switch(&self, on: bool) -> Result<(), EngineError> {
        let _guard = self.portfolio_lock.lock().await;
        let mut status = self.get_or_create_portfolio_status_locked().await?;
        if status.kill_switch == on {
            warn!(kill_switch = on, "kill switch already in requested state");
            return Ok(());
        }
        status.kill_switch = on;
        status.last_update_date_time = chrono::Utc::now();
        match self.store.update_portfolio_status(status).await {
            Ok(()) => {
                info!(kill_switch = on, "kill switch updated");
                Ok(())
            }
            Err(e) => {
                error!(%e, "kill switch update failed");
                Err(EngineError::Store(e))
            }
        }
    }

    /// Record a cancel request for an order, guarding against duplicates:
    /// an existing unconfirmed request makes this a logged no-op.
    pub async fn request_cancel(&self, order_id: &OrderId) -> Result<(), EngineError> {
        let snapshot = match self.store.read_order_snapshot(order_id).await? {
            Some(snapshot) => snapshot,
            None => {
                warn!(%order_id, "cancel requested for unknown order");
                return Ok(());
            }
        };
        if snapshot.order_status.is_terminal() {
            warn!(%order_id, status = %snapshot.order_status, "cancel requested for terminal order");
            return Ok(());
        }

        match self.store.read_cancel_order(order_id).await? {
            Some(existing) if !existing.cxl_confirmed => {
                info!(%order_id, "cancel already pending; request ignored");
                Ok(())
            }
            Some(_) => {
                info!(%order_id, "cancel already confirmed; request ignored");
                Ok(())
            }
            None => {
                let cancel = CancelOrder {
                    order_id: order_id.clone(),
                    security: snapshot.order_brief.security.clone(),
                    side: snapshot.order_brief.side,
                    cxl_confirmed: false,
                };
                self.store.create_cancel_order(cancel).await?;
                Ok(())
            }
        }
    }

    /// Validated state transition + persist.
    async fn transition_strat(
        &self,
        id: StratId,
        target: StratState,
    ) -> Result<(), EngineError> {
        let mut strat = self.load_strat(id).await?;
        let from = strat.strat_status.strat_state;
        if !from.can_transition_to(target) {
            return Err(EngineError::InvalidStratTransition {
                id,
                from,
                to: target,
            });
        }
        strat.strat_status.strat_state = target;
        info!(strat_id = %id, %from, to = %target, "pair strat state changed");
        self.try_persist_strat(strat).await
    }

    /// Sanity checks applied before the first activation.
    fn check_activation_limits(
        &self,
        strat: &crate::strat::PairStrat,
    ) -> Result<(), EngineError> {
        let limits = &strat.strat_limits;
        if limits.max_cb_notional <= rust_decimal::Decimal::ZERO
            || limits.max_open_cb_notional <= rust_decimal::Decimal::ZERO
        {
            return Err(EngineError::ActivationBlocked {
                strat_id: strat.id,
                security: strat.leg1.security.to_string(),
                reason: "non-positive notional limits".to_string(),
            });
        }
        Ok(())
    }
}

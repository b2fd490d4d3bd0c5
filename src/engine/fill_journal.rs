//! Fill journal handling.
//!
//! Locates the order snapshot for the fill, books the fill (truncating any
//! over-fill so `filled_qty + cxled_qty` never exceeds the order quantity),
//! and cascades into the symbol-side snapshot, strat brief, strat status,
//! and portfolio status.

use tracing::{error, warn};

use super::context::{CascadeContext, CascadeEffect};
use super::ReconciliationEngine;
use crate::alerts::Alert;
use crate::error::EngineError;
use crate::orders::{FillJournal, OrderStatus};

impl ReconciliationEngine {
    /// Consume one fill journal event.
    pub async fn handle_fill_journal(&self, fill: FillJournal) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }

        let usd_fill_px = self.pricing.usd_px(fill.fill_px, &fill.fill_symbol).await;
        let at = fill.fill_date_time;

        let _guard = self.cascade_lock.lock().await;

        let mut snapshot = match self.store.read_order_snapshot(&fill.order_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                error!(order_id = %fill.order_id, fill_id = %fill.id, "no order snapshot to apply fill against");
                return Err(EngineError::NoOrderForFill {
                    order_id: fill.order_id,
                });
            }
            Err(e) => {
                error!(order_id = %fill.order_id, %e, "order snapshot read failed");
                return Err(EngineError::Store(e));
            }
        };

        match snapshot.order_status {
            OrderStatus::Filled => {
                error!(order_id = %fill.order_id, fill_id = %fill.id, "fill on completely filled order rejected");
                self.alert_strat(
                    &snapshot.order_brief.security,
                    snapshot.order_brief.side,
                    Alert::error(format!(
                        "fill {} rejected: order {} is completely filled",
                        fill.id, fill.order_id
                    )),
                )
                .await;
                return Err(EngineError::FillOnFilledOrder {
                    order_id: fill.order_id,
                });
            }
            OrderStatus::Dod | OrderStatus::OverFilled => {
                // Fill after cancel confirmation: the notional is permanently
                // dropped; the strategy pauses for operator attention.
                error!(order_id = %fill.order_id, fill_id = %fill.id, status = %snapshot.order_status, "fill arrived after terminal status; dropping fill");
                self.alert_and_pause_strat(
                    &snapshot.order_brief.security,
                    snapshot.order_brief.side,
                    Alert::error(format!(
                        "fill {} arrived for order {} already in {}; fill dropped",
                        fill.id, fill.order_id, snapshot.order_status
                    )),
                )
                .await;
                return Ok(());
            }
            _ => {}
        }

        let order_id = snapshot.order_brief.order_id.clone();
        let security = snapshot.order_brief.security.clone();
        let side = snapshot.order_brief.side;
        let order_px = snapshot.order_brief.px;

        let application =
            match snapshot.apply_fill(fill.fill_qty, fill.fill_px, usd_fill_px, at) {
                Ok(application) => application,
                Err(e) => {
                    error!(%order_id, %e, "fill booking failed");
                    return Ok(());
                }
            };
        if application.truncated {
            warn!(
                %order_id,
                fill_qty = %fill.fill_qty,
                applied_qty = %application.applied_qty,
                "fill exceeds vacant quantity; excess truncated"
            );
        }

        if let Err(e) = self.store.update_order_snapshot(snapshot).await {
            error!(%order_id, %e, "order snapshot update failed; aborting event");
            return Ok(());
        }

        let mut symbol_side = match self.store.read_symbol_side_snapshot(&security, side).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                error!(%security, %side, "no symbol side snapshot for fill; aborting event");
                return Ok(());
            }
            Err(e) => {
                error!(%security, %side, %e, "symbol side snapshot read failed; aborting event");
                return Ok(());
            }
        };
        symbol_side.add_fill(
            application.applied_qty,
            fill.fill_px,
            application.applied_notional,
            at,
        );
        if let Err(e) = self
            .store
            .update_symbol_side_snapshot(symbol_side.clone())
            .await
        {
            error!(%security, %side, %e, "symbol side snapshot update failed; aborting event");
            return Ok(());
        }

        // Overall notional was booked at the order price on NEW; adjust by
        // the difference between fill and order price for the booked qty.
        let usd_order_px = self.pricing.usd_px(order_px, &security).await;
        let ctx = CascadeContext::new(
            security.clone(),
            side,
            order_px,
            at,
            CascadeEffect::Fill {
                applied_qty: application.applied_qty,
                applied_notional: application.applied_notional,
                fill_px: fill.fill_px,
                open_notional_delta: application.applied_qty * usd_order_px,
                overall_notional_adjustment: (usd_fill_px - usd_order_px)
                    * application.applied_qty,
            },
        );
        self.cascade_strat_and_portfolio(&ctx, &symbol_side).await;

        if application.truncated {
            self.alert_and_pause_strat(
                &security,
                side,
                Alert::error(format!(
                    "fill {} over-fills order {}: excess {} dropped",
                    fill.id,
                    order_id,
                    fill.fill_qty - application.applied_qty
                )),
            )
            .await;
        }
        Ok(())
    }
}

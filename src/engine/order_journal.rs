//! Order journal dispatch.
//!
//! `handle_order_journal` consumes one lifecycle event and drives the full
//! cascade: order snapshot, symbol-side snapshot, strat brief, strat status,
//! portfolio status. Event types dispatch through an exhaustive match; the
//! per-type preconditions and arithmetic follow the order status state
//! machine in `orders::types`.
//!
//! Failure policy: not-ready and missing-market-data conditions surface to
//! the caller (retryable); a missing prior record mid-cascade logs an error
//! and aborts the remaining steps for that event without unwinding the
//! mutations already applied.

use tracing::{error, info, warn};

use super::context::{CascadeContext, CascadeEffect};
use super::ReconciliationEngine;
use crate::alerts::Alert;
use crate::error::EngineError;
use crate::orders::{
    CancelOrder, OrderEventType, OrderJournal, OrderSnapshot, OrderStatus, SymbolSideSnapshot,
};

impl ReconciliationEngine {
    /// Consume one order journal event.
    pub async fn handle_order_journal(&self, journal: OrderJournal) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Err(EngineError::NotReady);
        }

        let mut journal = journal;
        // Market orders arrive with px 0; substitute the last trade price
        // before any notional computation or state mutation.
        if journal.order_event == OrderEventType::New && journal.order.px.is_zero() {
            let tob = self
                .market_data
                .top_of_book(&journal.order.security)
                .await
                .ok_or_else(|| EngineError::MarketDataUnavailable {
                    security: journal.order.security.to_string(),
                })?;
            info!(order_id = %journal.order.order_id, px = %tob.last_trade_px, "substituted last trade px for zero-price order");
            journal.order.px = tob.last_trade_px;
        }

        let _guard = self.cascade_lock.lock().await;

        if let Err(e) = self.store.append_order_journal(journal.clone()).await {
            error!(order_id = %journal.order.order_id, %e, "order journal append failed");
        }

        match journal.order_event {
            OrderEventType::New => self.on_new(journal).await,
            OrderEventType::Ack => self.on_ack(journal).await,
            OrderEventType::Cxl => self.on_cxl(journal).await,
            OrderEventType::CxlAck => self.on_cxl_ack(journal).await,
            OrderEventType::CxlRej => self.on_cxl_rej(journal).await,
            OrderEventType::Rej => self.on_rej(journal).await,
        }
    }

    async fn on_new(&self, journal: OrderJournal) -> Result<(), EngineError> {
        let at = journal.order_event_date_time;
        let mut order = journal.order;
        let usd_px = self.pricing.usd_px(order.px, &order.security).await;
        let usd_notional = usd_px * order.qty;
        order.order_notional = usd_notional;

        let snapshot = OrderSnapshot::from_new_order(order.clone(), at);
        if let Err(e) = self.store.create_order_snapshot(snapshot).await {
            error!(order_id = %order.order_id, %e, "order snapshot create failed; aborting event");
            return Ok(());
        }

        // Exactly one symbol-side snapshot per (security, side) lifetime:
        // created on the first NEW, folded into afterwards.
        let symbol_side = match self
            .store
            .read_symbol_side_snapshot(&order.security, order.side)
            .await
        {
            Ok(Some(mut existing)) => {
                existing.add_new_order(order.px, order.qty, at);
                if let Err(e) = self.store.update_symbol_side_snapshot(existing.clone()).await {
                    error!(security = %order.security, %e, "symbol side snapshot update failed; aborting event");
                    return Ok(());
                }
                existing
            }
            Ok(None) => {
                let created = SymbolSideSnapshot::from_new_order(
                    order.security.clone(),
                    order.side,
                    order.px,
                    order.qty,
                    at,
                );
                if let Err(e) = self.store.create_symbol_side_snapshot(created.clone()).await {
                    error!(security = %order.security, %e, "symbol side snapshot create failed; aborting event");
                    return Ok(());
                }
                created
            }
            Err(e) => {
                error!(security = %order.security, %e, "symbol side snapshot read failed; aborting event");
                return Ok(());
            }
        };

        let ctx = CascadeContext::new(
            order.security.clone(),
            order.side,
            order.px,
            at,
            CascadeEffect::NewOrder {
                qty: order.qty,
                usd_notional,
            },
        );
        self.cascade_strat_and_portfolio(&ctx, &symbol_side).await;
        Ok(())
    }

    async fn on_ack(&self, journal: OrderJournal) -> Result<(), EngineError> {
        let order_id = journal.order.order_id.clone();
        let Some(mut snapshot) = self.load_snapshot_or_abort(&journal).await else {
            return Ok(());
        };

        if snapshot.order_status != OrderStatus::Unack {
            return Err(EngineError::UnsupportedTransition {
                order_id,
                event: OrderEventType::Ack,
                status: snapshot.order_status,
            });
        }
        if let Err(e) = snapshot.transition_to(OrderStatus::Acked, journal.order_event_date_time) {
            error!(%order_id, %e, "ack transition failed");
            return Ok(());
        }
        if let Err(e) = self.store.update_order_snapshot(snapshot).await {
            error!(%order_id, %e, "order snapshot update failed");
        }
        // No notional recompute on ACK.
        Ok(())
    }

    async fn on_cxl(&self, journal: OrderJournal) -> Result<(), EngineError> {
        let order_id = journal.order.order_id.clone();
        let Some(mut snapshot) = self.load_snapshot_or_abort(&journal).await else {
            return Ok(());
        };

        if snapshot.order_status != OrderStatus::Acked {
            return Err(EngineError::UnsupportedTransition {
                order_id,
                event: OrderEventType::Cxl,
                status: snapshot.order_status,
            });
        }
        if let Err(e) =
            snapshot.transition_to(OrderStatus::CxlUnack, journal.order_event_date_time)
        {
            error!(%order_id, %e, "cancel transition failed");
            return Ok(());
        }
        if let Err(e) = self.store.update_order_snapshot(snapshot).await {
            error!(%order_id, %e, "order snapshot update failed");
        }
        Ok(())
    }

    async fn on_cxl_ack(&self, journal: OrderJournal) -> Result<(), EngineError> {
        let order_id = journal.order.order_id.clone();
        let Some(snapshot) = self.load_snapshot_or_abort(&journal).await else {
            return Ok(());
        };

        // Tolerant for unsolicited cancels: the venue may cancel an order
        // we never asked to cancel.
        if !matches!(
            snapshot.order_status,
            OrderStatus::CxlUnack | OrderStatus::Acked | OrderStatus::Unack
        ) {
            return Err(EngineError::UnsupportedTransition {
                order_id,
                event: OrderEventType::CxlAck,
                status: snapshot.order_status,
            });
        }

        self.confirm_cancel_order(&journal).await;
        self.book_cancellation(snapshot, journal.order_event_date_time)
            .await;
        Ok(())
    }

    async fn on_rej(&self, journal: OrderJournal) -> Result<(), EngineError> {
        let order_id = journal.order.order_id.clone();
        let Some(mut snapshot) = self.load_snapshot_or_abort(&journal).await else {
            return Ok(());
        };

        if !matches!(
            snapshot.order_status,
            OrderStatus::Unack | OrderStatus::Acked
        ) {
            return Err(EngineError::UnsupportedTransition {
                order_id,
                event: OrderEventType::Rej,
                status: snapshot.order_status,
            });
        }

        for line in &journal.order.text {
            snapshot.push_text(line.clone());
        }
        self.book_cancellation(snapshot, journal.order_event_date_time)
            .await;
        Ok(())
    }

    /// Shared CXL_ACK / REJ tail: book the unfilled quantity as cancelled on
    /// the snapshot, then cascade into symbol-side, strat, and portfolio.
    async fn book_cancellation(
        &self,
        mut snapshot: OrderSnapshot,
        at: chrono::DateTime<chrono::Utc>,
    ) {
        let order_id = snapshot.order_brief.order_id.clone();
        let security = snapshot.order_brief.security.clone();
        let side = snapshot.order_brief.side;
        let order_px = snapshot.order_brief.px;

        let usd_px = self.pricing.usd_px(order_px, &security).await;
        let cxled_qty = match snapshot.apply_cancel(usd_px, at) {
            Ok(qty) => qty,
            Err(e) => {
                error!(%order_id, %e, "cancel booking failed");
                return;
            }
        };
        let cxled_notional = snapshot.cxled_notional;
        if let Err(e) = self.store.update_order_snapshot(snapshot).await {
            error!(%order_id, %e, "order snapshot update failed; aborting event");
            return;
        }

        let mut symbol_side = match self.store.read_symbol_side_snapshot(&security, side).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                error!(%security, %side, "no symbol side snapshot for cancel; aborting event");
                return;
            }
            Err(e) => {
                error!(%security, %side, %e, "symbol side snapshot read failed; aborting event");
                return;
            }
        };
        symbol_side.add_cancel(cxled_qty, cxled_notional, at);
        if let Err(e) = self
            .store
            .update_symbol_side_snapshot(symbol_side.clone())
            .await
        {
            error!(%security, %side, %e, "symbol side snapshot update failed; aborting event");
            return;
        }

        let ctx = CascadeContext::new(
            security,
            side,
            order_px,
            at,
            CascadeEffect::Cancel {
                cxled_qty,
                cxled_notional,
            },
        );
        self.cascade_strat_and_portfolio(&ctx, &symbol_side).await;
    }

    async fn on_cxl_rej(&self, journal: OrderJournal) -> Result<(), EngineError> {
        let order_id = journal.order.order_id.clone();
        let at = journal.order_event_date_time;
        let Some(mut snapshot) = self.load_snapshot_or_abort(&journal).await else {
            return Ok(());
        };

        if snapshot.order_status != OrderStatus::CxlUnack {
            return Err(EngineError::UnsupportedTransition {
                order_id,
                event: OrderEventType::CxlRej,
                status: snapshot.order_status,
            });
        }

        let qty = snapshot.order_brief.qty;
        let filled_qty = snapshot.filled_qty;
        if qty > filled_qty {
            // Revert to whatever status preceded the cancel request, read
            // from the most recent journal entries for this order.
            let tail = match self.store.latest_order_journals(&order_id, 3).await {
                Ok(tail) => tail,
                Err(e) => {
                    error!(%order_id, %e, "journal history read failed; order stays CXL_UNACK");
                    return Ok(());
                }
            };
            let reverted = tail.iter().find_map(|entry| match entry.order_event {
                OrderEventType::Ack => Some(OrderStatus::Acked),
                OrderEventType::New => Some(OrderStatus::Unack),
                _ => None,
            });
            match reverted {
                Some(status) => {
                    if let Err(e) = snapshot.transition_to(status, at) {
                        error!(%order_id, %e, "cancel-reject reversion failed");
                        return Ok(());
                    }
                }
                None => {
                    error!(%order_id, "ambiguous journal history on cancel-reject; order stays CXL_UNACK");
                    return Ok(());
                }
            }
        } else if qty == filled_qty {
            if let Err(e) = snapshot.transition_to(OrderStatus::Filled, at) {
                error!(%order_id, %e, "cancel-reject fill transition failed");
                return Ok(());
            }
        } else {
            // Over-fill must never surface through this path.
            if let Err(e) = snapshot.transition_to(OrderStatus::OverFilled, at) {
                error!(%order_id, %e, "cancel-reject over-fill transition failed");
                return Ok(());
            }
            error!(%order_id, %filled_qty, %qty, "filled qty exceeds order qty on cancel-reject");
            self.alert_and_pause_strat(
                &snapshot.order_brief.security,
                snapshot.order_brief.side,
                Alert::error(format!(
                    "order {order_id} over-filled: filled qty {filled_qty} exceeds order qty {qty}"
                )),
            )
            .await;
        }

        if let Err(e) = self.store.update_order_snapshot(snapshot).await {
            error!(%order_id, %e, "order snapshot update failed");
        }
        Ok(())
    }

    /// Confirm the pending cancel request, or record an unsolicited cancel.
    async fn confirm_cancel_order(&self, journal: &OrderJournal) {
        let order_id = &journal.order.order_id;
        match self.store.read_cancel_order(order_id).await {
            Ok(Some(mut cancel)) if !cancel.cxl_confirmed => {
                cancel.cxl_confirmed = true;
                if let Err(e) = self.store.update_cancel_order(cancel).await {
                    error!(%order_id, %e, "cancel order confirmation failed");
                }
            }
            Ok(Some(_)) => {
                warn!(%order_id, "duplicate cancel confirmation ignored");
            }
            Ok(None) => {
                info!(%order_id, "unsolicited cancel; recording confirmed cancel order");
                let cancel = CancelOrder {
                    order_id: order_id.clone(),
                    security: journal.order.security.clone(),
                    side: journal.order.side,
                    cxl_confirmed: true,
                };
                if let Err(e) = self.store.create_cancel_order(cancel).await {
                    error!(%order_id, %e, "unsolicited cancel record failed");
                }
            }
            Err(e) => {
                error!(%order_id, %e, "cancel order read failed");
            }
        }
    }

    /// Load the event's order snapshot; log and return None when missing so
    /// the caller aborts this event per the propagation policy.
    async fn load_snapshot_or_abort(&self, journal: &OrderJournal) -> Option<OrderSnapshot> {
        let order_id = &journal.order.order_id;
        match self.store.read_order_snapshot(order_id).await {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                error!(%order_id, event = %journal.order_event, "no order snapshot for event; aborting");
                None
            }
            Err(e) => {
                error!(%order_id, event = %journal.order_event, %e, "order snapshot read failed; aborting");
                None
            }
        }
    }
}

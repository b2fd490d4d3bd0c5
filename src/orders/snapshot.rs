//! Mutable projection of one order's lifecycle.
//!
//! An `OrderSnapshot` is created on the first NEW journal event for an order
//! id and mutated by every subsequent journal/fill event. All arithmetic here
//! is pure; the reconciliation engine orchestrates when each mutation runs
//! and what cascades from it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{OrderBrief, OrderId, OrderStatus};

/// Errors from order snapshot mutations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderSnapshotError {
    #[error("invalid status transition from {from} to {to} for order {order_id}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        order_id: OrderId,
    },

    #[error("order {order_id} is terminal ({status}) and cannot accept fills")]
    Terminal {
        order_id: OrderId,
        status: OrderStatus,
    },
}

/// Result of applying one fill to a snapshot.
///
/// `applied_qty` may be less than the reported fill quantity when the fill
/// would overshoot the order quantity; the excess is truncated and
/// `truncated` is set so the caller can raise the over-fill alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillApplication {
    /// Quantity actually booked
    pub applied_qty: Decimal,
    /// USD notional of the booked quantity
    pub applied_notional: Decimal,
    /// True when the reported quantity exceeded the vacant quantity
    pub truncated: bool,
}

/// Current state of one order, keyed by order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Copy of the order facts; `px` and `text` mutate on cancel/reject
    pub order_brief: OrderBrief,
    /// Cumulative filled quantity
    pub filled_qty: Decimal,
    /// Volume-weighted average fill price (local)
    pub avg_fill_px: Decimal,
    /// Cumulative USD fill notional
    pub fill_notional: Decimal,
    /// Cancelled quantity (set once, at cancel/reject confirmation)
    pub cxled_qty: Decimal,
    /// Average cancelled price (notional / qty, 0 when qty is 0)
    pub avg_cxled_px: Decimal,
    /// USD notional of the cancelled quantity
    pub cxled_notional: Decimal,
    /// Quantity of the most recent fill
    pub last_update_fill_qty: Decimal,
    /// Price of the most recent fill (local)
    pub last_update_fill_px: Decimal,
    /// Lifecycle status
    pub order_status: OrderStatus,
    /// When the snapshot was created (first NEW event)
    pub create_date_time: DateTime<Utc>,
    /// When the snapshot was last mutated
    pub last_update_date_time: DateTime<Utc>,
}

impl OrderSnapshot {
    /// Create the snapshot for a NEW journal event: UNACK, zero fill and
    /// cancel fields.
    pub fn from_new_order(order_brief: OrderBrief, at: DateTime<Utc>) -> Self {
        Self {
            order_brief,
            filled_qty: Decimal::ZERO,
            avg_fill_px: Decimal::ZERO,
            fill_notional: Decimal::ZERO,
            cxled_qty: Decimal::ZERO,
            avg_cxled_px: Decimal::ZERO,
            cxled_notional: Decimal::ZERO,
            last_update_fill_qty: Decimal::ZERO,
            last_update_fill_px: Decimal::ZERO,
            order_status: OrderStatus::Unack,
            create_date_time: at,
            last_update_date_time: at,
        }
    }

    /// Unfilled quantity still working at the venue.
    pub fn vacant_qty(&self) -> Decimal {
        self.order_brief.qty - self.filled_qty
    }

    /// Apply a validated status transition.
    pub fn transition_to(
        &mut self,
        target: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), OrderSnapshotError> {
        if !self.order_status.can_transition_to(target) {
            return Err(OrderSnapshotError::InvalidTransition {
                from: self.order_status,
                to: target,
                order_id: self.order_brief.order_id.clone(),
            });
        }
        self.order_status = target;
        self.last_update_date_time = at;
        Ok(())
    }

    /// Book the cancellation of all unfilled quantity and transition to DOD.
    ///
    /// `usd_px` is the USD conversion of the order price. Returns the
    /// cancelled quantity so the caller can cascade it into the symbol-side
    /// and strategy aggregates.
    pub fn apply_cancel(
        &mut self,
        usd_px: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, OrderSnapshotError> {
        let cxled_qty = self.vacant_qty();
        let cxled_notional = cxled_qty * usd_px;
        self.transition_to(OrderStatus::Dod, at)?;
        self.cxled_qty = cxled_qty;
        self.cxled_notional = cxled_notional;
        self.avg_cxled_px = if cxled_qty.is_zero() {
            Decimal::ZERO
        } else {
            cxled_notional / cxled_qty
        };
        Ok(cxled_qty)
    }

    /// Book one fill, truncating any excess beyond the order quantity.
    ///
    /// `usd_fill_px` is the USD conversion of the fill price; the applied
    /// notional is computed from it so only the booked portion counts.
    pub fn apply_fill(
        &mut self,
        fill_qty: Decimal,
        fill_px: Decimal,
        usd_fill_px: Decimal,
        at: DateTime<Utc>,
    ) -> Result<FillApplication, OrderSnapshotError> {
        if self.order_status.is_terminal() {
            return Err(OrderSnapshotError::Terminal {
                order_id: self.order_brief.order_id.clone(),
                status: self.order_status,
            });
        }

        let vacant = self.vacant_qty();
        let truncated = fill_qty > vacant;
        let applied_qty = if truncated { vacant } else { fill_qty };
        let applied_notional = applied_qty * usd_fill_px;

        let updated_filled_qty = self.filled_qty + applied_qty;
        // Volume-weighted average over booked fills only.
        self.avg_fill_px = if updated_filled_qty.is_zero() {
            Decimal::ZERO
        } else {
            (self.avg_fill_px * self.filled_qty + fill_px * applied_qty) / updated_filled_qty
        };
        self.filled_qty = updated_filled_qty;
        self.fill_notional += applied_notional;
        self.last_update_fill_qty = applied_qty;
        self.last_update_fill_px = fill_px;
        if self.filled_qty >= self.order_brief.qty {
            self.order_status = OrderStatus::Filled;
        }
        self.last_update_date_time = at;

        Ok(FillApplication {
            applied_qty,
            applied_notional,
            truncated,
        })
    }

    /// Append a reason line to the order text (cancel/reject handling).
    pub fn push_text(&mut self, line: impl Into<String>) {
        self.order_brief.text.push(line.into());
    }
}

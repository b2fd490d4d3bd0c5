//! Explicit per-event cascade context.
//!
//! One journal event flows through the cascade as a single context object:
//! which (security, side) it touches, when it happened, the price basis for
//! open-notional computation, and the numeric effect to fold into each
//! aggregate. The context is built once, under the cascade lock, after the
//! order snapshot mutation commits - downstream steps never re-derive state
//! from the stores mid-flight.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::orders::{Security, Side};

/// Numeric effect of one event on the downstream aggregates.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CascadeEffect {
    /// A NEW order entered the book.
    NewOrder {
        qty: Decimal,
        /// USD notional at the order price
        usd_notional: Decimal,
    },
    /// Unfilled quantity left the book via CXL_ACK or REJ.
    Cancel {
        cxled_qty: Decimal,
        /// USD notional of the cancelled quantity at the order price
        cxled_notional: Decimal,
    },
    /// Booked (possibly truncated) fill quantity.
    Fill {
        applied_qty: Decimal,
        /// USD notional of the booked quantity at the fill price
        applied_notional: Decimal,
        /// Local fill price, for running fill averages
        fill_px: Decimal,
        /// USD notional the open aggregates carried for the filled quantity
        /// (at the order price)
        open_notional_delta: Decimal,
        /// (usd fill px - usd order px) x qty, applied to overall notional
        overall_notional_adjustment: Decimal,
    },
}

/// Working set for one event's cascade.
#[derive(Debug, Clone)]
pub(crate) struct CascadeContext {
    pub security: Security,
    pub side: Side,
    /// Local order price; basis for the leg's open-notional recompute
    pub trigger_px: Decimal,
    pub at: DateTime<Utc>,
    pub effect: CascadeEffect,
}

impl CascadeContext {
    pub(crate) fn new(
        security: Security,
        side: Side,
        trigger_px: Decimal,
        at: DateTime<Utc>,
        effect: CascadeEffect,
    ) -> Self {
        Self {
            security,
            side,
            trigger_px,
            at,
            effect,
        }
    }

    /// Cancelled quantity carried by this event (0 unless a cancel).
    pub(crate) fn cxled_qty(&self) -> Decimal {
        match self.effect {
            CascadeEffect::Cancel { cxled_qty, .. } => cxled_qty,
            _ => Decimal::ZERO,
        }
    }
}

//! Aggregated per (security, side) order statistics.
//!
//! At most one `SymbolSideSnapshot` exists per (security, side) pair. It is
//! created lazily on the first NEW order journal for that pair, updated on
//! every order-state-changing event, and deleted when the owning strategy is
//! unloaded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Security, Side};

/// Running aggregates for one (security, side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSideSnapshot {
    /// Security of this aggregate
    pub security: Security,
    /// Side of this aggregate
    pub side: Side,
    /// Volume-weighted average submitted price (local)
    pub avg_px: Decimal,
    /// Total submitted quantity across all orders
    pub total_qty: Decimal,
    /// Total filled quantity
    pub total_filled_qty: Decimal,
    /// Volume-weighted average fill price (local)
    pub avg_fill_px: Decimal,
    /// Total USD fill notional
    pub total_fill_notional: Decimal,
    /// Quantity of the most recent fill
    pub last_update_fill_qty: Decimal,
    /// Price of the most recent fill (local)
    pub last_update_fill_px: Decimal,
    /// Total cancelled quantity
    pub total_cxled_qty: Decimal,
    /// Average cancelled price (cumulative notional / qty)
    pub avg_cxled_px: Decimal,
    /// Total USD cancelled notional
    pub total_cxled_notional: Decimal,
    /// Number of orders submitted for this (security, side)
    pub order_count: u32,
    /// When this aggregate last changed
    pub last_update_date_time: DateTime<Utc>,
}

impl SymbolSideSnapshot {
    /// Create the aggregate from the first NEW order on this (security, side).
    pub fn from_new_order(
        security: Security,
        side: Side,
        px: Decimal,
        qty: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            security,
            side,
            avg_px: px,
            total_qty: qty,
            total_filled_qty: Decimal::ZERO,
            avg_fill_px: Decimal::ZERO,
            total_fill_notional: Decimal::ZERO,
            last_update_fill_qty: Decimal::ZERO,
            last_update_fill_px: Decimal::ZERO,
            total_cxled_qty: Decimal::ZERO,
            avg_cxled_px: Decimal::ZERO,
            total_cxled_notional: Decimal::ZERO,
            order_count: 1,
            last_update_date_time: at,
        }
    }

    /// Fold in a subsequent NEW order: append quantity, recompute the
    /// running average submitted price.
    pub fn add_new_order(&mut self, px: Decimal, qty: Decimal, at: DateTime<Utc>) {
        let new_total = self.total_qty + qty;
        self.avg_px = if new_total.is_zero() {
            Decimal::ZERO
        } else {
            (self.avg_px * self.total_qty + px * qty) / new_total
        };
        self.total_qty = new_total;
        self.order_count += 1;
        self.last_update_date_time = at;
    }

    /// Fold in one booked fill.
    pub fn add_fill(
        &mut self,
        applied_qty: Decimal,
        fill_px: Decimal,
        applied_notional: Decimal,
        at: DateTime<Utc>,
    ) {
        let new_filled = self.total_filled_qty + applied_qty;
        self.avg_fill_px = if new_filled.is_zero() {
            Decimal::ZERO
        } else {
            (self.avg_fill_px * self.total_filled_qty + fill_px * applied_qty) / new_filled
        };
        self.total_filled_qty = new_filled;
        self.total_fill_notional += applied_notional;
        self.last_update_fill_qty = applied_qty;
        self.last_update_fill_px = fill_px;
        self.last_update_date_time = at;
    }

    /// Fold in one cancel/reject confirmation.
    pub fn add_cancel(&mut self, cxled_qty: Decimal, cxled_notional: Decimal, at: DateTime<Utc>) {
        self.total_cxled_qty += cxled_qty;
        self.total_cxled_notional += cxled_notional;
        self.avg_cxled_px = if self.total_cxled_qty.is_zero() {
            Decimal::ZERO
        } else {
            self.total_cxled_notional / self.total_cxled_qty
        };
        self.last_update_date_time = at;
    }

    /// Quantity still working: submitted minus filled minus cancelled.
    pub fn open_qty(&self) -> Decimal {
        self.total_qty - (self.total_filled_qty + self.total_cxled_qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sss() -> SymbolSideSnapshot {
        SymbolSideSnapshot::from_new_order(
            Security::new("CB_Sec_1"),
            Side::Buy,
            dec!(100),
            dec!(90),
            Utc::now(),
        )
    }

    #[test]
    fn test_first_new_order_seeds_aggregate() {
        let snap = sss();
        assert_eq!(snap.total_qty, dec!(90));
        assert_eq!(snap.avg_px, dec!(100));
        assert_eq!(snap.order_count, 1);
        assert_eq!(snap.open_qty(), dec!(90));
    }

    #[test]
    fn test_running_average_px_over_new_orders() {
        let mut snap = sss();
        snap.add_new_order(dec!(110), dec!(30), Utc::now());
        assert_eq!(snap.total_qty, dec!(120));
        assert_eq!(snap.order_count, 2);
        // (100*90 + 110*30) / 120 = 102.5
        assert_eq!(snap.avg_px, dec!(102.5));
    }

    #[test]
    fn test_fill_and_cancel_reduce_open_qty() {
        let mut snap = sss();
        snap.add_fill(dec!(45), dec!(100), dec!(4500), Utc::now());
        assert_eq!(snap.total_filled_qty, dec!(45));
        assert_eq!(snap.open_qty(), dec!(45));

        snap.add_cancel(dec!(45), dec!(4500), Utc::now());
        assert_eq!(snap.total_cxled_qty, dec!(45));
        assert_eq!(snap.avg_cxled_px, dec!(100));
        assert_eq!(snap.open_qty(), Decimal::ZERO);
    }

    #[test]
    fn test_avg_fill_px_is_volume_weighted() {
        let mut snap = sss();
        snap.add_fill(dec!(30), dec!(100), dec!(3000), Utc::now());
        snap.add_fill(dec!(60), dec!(103), dec!(6180), Utc::now());
        // (100*30 + 103*60) / 90 = 102
        assert_eq!(snap.avg_fill_px, dec!(102));
        assert_eq!(snap.last_update_fill_qty, dec!(60));
        assert_eq!(snap.last_update_fill_px, dec!(103));
    }
}

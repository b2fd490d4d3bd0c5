//! Global portfolio status: overall notional aggregates and the kill switch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::alerts::Alert;
use crate::orders::Side;

/// Fixed id of the singleton portfolio status record.
pub const PORTFOLIO_STATUS_ID: u32 = 1;

/// Singleton aggregate across every strategy.
///
/// Created once at startup if absent; mutated by every order/fill event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioStatus {
    pub id: u32,
    /// When set, new order submission halts system-wide
    pub kill_switch: bool,
    /// USD notional of all submitted buy quantity not yet cancelled
    pub overall_buy_notional: Decimal,
    /// USD notional of all submitted sell quantity not yet cancelled
    pub overall_sell_notional: Decimal,
    /// USD notional of all buy fills
    pub overall_buy_fill_notional: Decimal,
    /// USD notional of all sell fills
    pub overall_sell_fill_notional: Decimal,
    pub portfolio_alerts: Vec<Alert>,
    /// Bumped whenever `portfolio_alerts` changes
    pub alert_update_seq_num: u64,
    pub last_update_date_time: DateTime<Utc>,
}

impl PortfolioStatus {
    /// Fresh status with the singleton id, kill switch off.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            id: PORTFOLIO_STATUS_ID,
            kill_switch: false,
            overall_buy_notional: Decimal::ZERO,
            overall_sell_notional: Decimal::ZERO,
            overall_buy_fill_notional: Decimal::ZERO,
            overall_sell_fill_notional: Decimal::ZERO,
            portfolio_alerts: Vec::new(),
            alert_update_seq_num: 0,
            last_update_date_time: at,
        }
    }

    /// Adjust the side's overall notional by `delta` (positive on NEW,
    /// negative on cancel, fill-vs-order price difference on fills).
    pub fn add_notional(&mut self, side: Side, delta: Decimal, at: DateTime<Utc>) {
        match side {
            Side::Buy => self.overall_buy_notional += delta,
            Side::Sell => self.overall_sell_notional += delta,
        }
        self.last_update_date_time = at;
    }

    /// Add booked fill notional for the side.
    pub fn add_fill_notional(&mut self, side: Side, notional: Decimal, at: DateTime<Utc>) {
        match side {
            Side::Buy => self.overall_buy_fill_notional += notional,
            Side::Sell => self.overall_sell_fill_notional += notional,
        }
        self.last_update_date_time = at;
    }

    /// Attach an alert and bump the sequence number.
    pub fn push_alert(&mut self, alert: Alert) {
        crate::alerts::merge_alert(&mut self.portfolio_alerts, alert);
        self.alert_update_seq_num += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::Severity;
    use rust_decimal_macros::dec;

    #[test]
    fn test_notional_bookkeeping_per_side() {
        let mut status = PortfolioStatus::new(Utc::now());
        status.add_notional(Side::Buy, dec!(9000), Utc::now());
        status.add_notional(Side::Sell, dec!(4000), Utc::now());
        status.add_notional(Side::Buy, dec!(-1000), Utc::now());
        assert_eq!(status.overall_buy_notional, dec!(8000));
        assert_eq!(status.overall_sell_notional, dec!(4000));

        status.add_fill_notional(Side::Buy, dec!(4500), Utc::now());
        assert_eq!(status.overall_buy_fill_notional, dec!(4500));
        assert_eq!(status.overall_sell_fill_notional, Decimal::ZERO);
    }

    #[test]
    fn test_alert_bumps_seq_num() {
        let mut status = PortfolioStatus::new(Utc::now());
        assert_eq!(status.alert_update_seq_num, 0);
        status.push_alert(Alert::new(Severity::Critical, "kill switch trigger failed"));
        assert_eq!(status.alert_update_seq_num, 1);
        assert_eq!(status.portfolio_alerts.len(), 1);
    }

    #[test]
    fn test_status_serializes_for_clients() {
        let mut status = PortfolioStatus::new(Utc::now());
        status.kill_switch = true;
        status.add_notional(Side::Buy, dec!(9000), Utc::now());

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["kill_switch"], true);
        assert_eq!(json["overall_buy_notional"], "9000");

        let back: PortfolioStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back.overall_buy_notional, dec!(9000));
    }
}

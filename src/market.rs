//! Injected pricing, reference-data, and market-data adapters.
//!
//! The engine never resolves prices or reference data itself; the
//! surrounding system supplies these adapters at construction time. The
//! static implementations here back tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::orders::Security;

/// Best-known market picture for one security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopOfBook {
    /// Most recent trade price (local currency)
    pub last_trade_px: Decimal,
    pub last_update_date_time: DateTime<Utc>,
}

/// Converts between local prices/notionals and USD.
#[async_trait]
pub trait PricingAdapter: Send + Sync {
    /// USD value of a local price for the security
    async fn usd_px(&self, px: Decimal, security: &Security) -> Decimal;

    /// Local value of a USD notional for the security
    async fn local_px_or_notional(&self, notional: Decimal, security: &Security) -> Decimal;
}

/// Static reference data (security master).
#[async_trait]
pub trait ReferenceDataAdapter: Send + Sync {
    /// Free-float share count for the security, if known
    async fn security_float(&self, security: &Security) -> Option<Decimal>;
}

/// Market data queries the engine depends on.
#[async_trait]
pub trait MarketDataAdapter: Send + Sync {
    /// Current top of book, if a book exists
    async fn top_of_book(&self, security: &Security) -> Option<TopOfBook>;

    /// Traded market volume for the security over the trailing period
    async fn market_trade_volume(&self, security: &Security, period: Duration) -> Option<Decimal>;
}

/// Pricing adapter for securities already quoted in USD.
#[derive(Debug, Default)]
pub struct UsdQuotedPricing;

#[async_trait]
impl PricingAdapter for UsdQuotedPricing {
    async fn usd_px(&self, px: Decimal, _security: &Security) -> Decimal {
        px
    }

    async fn local_px_or_notional(&self, notional: Decimal, _security: &Security) -> Decimal {
        notional
    }
}

/// Reference data served from a fixed table.
#[derive(Debug, Default)]
pub struct StaticReferenceData {
    floats: RwLock<HashMap<Security, Decimal>>,
}

impl StaticReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_security_float(&self, security: Security, float: Decimal) {
        self.floats.write().insert(security, float);
    }
}

#[async_trait]
impl ReferenceDataAdapter for StaticReferenceData {
    async fn security_float(&self, security: &Security) -> Option<Decimal> {
        self.floats.read().get(security).copied()
    }
}

/// Market data served from fixed tables; tests push books and volumes in.
#[derive(Debug, Default)]
pub struct StaticMarketData {
    books: RwLock<HashMap<Security, TopOfBook>>,
    volumes: RwLock<HashMap<Security, Decimal>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_trade_px(&self, security: Security, px: Decimal) {
        self.books.write().insert(
            security,
            TopOfBook {
                last_trade_px: px,
                last_update_date_time: Utc::now(),
            },
        );
    }

    pub fn clear_book(&self, security: &Security) {
        self.books.write().remove(security);
    }

    pub fn set_market_trade_volume(&self, security: Security, volume: Decimal) {
        self.volumes.write().insert(security, volume);
    }
}

#[async_trait]
impl MarketDataAdapter for StaticMarketData {
    async fn top_of_book(&self, security: &Security) -> Option<TopOfBook> {
        self.books.read().get(security).cloned()
    }

    async fn market_trade_volume(
        &self,
        security: &Security,
        _period: Duration,
    ) -> Option<Decimal> {
        self.volumes.read().get(security).copied()
    }
}

//! Store seams consumed by the reconciliation engine.
//!
//! The engine assumes an external store offering by-id reads, filtered reads,
//! creates, and updates per entity. Each entity gets its own trait so the
//! surrounding system can back them independently; [`memory::InMemoryStore`]
//! implements all of them for the single-process deployment and for tests.
//!
//! Updates are whole-record last-writer-wins. The engine performs every
//! read-modify-write sequence under its cascade lock, so partial-update
//! semantics reduce to replacing the record it just read.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::orders::{
    CancelOrder, OrderId, OrderJournal, OrderSnapshot, Security, Side, StratId,
    SymbolSideSnapshot,
};
use crate::portfolio::PortfolioStatus;
use crate::strat::{PairStrat, StratBrief};

/// Order snapshot persistence, keyed by order id.
#[async_trait]
pub trait OrderSnapshotStore: Send + Sync {
    async fn create_order_snapshot(&self, snapshot: OrderSnapshot) -> Result<(), StoreError>;

    async fn read_order_snapshot(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<OrderSnapshot>, StoreError>;

    async fn update_order_snapshot(&self, snapshot: OrderSnapshot) -> Result<(), StoreError>;

    /// Count of snapshots in an open status for (security, side); feeds the
    /// consumable-open-orders computation.
    async fn open_order_count(&self, security: &Security, side: Side) -> Result<u32, StoreError>;

    /// Strategy teardown: drop all snapshots trading the security.
    async fn delete_order_snapshots_for_security(
        &self,
        security: &Security,
    ) -> Result<(), StoreError>;
}

/// Symbol-side aggregate persistence; at most one record per (security, side).
#[async_trait]
pub trait SymbolSideSnapshotStore: Send + Sync {
    async fn create_symbol_side_snapshot(
        &self,
        snapshot: SymbolSideSnapshot,
    ) -> Result<(), StoreError>;

    async fn read_symbol_side_snapshot(
        &self,
        security: &Security,
        side: Side,
    ) -> Result<Option<SymbolSideSnapshot>, StoreError>;

    async fn update_symbol_side_snapshot(
        &self,
        snapshot: SymbolSideSnapshot,
    ) -> Result<(), StoreError>;

    async fn delete_symbol_side_snapshot(
        &self,
        security: &Security,
        side: Side,
    ) -> Result<(), StoreError>;
}

/// Strat brief persistence; exactly one per active strategy.
#[async_trait]
pub trait StratBriefStore: Send + Sync {
    async fn create_strat_brief(&self, brief: StratBrief) -> Result<(), StoreError>;

    async fn read_strat_brief(&self, id: StratId) -> Result<Option<StratBrief>, StoreError>;

    /// Resolve the single brief with a leg trading `security`.
    async fn read_strat_brief_by_symbol(
        &self,
        security: &Security,
    ) -> Result<Option<StratBrief>, StoreError>;

    async fn update_strat_brief(&self, brief: StratBrief) -> Result<(), StoreError>;

    async fn delete_strat_brief(&self, id: StratId) -> Result<(), StoreError>;
}

/// Pair-strategy persistence.
#[async_trait]
pub trait PairStratStore: Send + Sync {
    async fn create_pair_strat(&self, strat: PairStrat) -> Result<(), StoreError>;

    async fn read_pair_strat(&self, id: StratId) -> Result<Option<PairStrat>, StoreError>;

    /// Resolve the single ongoing strategy with a leg matching
    /// (security, side). More than one match is a cardinality violation.
    async fn read_pair_strat_by_symbol_side(
        &self,
        security: &Security,
        side: Side,
    ) -> Result<Option<PairStrat>, StoreError>;

    async fn update_pair_strat(&self, strat: PairStrat) -> Result<(), StoreError>;
}

/// Singleton portfolio status persistence.
#[async_trait]
pub trait PortfolioStatusStore: Send + Sync {
    async fn create_portfolio_status(&self, status: PortfolioStatus) -> Result<(), StoreError>;

    async fn read_portfolio_status(&self, id: u32) -> Result<Option<PortfolioStatus>, StoreError>;

    async fn update_portfolio_status(&self, status: PortfolioStatus) -> Result<(), StoreError>;
}

/// Cancel-request bookkeeping; at most one record per order id.
#[async_trait]
pub trait CancelOrderStore: Send + Sync {
    async fn create_cancel_order(&self, cancel: CancelOrder) -> Result<(), StoreError>;

    async fn read_cancel_order(&self, order_id: &OrderId)
        -> Result<Option<CancelOrder>, StoreError>;

    async fn update_cancel_order(&self, cancel: CancelOrder) -> Result<(), StoreError>;
}

/// Append-only order journal with per-order tail reads.
///
/// Cancel-reject reversion inspects the most recent journal entries for an
/// order id, and the participation window sums submitted quantity over time.
#[async_trait]
pub trait OrderJournalStore: Send + Sync {
    async fn append_order_journal(&self, journal: OrderJournal) -> Result<(), StoreError>;

    /// The `n` most recent journal entries for the order id, newest first.
    async fn latest_order_journals(
        &self,
        order_id: &OrderId,
        n: usize,
    ) -> Result<Vec<OrderJournal>, StoreError>;

    /// Sum of NEW-event quantity for (security, side) since `since`.
    async fn order_qty_sum_since(
        &self,
        security: &Security,
        side: Side,
        since: DateTime<Utc>,
    ) -> Result<Decimal, StoreError>;
}

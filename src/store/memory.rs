//! In-memory reference implementation of every store trait.
//!
//! Backs the single-process singleton deployment and the test suites. Each
//! entity lives in its own lock-guarded map so unrelated entities never
//! contend; the per-order journal tail uses a concurrent map because appends
//! dominate reads there.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{
    CancelOrderStore, OrderJournalStore, OrderSnapshotStore, PairStratStore,
    PortfolioStatusStore, StratBriefStore, SymbolSideSnapshotStore,
};
use crate::error::StoreError;
use crate::orders::{
    CancelOrder, OrderEventType, OrderId, OrderJournal, OrderSnapshot, Security, Side, StratId,
    SymbolSideSnapshot,
};
use crate::portfolio::PortfolioStatus;
use crate::strat::{PairStrat, StratBrief};

/// All-entity in-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    order_snapshots: RwLock<HashMap<OrderId, OrderSnapshot>>,
    symbol_side_snapshots: RwLock<HashMap<(Security, Side), SymbolSideSnapshot>>,
    strat_briefs: RwLock<HashMap<StratId, StratBrief>>,
    pair_strats: RwLock<HashMap<StratId, PairStrat>>,
    portfolio_status: RwLock<HashMap<u32, PortfolioStatus>>,
    cancel_orders: RwLock<HashMap<OrderId, CancelOrder>>,
    order_journals: DashMap<OrderId, Vec<OrderJournal>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderSnapshotStore for InMemoryStore {
    async fn create_order_snapshot(&self, snapshot: OrderSnapshot) -> Result<(), StoreError> {
        let mut snapshots = self.order_snapshots.write().await;
        let order_id = snapshot.order_brief.order_id.clone();
        if snapshots.contains_key(&order_id) {
            return Err(StoreError::Duplicate {
                entity: "OrderSnapshot",
                key: order_id.to_string(),
            });
        }
        snapshots.insert(order_id, snapshot);
        Ok(())
    }

    async fn read_order_snapshot(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<OrderSnapshot>, StoreError> {
        let snapshots = self.order_snapshots.read().await;
        Ok(snapshots.get(order_id).cloned())
    }

    async fn update_order_snapshot(&self, snapshot: OrderSnapshot) -> Result<(), StoreError> {
        let mut snapshots = self.order_snapshots.write().await;
        let order_id = snapshot.order_brief.order_id.clone();
        if !snapshots.contains_key(&order_id) {
            return Err(StoreError::NotFound {
                entity: "OrderSnapshot",
                key: order_id.to_string(),
            });
        }
        snapshots.insert(order_id, snapshot);
        Ok(())
    }

    async fn open_order_count(&self, security: &Security, side: Side) -> Result<u32, StoreError> {
        let snapshots = self.order_snapshots.read().await;
        Ok(snapshots
            .values()
            .filter(|s| {
                s.order_brief.security == *security
                    && s.order_brief.side == side
                    && s.order_status.is_open()
            })
            .count() as u32)
    }

    async fn delete_order_snapshots_for_security(
        &self,
        security: &Security,
    ) -> Result<(), StoreError> {
        let mut snapshots = self.order_snapshots.write().await;
        snapshots.retain(|_, s| s.order_brief.security != *security);
        Ok(())
    }
}

#[async_trait]
impl SymbolSideSnapshotStore for InMemoryStore {
    async fn create_symbol_side_snapshot(
        &self,
        snapshot: SymbolSideSnapshot,
    ) -> Result<(), StoreError> {
        let mut snapshots = self.symbol_side_snapshots.write().await;
        let key = (snapshot.security.clone(), snapshot.side);
        if snapshots.contains_key(&key) {
            return Err(StoreError::Duplicate {
                entity: "SymbolSideSnapshot",
                key: format!("{}:{}", key.0, key.1),
            });
        }
        snapshots.insert(key, snapshot);
        Ok(())
    }

    async fn read_symbol_side_snapshot(
        &self,
        security: &Security,
        side: Side,
    ) -> Result<Option<SymbolSideSnapshot>, StoreError> {
        let snapshots = self.symbol_side_snapshots.read().await;
        Ok(snapshots.get(&(security.clone(), side)).cloned())
    }

    async fn update_symbol_side_snapshot(
        &self,
        snapshot: SymbolSideSnapshot,
    ) -> Result<(), StoreError> {
        let mut snapshots = self.symbol_side_snapshots.write().await;
        let key = (snapshot.security.clone(), snapshot.side);
        if !snapshots.contains_key(&key) {
            return Err(StoreError::NotFound {
                entity: "SymbolSideSnapshot",
                key: format!("{}:{}", key.0, key.1),
            });
        }
        snapshots.insert(key, snapshot);
        Ok(())
    }

    async fn delete_symbol_side_snapshot(
        &self,
        security: &Security,
        side: Side,
    ) -> Result<(), StoreError> {
        let mut snapshots = self.symbol_side_snapshots.write().await;
        snapshots.remove(&(security.clone(), side));
        Ok(())
    }
}

#[async_trait]
impl StratBriefStore for InMemoryStore {
    async fn create_strat_brief(&self, brief: StratBrief) -> Result<(), StoreError> {
        let mut briefs = self.strat_briefs.write().await;
        if briefs.contains_key(&brief.id) {
            return Err(StoreError::Duplicate {
                entity: "StratBrief",
                key: brief.id.to_string(),
            });
        }
        briefs.insert(brief.id, brief);
        Ok(())
    }

    async fn read_strat_brief(&self, id: StratId) -> Result<Option<StratBrief>, StoreError> {
        let briefs = self.strat_briefs.read().await;
        Ok(briefs.get(&id).cloned())
    }

    async fn read_strat_brief_by_symbol(
        &self,
        security: &Security,
    ) -> Result<Option<StratBrief>, StoreError> {
        let briefs = self.strat_briefs.read().await;
        let matches: Vec<&StratBrief> = briefs
            .values()
            .filter(|b| b.brief_for_security(security).is_some())
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].clone())),
            count => Err(StoreError::Cardinality {
                entity: "StratBrief",
                key: security.to_string(),
                count,
            }),
        }
    }

    async fn update_strat_brief(&self, brief: StratBrief) -> Result<(), StoreError> {
        let mut briefs = self.strat_briefs.write().await;
        if !briefs.contains_key(&brief.id) {
            return Err(StoreError::NotFound {
                entity: "StratBrief",
                key: brief.id.to_string(),
            });
        }
        briefs.insert(brief.id, brief);
        Ok(())
    }

    async fn delete_strat_brief(&self, id: StratId) -> Result<(), StoreError> {
        let mut briefs = self.strat_briefs.write().await;
        briefs.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PairStratStore for InMemoryStore {
    async fn create_pair_strat(&self, strat: PairStrat) -> Result<(), StoreError> {
        let mut strats = self.pair_strats.write().await;
        if strats.contains_key(&strat.id) {
            return Err(StoreError::Duplicate {
                entity: "PairStrat",
                key: strat.id.to_string(),
            });
        }
        strats.insert(strat.id, strat);
        Ok(())
    }

    async fn read_pair_strat(&self, id: StratId) -> Result<Option<PairStrat>, StoreError> {
        let strats = self.pair_strats.read().await;
        Ok(strats.get(&id).cloned())
    }

    async fn read_pair_strat_by_symbol_side(
        &self,
        security: &Security,
        side: Side,
    ) -> Result<Option<PairStrat>, StoreError> {
        let strats = self.pair_strats.read().await;
        let matches: Vec<&PairStrat> = strats
            .values()
            .filter(|s| {
                s.strat_status.strat_state.is_ongoing() && s.matches_symbol_side(security, side)
            })
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].clone())),
            count => Err(StoreError::Cardinality {
                entity: "PairStrat",
                key: format!("{security}:{side}"),
                count,
            }),
        }
    }

    async fn update_pair_strat(&self, strat: PairStrat) -> Result<(), StoreError> {
        let mut strats = self.pair_strats.write().await;
        if !strats.contains_key(&strat.id) {
            return Err(StoreError::NotFound {
                entity: "PairStrat",
                key: strat.id.to_string(),
            });
        }
        strats.insert(strat.id, strat);
        Ok(())
    }
}

#[async_trait]
impl PortfolioStatusStore for InMemoryStore {
    async fn create_portfolio_status(&self, status: PortfolioStatus) -> Result<(), StoreError> {
        let mut statuses = self.portfolio_status.write().await;
        if statuses.contains_key(&status.id) {
            return Err(StoreError::Duplicate {
                entity: "PortfolioStatus",
                key: status.id.to_string(),
            });
        }
        statuses.insert(status.id, status);
        Ok(())
    }

    async fn read_portfolio_status(&self, id: u32) -> Result<Option<PortfolioStatus>, StoreError> {
        let statuses = self.portfolio_status.read().await;
        Ok(statuses.get(&id).cloned())
    }

    async fn update_portfolio_status(&self, status: PortfolioStatus) -> Result<(), StoreError> {
        let mut statuses = self.portfolio_status.write().await;
        if !statuses.contains_key(&status.id) {
            return Err(StoreError::NotFound {
                entity: "PortfolioStatus",
                key: status.id.to_string(),
            });
        }
        statuses.insert(status.id, status);
        Ok(())
    }
}

#[async_trait]
impl CancelOrderStore for InMemoryStore {
    async fn create_cancel_order(&self, cancel: CancelOrder) -> Result<(), StoreError> {
        let mut cancels = self.cancel_orders.write().await;
        if cancels.contains_key(&cancel.order_id) {
            return Err(StoreError::Duplicate {
                entity: "CancelOrder",
                key: cancel.order_id.to_string(),
            });
        }
        cancels.insert(cancel.order_id.clone(), cancel);
        Ok(())
    }

    async fn read_cancel_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<CancelOrder>, StoreError> {
        let cancels = self.cancel_orders.read().await;
        Ok(cancels.get(order_id).cloned())
    }

    async fn update_cancel_order(&self, cancel: CancelOrder) -> Result<(), StoreError> {
        let mut cancels = self.cancel_orders.write().await;
        if !cancels.contains_key(&cancel.order_id) {
            return Err(StoreError::NotFound {
                entity: "CancelOrder",
                key: cancel.order_id.to_string(),
            });
        }
        cancels.insert(cancel.order_id.clone(), cancel);
        Ok(())
    }
}

#[async_trait]
impl OrderJournalStore for InMemoryStore {
    async fn append_order_journal(&self, journal: OrderJournal) -> Result<(), StoreError> {
        self.order_journals
            .entry(journal.order.order_id.clone())
            .or_default()
            .push(journal);
        Ok(())
    }

    async fn latest_order_journals(
        &self,
        order_id: &OrderId,
        n: usize,
    ) -> Result<Vec<OrderJournal>, StoreError> {
        Ok(self
            .order_journals
            .get(order_id)
            .map(|entries| entries.iter().rev().take(n).cloned().collect())
            .unwrap_or_default())
    }

    async fn order_qty_sum_since(
        &self,
        security: &Security,
        side: Side,
        since: DateTime<Utc>,
    ) -> Result<Decimal, StoreError> {
        let mut sum = Decimal::ZERO;
        for entry in self.order_journals.iter() {
            for journal in entry.value() {
                if journal.order_event == OrderEventType::New
                    && journal.order.security == *security
                    && journal.order.side == side
                    && journal.order_event_date_time >= since
                {
                    sum += journal.order.qty;
                }
            }
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderBrief;
    use crate::strat::{StratLeg, StratLimits, StratState};
    use rust_decimal_macros::dec;

    fn snapshot(order_id: &str) -> OrderSnapshot {
        let brief = OrderBrief::new(
            order_id,
            Security::new("CB_Sec_1"),
            Side::Buy,
            dec!(100),
            dec!(90),
        );
        OrderSnapshot::from_new_order(brief, Utc::now())
    }

    #[tokio::test]
    async fn test_order_snapshot_create_read_update() {
        let store = InMemoryStore::new();
        store.create_order_snapshot(snapshot("O1")).await.unwrap();

        let read = store
            .read_order_snapshot(&OrderId::from("O1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.order_brief.qty, dec!(90));

        let dup = store.create_order_snapshot(snapshot("O1")).await;
        assert!(matches!(dup, Err(StoreError::Duplicate { .. })));

        let missing = store.update_order_snapshot(snapshot("O2")).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_order_count_tracks_status() {
        let store = InMemoryStore::new();
        store.create_order_snapshot(snapshot("O1")).await.unwrap();
        store.create_order_snapshot(snapshot("O2")).await.unwrap();

        let count = store
            .open_order_count(&Security::new("CB_Sec_1"), Side::Buy)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let mut closed = snapshot("O3");
        closed.order_status = crate::orders::OrderStatus::Dod;
        store.create_order_snapshot(closed).await.unwrap();
        let count = store
            .open_order_count(&Security::new("CB_Sec_1"), Side::Buy)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_pair_strat_symbol_side_resolution() {
        let store = InMemoryStore::new();
        let mut strat = PairStrat::new(
            StratId(1),
            StratLeg::new(Security::new("CB_Sec_1"), Side::Buy),
            StratLeg::new(Security::new("EQT_Sec_1"), Side::Sell),
            StratLimits::permissive(),
        );
        strat.strat_status.strat_state = StratState::Active;
        store.create_pair_strat(strat.clone()).await.unwrap();

        let hit = store
            .read_pair_strat_by_symbol_side(&Security::new("CB_Sec_1"), Side::Buy)
            .await
            .unwrap();
        assert!(hit.is_some());

        let miss = store
            .read_pair_strat_by_symbol_side(&Security::new("CB_Sec_1"), Side::Sell)
            .await
            .unwrap();
        assert!(miss.is_none());

        // Snoozed strategies no longer occupy the symbol/side.
        strat.strat_status.strat_state = StratState::Snoozed;
        store.update_pair_strat(strat).await.unwrap();
        let gone = store
            .read_pair_strat_by_symbol_side(&Security::new("CB_Sec_1"), Side::Buy)
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_journal_tail_is_newest_first() {
        let store = InMemoryStore::new();
        let brief = OrderBrief::new(
            "O1",
            Security::new("CB_Sec_1"),
            Side::Buy,
            dec!(100),
            dec!(90),
        );
        for event in [
            OrderEventType::New,
            OrderEventType::Ack,
            OrderEventType::Cxl,
        ] {
            store
                .append_order_journal(OrderJournal::new(brief.clone(), event))
                .await
                .unwrap();
        }

        let tail = store
            .latest_order_journals(&OrderId::from("O1"), 2)
            .await
            .unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].order_event, OrderEventType::Cxl);
        assert_eq!(tail[1].order_event, OrderEventType::Ack);
    }

    #[tokio::test]
    async fn test_order_qty_sum_window() {
        let store = InMemoryStore::new();
        let brief = OrderBrief::new(
            "O1",
            Security::new("CB_Sec_1"),
            Side::Buy,
            dec!(100),
            dec!(90),
        );
        store
            .append_order_journal(OrderJournal::new(brief.clone(), OrderEventType::New))
            .await
            .unwrap();
        store
            .append_order_journal(OrderJournal::new(brief, OrderEventType::Ack))
            .await
            .unwrap();

        let since = Utc::now() - chrono::Duration::seconds(60);
        let sum = store
            .order_qty_sum_since(&Security::new("CB_Sec_1"), Side::Buy, since)
            .await
            .unwrap();
        assert_eq!(sum, dec!(90));
    }
}

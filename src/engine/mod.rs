//! The order-event reconciliation engine.
//!
//! Consumes order journal and fill journal events and deterministically
//! updates order snapshots, symbol-side snapshots, per-strategy briefs,
//! aggregate strategy status, and portfolio status, including the
//! pause/error state machine driven by limit breaches.
//!
//! # Concurrency
//!
//! Journal handling runs on the async runtime; events for different orders
//! may be scheduled concurrently but every read-modify-write cascade runs
//! under the engine's cascade lock, so two events touching the same
//! strategy/symbol can never interleave their sequences. A second lock
//! guards portfolio-singleton creation and mutation, and a third guards the
//! day-scoped activation bookkeeping. Store I/O awaits while holding the
//! cascade lock - the locks are async, never thread-blocking.
//!
//! # Failure semantics
//!
//! Not-ready and missing-market-data conditions surface to the caller as
//! retryable errors before any mutation. A missing prior record mid-cascade
//! logs an error and aborts the remaining steps for that event; mutations
//! already committed are not rolled back - the system favors eventual
//! consistency with visible alerts over transactional atomicity.

mod brief;
mod context;
mod fill_journal;
mod lifecycle;
mod limits;
mod order_journal;
mod strat_status;

pub use limits::{EvalContext, Evaluation, LimitCheck, LimitEvaluator};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

use crate::activation::ActivationRegistry;
use crate::error::{EngineError, StoreError};
use crate::market::{MarketDataAdapter, PricingAdapter, ReferenceDataAdapter};
use crate::orders::StratId;
use crate::portfolio::{PortfolioStatus, PORTFOLIO_STATUS_ID};
use crate::store::{
    CancelOrderStore, OrderJournalStore, OrderSnapshotStore, PairStratStore,
    PortfolioStatusStore, StratBriefStore, SymbolSideSnapshotStore,
};
use crate::strat::PairStrat;

/// Everything the engine needs from the store layer, as one object.
pub trait StratManagerStore:
    OrderSnapshotStore
    + SymbolSideSnapshotStore
    + StratBriefStore
    + PairStratStore
    + PortfolioStatusStore
    + CancelOrderStore
    + OrderJournalStore
{
}

impl<T> StratManagerStore for T where
    T: OrderSnapshotStore
        + SymbolSideSnapshotStore
        + StratBriefStore
        + PairStratStore
        + PortfolioStatusStore
        + CancelOrderStore
        + OrderJournalStore
{
}

/// The reconciliation engine.
///
/// All dependencies are injected at construction; there is no global state.
pub struct ReconciliationEngine {
    pub(crate) store: Arc<dyn StratManagerStore>,
    pub(crate) pricing: Arc<dyn PricingAdapter>,
    pub(crate) reference_data: Arc<dyn ReferenceDataAdapter>,
    pub(crate) market_data: Arc<dyn MarketDataAdapter>,
    pub(crate) activation_registry: Arc<dyn ActivationRegistry>,
    pub(crate) evaluator: LimitEvaluator,
    /// Flips true once reference/market-data dependencies are initialized
    ready: AtomicBool,
    /// Serializes the full per-event cascade
    pub(crate) cascade_lock: Mutex<()>,
    /// Serializes portfolio-singleton creation and mutation
    pub(crate) portfolio_lock: Mutex<()>,
    /// Serializes activation bookkeeping
    pub(crate) activation_lock: Mutex<()>,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn StratManagerStore>,
        pricing: Arc<dyn PricingAdapter>,
        reference_data: Arc<dyn ReferenceDataAdapter>,
        market_data: Arc<dyn MarketDataAdapter>,
        activation_registry: Arc<dyn ActivationRegistry>,
    ) -> Self {
        Self {
            store,
            pricing,
            reference_data,
            market_data,
            activation_registry,
            evaluator: LimitEvaluator::new(),
            ready: AtomicBool::new(false),
            cascade_lock: Mutex::new(()),
            portfolio_lock: Mutex::new(()),
            activation_lock: Mutex::new(()),
        }
    }

    /// Compose an externally supplied limit check into every evaluation.
    ///
    /// Call before sharing the engine across tasks.
    pub fn add_limit_check(&mut self, check: Arc<dyn LimitCheck>) {
        self.evaluator.add_check(check);
    }

    /// Mark the service ready; journal events fail with a retryable
    /// not-ready condition until this is called.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// True once dependencies are initialized.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Read the singleton portfolio status, creating it if absent.
    pub async fn get_or_create_portfolio_status(
        &self,
    ) -> Result<PortfolioStatus, EngineError> {
        let _guard = self.portfolio_lock.lock().await;
        self.get_or_create_portfolio_status_locked().await
    }

    /// Singleton read-or-create; caller must hold `portfolio_lock`.
    pub(crate) async fn get_or_create_portfolio_status_locked(
        &self,
    ) -> Result<PortfolioStatus, EngineError> {
        match self.store.read_portfolio_status(PORTFOLIO_STATUS_ID).await? {
            Some(status) => Ok(status),
            None => {
                let status = PortfolioStatus::new(chrono::Utc::now());
                self.store.create_portfolio_status(status.clone()).await?;
                Ok(status)
            }
        }
    }

    /// Read a strategy by id, converting absence to a not-found error.
    pub(crate) async fn load_strat(&self, id: StratId) -> Result<PairStrat, EngineError> {
        self.store
            .read_pair_strat(id)
            .await?
            .ok_or_else(|| {
                EngineError::Store(StoreError::NotFound {
                    entity: "PairStrat",
                    key: id.to_string(),
                })
            })
    }

    /// Persist a strategy with a bumped update counter, surfacing failures.
    pub(crate) async fn try_persist_strat(
        &self,
        mut strat: PairStrat,
    ) -> Result<(), EngineError> {
        strat.frequency += 1;
        strat.last_active_date_time = chrono::Utc::now();
        self.store.update_pair_strat(strat).await.map_err(|e| {
            error!(%e, "pair strat update failed");
            EngineError::Store(e)
        })
    }
}

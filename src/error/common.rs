//! Error types shared across the crate.

use thiserror::Error;

use crate::orders::{OrderEventType, OrderId, OrderStatus, StratId};
use crate::strat::StratState;

/// Store access errors.
///
/// Raised by the store traits for missing records, cardinality violations
/// (expected exactly one record, found zero or several), and duplicate
/// creates.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum StoreError {
    /// Expected record was not found
    #[error("{entity} not found for key {key}")]
    NotFound { entity: &'static str, key: String },

    /// Expected exactly one record, found more
    #[error("expected one {entity} for key {key}, found {count}")]
    Cardinality {
        entity: &'static str,
        key: String,
        count: usize,
    },

    /// Create collided with an existing record
    #[error("{entity} already exists for key {key}")]
    Duplicate { entity: &'static str, key: String },
}

/// Errors surfaced by the reconciliation engine at the event boundary.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum EngineError {
    /// Service dependencies are not initialized yet; the caller should retry
    /// the whole event later. Nothing was mutated.
    #[error("service unavailable: reconciliation engine is not ready")]
    NotReady,

    /// No top-of-book available for a computation that requires one
    #[error("no market data available for {security}")]
    MarketDataUnavailable { security: String },

    /// An order event arrived for a snapshot in a status that does not
    /// accept it
    #[error("order {order_id}: event {event} not applicable in status {status}")]
    UnsupportedTransition {
        order_id: OrderId,
        event: OrderEventType,
        status: OrderStatus,
    },

    /// A fill referenced an order id with no snapshot
    #[error("no order snapshot found for fill on order {order_id}")]
    NoOrderForFill { order_id: OrderId },

    /// A fill arrived for an order that is already completely filled
    #[error("order {order_id} is fully filled; fill rejected")]
    FillOnFilledOrder { order_id: OrderId },

    /// A lifecycle operation requested a strategy state change the state
    /// machine does not allow
    #[error("strat {id}: cannot transition from {from} to {to}")]
    InvalidStratTransition {
        id: StratId,
        from: StratState,
        to: StratState,
    },

    /// Activation refused by the day-scoped guard or symbol-side occupancy
    #[error("strat {strat_id}: activation blocked on {security}: {reason}")]
    ActivationBlocked {
        strat_id: StratId,
        security: String,
        reason: String,
    },

    /// Store access failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

//! Order domain: journal events, lifecycle state machine, and snapshots.
//!
//! The order journal is an append-only stream of lifecycle events
//! (NEW/ACK/CXL/CXL_ACK/CXL_REJ/REJ); the fill journal is an append-only
//! stream of executions. This module defines those records plus the two
//! projections the reconciliation engine maintains from them:
//!
//! - [`OrderSnapshot`] - one per order id
//! - [`SymbolSideSnapshot`] - one per (security, side)
//!
//! All mutation arithmetic lives on the projection types and is pure; the
//! `engine` module decides when it runs.

mod snapshot;
mod symbol_side;
mod types;

pub use snapshot::{FillApplication, OrderSnapshot, OrderSnapshotError};
pub use symbol_side::SymbolSideSnapshot;
pub use types::{
    CancelOrder, FillId, FillJournal, OrderBrief, OrderEventType, OrderId, OrderJournal,
    OrderStatus, Security, Side, StratId,
};

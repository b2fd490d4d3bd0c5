//! Core order types for the reconciliation engine.
//!
//! This module defines the fundamental vocabulary of the order journal:
//! - `Side` - Buy or Sell (one leg direction of a pair strategy)
//! - `Security` - the instrument identifier carried on every record
//! - `OrderStatus` - order lifecycle state machine with validated transitions
//! - `OrderEventType` - the closed set of journal event types
//! - `OrderBrief` / `OrderJournal` / `FillJournal` - the inbound event records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side indicating buy or sell direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Buy leg - acquire the security
    Buy,
    /// Sell leg - dispose of the security
    Sell,
}

impl Side {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Returns true if this is the buy side
    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Security identifier.
///
/// The engine treats securities as opaque identifiers; resolution to market
/// data and reference data happens through the injected adapters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Security {
    /// The security id (e.g. "CB_Sec_1")
    pub sec_id: String,
}

impl Security {
    /// Create a new Security
    pub fn new(sec_id: impl Into<String>) -> Self {
        Self {
            sec_id: sec_id.into(),
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sec_id)
    }
}

impl From<&str> for Security {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Order id - unique identifier assigned by the originating system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    /// Create a new OrderId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Fill id - unique identifier for one execution report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FillId(pub String);

impl FillId {
    /// Create a new FillId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FillId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pair-strategy id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StratId(pub u32);

impl fmt::Display for StratId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StratId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Order lifecycle status.
///
/// State transitions:
/// ```text
/// UNACK ──ACK──────────────► ACKED
/// UNACK ──CXL_ACK / REJ────► DOD
/// ACKED ──CXL──────────────► CXL_UNACK
/// ACKED ──CXL_ACK / REJ────► DOD
/// CXL_UNACK ──CXL_ACK──────► DOD
/// CXL_UNACK ──CXL_REJ──────► ACKED | UNACK | FILLED | OVER_FILLED
/// (non-terminal) ──fill, filled == qty──► FILLED
/// (non-terminal) ──fill, filled >  qty──► OVER_FILLED (error path)
/// ```
///
/// `DOD`, `FILLED` and `OVER_FILLED` are absorbing with respect to further
/// cancel handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Submitted, not yet acknowledged by the venue
    Unack,
    /// Acknowledged and live
    Acked,
    /// Cancel requested, awaiting cancel acknowledgement
    CxlUnack,
    /// Done-on-day: cancelled or rejected (terminal)
    Dod,
    /// Completely filled (terminal)
    Filled,
    /// Filled beyond order quantity - error state (terminal)
    OverFilled,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Dod | OrderStatus::Filled | OrderStatus::OverFilled
        )
    }

    /// Returns true if the order still holds open quantity
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Unack | OrderStatus::Acked | OrderStatus::CxlUnack
        )
    }

    /// Check if a transition from the current status to `target` is valid
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match self {
            OrderStatus::Unack => matches!(
                target,
                OrderStatus::Acked
                    | OrderStatus::Dod
                    | OrderStatus::Filled
                    | OrderStatus::OverFilled
            ),
            OrderStatus::Acked => matches!(
                target,
                OrderStatus::CxlUnack
                    | OrderStatus::Dod
                    | OrderStatus::Filled
                    | OrderStatus::OverFilled
            ),
            // CxlUnack may revert on a cancel-reject, so every non-terminal
            // status plus the fill terminals is reachable.
            OrderStatus::CxlUnack => matches!(
                target,
                OrderStatus::Dod
                    | OrderStatus::Acked
                    | OrderStatus::Unack
                    | OrderStatus::Filled
                    | OrderStatus::OverFilled
            ),
            OrderStatus::Dod | OrderStatus::Filled | OrderStatus::OverFilled => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Unack => write!(f, "UNACK"),
            OrderStatus::Acked => write!(f, "ACKED"),
            OrderStatus::CxlUnack => write!(f, "CXL_UNACK"),
            OrderStatus::Dod => write!(f, "DOD"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::OverFilled => write!(f, "OVER_FILLED"),
        }
    }
}

/// Order journal event type.
///
/// A closed set: the engine dispatches with an exhaustive `match`, so an
/// unmapped event type cannot exist at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    /// New order submitted
    New,
    /// Venue acknowledged the order
    Ack,
    /// Cancel requested
    Cxl,
    /// Venue acknowledged the cancel
    CxlAck,
    /// Venue rejected the cancel
    CxlRej,
    /// Venue rejected the order
    Rej,
}

impl fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderEventType::New => write!(f, "NEW"),
            OrderEventType::Ack => write!(f, "ACK"),
            OrderEventType::Cxl => write!(f, "CXL"),
            OrderEventType::CxlAck => write!(f, "CXL_ACK"),
            OrderEventType::CxlRej => write!(f, "CXL_REJ"),
            OrderEventType::Rej => write!(f, "REJ"),
        }
    }
}

/// Immutable request facts of one order, carried on every journal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBrief {
    /// Order id (unique per order, shared across its journal events)
    pub order_id: OrderId,
    /// Security being traded
    pub security: Security,
    /// Buy or sell
    pub side: Side,
    /// Limit price in local currency (0 on market orders until substituted)
    pub px: Decimal,
    /// Total quantity ordered
    pub qty: Decimal,
    /// USD notional, px x qty after price substitution
    pub order_notional: Decimal,
    /// Free-text lines appended on cancel/reject
    pub text: Vec<String>,
}

impl OrderBrief {
    /// Create a new order brief with empty text and zero notional
    pub fn new(
        order_id: impl Into<OrderId>,
        security: Security,
        side: Side,
        px: Decimal,
        qty: Decimal,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            security,
            side,
            px,
            qty,
            order_notional: Decimal::ZERO,
            text: Vec::new(),
        }
    }
}

impl fmt::Display for OrderBrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order({} {} {} {} @ {})",
            self.order_id, self.side, self.qty, self.security, self.px
        )
    }
}

/// One order lifecycle event from the order journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderJournal {
    /// The order the event refers to
    pub order: OrderBrief,
    /// Which lifecycle event occurred
    pub order_event: OrderEventType,
    /// Event timestamp
    pub order_event_date_time: DateTime<Utc>,
}

impl OrderJournal {
    /// Create a journal event stamped now
    pub fn new(order: OrderBrief, order_event: OrderEventType) -> Self {
        Self {
            order,
            order_event,
            order_event_date_time: Utc::now(),
        }
    }
}

/// One execution event from the fill journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillJournal {
    /// Unique id of this fill
    pub id: FillId,
    /// Order this fill executes against
    pub order_id: OrderId,
    /// Execution price in local currency
    pub fill_px: Decimal,
    /// Executed quantity
    pub fill_qty: Decimal,
    /// Security (redundant with the order, carried for routing)
    pub fill_symbol: Security,
    /// Side (redundant with the order, carried for routing)
    pub fill_side: Side,
    /// Execution timestamp
    pub fill_date_time: DateTime<Utc>,
}

/// Pending/confirmed cancel request for one order id.
///
/// Guards against duplicate cancel requests and duplicate cancel
/// confirmations: at most one record per order id, `cxl_confirmed` flips to
/// true exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrder {
    /// Order the cancel refers to
    pub order_id: OrderId,
    /// Security of the order
    pub security: Security,
    /// Side of the order
    pub side: Side,
    /// True once the venue acknowledged the cancel
    pub cxl_confirmed: bool,
}

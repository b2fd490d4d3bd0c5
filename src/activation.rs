//! Day-scoped activation registry.
//!
//! At most one strategy may be activated per calendar day for a given symbol
//! in opposing leg/side combinations. The registry records which securities
//! saw an activation today; the engine consults it (under its activation
//! lock) before flipping a strategy to ACTIVE.

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::orders::{Security, StratId};

/// Keyed record of today's strategy activations.
pub trait ActivationRegistry: Send + Sync {
    /// True if any strategy already activated on this security today
    fn has_activated_today(&self, security: &Security) -> bool;

    /// Record an activation for the security
    fn mark_activated(&self, security: Security, strat_id: StratId);

    /// The strategy that activated the security today, if any
    fn activated_by(&self, security: &Security) -> Option<StratId>;
}

/// Process-local registry; entries reset when the calendar day rolls over.
#[derive(Debug)]
pub struct InMemoryActivationRegistry {
    inner: RwLock<DayEntries>,
}

#[derive(Debug)]
struct DayEntries {
    day: NaiveDate,
    entries: HashMap<Security, StratId>,
}

impl InMemoryActivationRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(DayEntries {
                day: Utc::now().date_naive(),
                entries: HashMap::new(),
            }),
        }
    }

    fn roll_day(&self) {
        let today = Utc::now().date_naive();
        let mut inner = self.inner.write();
        if inner.day != today {
            inner.day = today;
            inner.entries.clear();
        }
    }
}

impl Default for InMemoryActivationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationRegistry for InMemoryActivationRegistry {
    fn has_activated_today(&self, security: &Security) -> bool {
        self.roll_day();
        self.inner.read().entries.contains_key(security)
    }

    fn mark_activated(&self, security: Security, strat_id: StratId) {
        self.roll_day();
        self.inner.write().entries.insert(security, strat_id);
    }

    fn activated_by(&self, security: &Security) -> Option<StratId> {
        self.roll_day();
        self.inner.read().entries.get(security).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_query() {
        let registry = InMemoryActivationRegistry::new();
        let sec = Security::new("CB_Sec_1");
        assert!(!registry.has_activated_today(&sec));

        registry.mark_activated(sec.clone(), StratId(1));
        assert!(registry.has_activated_today(&sec));
        assert_eq!(registry.activated_by(&sec), Some(StratId(1)));
        assert!(!registry.has_activated_today(&Security::new("EQT_Sec_1")));
    }
}

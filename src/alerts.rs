//! Operator alerts accumulated on strategy and portfolio status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Alert severity; ordering reflects escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational only
    Info,
    /// Needs monitoring
    Warning,
    /// Something went wrong; strategy likely paused
    Error,
    /// Requires immediate operator intervention
    Critical,
}

impl Severity {
    /// True when an operator is expected to act on this alert
    pub fn requires_intervention(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One alert line attached to a strategy or the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert id
    pub id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable description
    pub alert_brief: String,
    /// How many times this brief has re-fired
    pub alert_count: u32,
    /// Last time this alert fired
    pub last_update_date_time: DateTime<Utc>,
}

impl Alert {
    /// Create a fresh alert
    pub fn new(severity: Severity, alert_brief: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            severity,
            alert_brief: alert_brief.into(),
            alert_count: 1,
            last_update_date_time: Utc::now(),
        }
    }

    /// Shorthand for an error-severity alert
    pub fn error(alert_brief: impl Into<String>) -> Self {
        Self::new(Severity::Error, alert_brief)
    }

    /// Shorthand for a critical-severity alert
    pub fn critical(alert_brief: impl Into<String>) -> Self {
        Self::new(Severity::Critical, alert_brief)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (x{})", self.severity, self.alert_brief, self.alert_count)
    }
}

/// Merge an alert into a list, re-firing instead of duplicating when an
/// alert with the same brief already exists.
pub fn merge_alert(alerts: &mut Vec<Alert>, alert: Alert) {
    if let Some(existing) = alerts
        .iter_mut()
        .find(|a| a.alert_brief == alert.alert_brief)
    {
        existing.alert_count += 1;
        existing.severity = existing.severity.max(alert.severity);
        existing.last_update_date_time = alert.last_update_date_time;
    } else {
        alerts.push(alert);
    }
}

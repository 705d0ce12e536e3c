//! Derived alert types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Period;

/// Deterministic composite alert key.
///
/// Built from the identity of the flagged condition only (entity id, alert
/// kind, period), never from volatile fields. Recomputing from an unchanged
/// snapshot always reproduces the same id, which is what read-state and
/// push-dedup correctness rest on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Key for an overdue transaction: `overdue-{txId}`.
    pub fn overdue(tx_id: &str) -> Self {
        Self(format!("overdue-{tx_id}"))
    }

    /// Key for a statement due soon: `bill-due-{cardId}-{month0}-{year}`.
    pub fn bill_due(card_id: &str, period: Period) -> Self {
        Self(format!("bill-due-{card_id}-{}", period.key_suffix()))
    }

    /// Key for a limit warning: `limit-warning-{cardId}-{month0}-{year}`.
    pub fn limit_warning(card_id: &str, period: Period) -> Self {
        Self(format!("limit-warning-{card_id}-{}", period.key_suffix()))
    }

    /// Key for an exceeded budget: `budget-exceeded-{budgetId}-{month0}-{year}`.
    pub fn budget_exceeded(budget_id: &str, period: Period) -> Self {
        Self(format!("budget-exceeded-{budget_id}-{}", period.key_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The condition class an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overdue,
    BillDue,
    LimitWarning,
    BudgetExceeded,
}

/// Ordinal urgency used for sort priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    /// Sort rank: lower sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
        }
    }
}

/// What entity a consumer should navigate to when acting on an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Transaction,
    Card,
    Budget,
}

/// Navigation target attached to an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    pub kind: ActionKind,
    pub id: String,
}

impl ActionRef {
    pub fn transaction(id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Transaction,
            id: id.into(),
        }
    }

    pub fn card(id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Card,
            id: id.into(),
        }
    }

    pub fn budget(id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Budget,
            id: id.into(),
        }
    }
}

/// An identity-stable warning about a financial condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Reference date used for ordering (entity date, due date, or "today").
    pub date: DateTime<Utc>,
    pub action: ActionRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_keys_embed_period() {
        let period = Period::new(2, 2024);
        assert_eq!(AlertId::overdue("tx1").as_str(), "overdue-tx1");
        assert_eq!(AlertId::bill_due("c1", period).as_str(), "bill-due-c1-2-2024");
        assert_eq!(
            AlertId::limit_warning("c1", period).as_str(),
            "limit-warning-c1-2-2024"
        );
        assert_eq!(
            AlertId::budget_exceeded("b1", period).as_str(),
            "budget-exceeded-b1-2-2024"
        );
    }

    #[test]
    fn high_outranks_medium() {
        assert!(Severity::High.rank() < Severity::Medium.rank());
    }
}

//! Financial records as supplied by the external data layer.
//!
//! These mirror the documents the hosted store emits. The data layer performs
//! no validation, so amounts and dates are `Option`s; a record missing a
//! field required by a rule is skipped by that rule (fail-soft), never an
//! error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Period;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single ledger entry (bill, payment, income).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub amount: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
    /// `false` marks an entry still awaiting payment.
    pub paid: bool,
    pub category: String,
    pub account_id: String,
    pub description: String,
}

/// A credit card with its statement due day and optional spending limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    /// Day of month the statement is due (1..=31).
    pub due_day: u32,
    pub limit: Option<Decimal>,
}

/// A purchase charged to a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardExpense {
    pub id: String,
    pub card_id: String,
    pub amount: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
    pub category: String,
}

/// A per-category spending cap for the active period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub category_id: String,
    pub amount: Decimal,
}

/// Everything the rule engine needs for one derivation pass.
///
/// Owned by the caller and emitted fresh on every data change; the engine
/// borrows it and never mutates it. `now` is the reference clock for all
/// date comparisons, so derivation is reproducible for a fixed snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub transactions: Vec<Transaction>,
    pub cards: Vec<Card>,
    pub card_expenses: Vec<CardExpense>,
    pub budgets: Vec<Budget>,
    pub period: Period,
    pub now: DateTime<Utc>,
}

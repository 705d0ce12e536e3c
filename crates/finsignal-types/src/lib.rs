//! FinSignal Types - Canonical domain types for the alert engine
//!
//! This crate contains all foundational types for FinSignal with zero
//! dependencies on other finsignal crates. It defines:
//!
//! - Financial records as supplied by the data layer (`Transaction`, `Card`,
//!   `CardExpense`, `Budget`)
//! - The [`FinancialSnapshot`] the engine derives alerts from
//! - Alert types ([`Alert`], [`AlertId`], [`AlertKind`], [`Severity`])
//! - The active [`Period`] (month + year) alerts are scoped to
//! - BRL money formatting
//!
//! # Architectural Invariants
//!
//! 1. An [`AlertId`] is a deterministic composite key built from the identity
//!    of the underlying condition (entity id + alert kind + period). It never
//!    encodes volatile fields such as amounts or descriptions, so editing a
//!    record without changing the flagged condition preserves its id.
//! 2. Records arriving from the data layer may be malformed; amount and date
//!    fields are therefore `Option`s, and a missing field causes the record
//!    to be skipped by the rule that needs it, never an error.

pub mod alert;
pub mod money;
pub mod period;
pub mod record;

pub use alert::*;
pub use money::*;
pub use period::*;
pub use record::*;

/// Version of the FinSignal types schema
pub const TYPES_VERSION: &str = "0.1.0";

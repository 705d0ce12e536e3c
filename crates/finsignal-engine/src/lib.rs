//! FinSignal Engine - Alert derivation rules
//!
//! This crate turns a [`FinancialSnapshot`] into an ordered list of
//! [`Alert`]s. Derivation is a pure function: no I/O, no side effects, and
//! deterministic for a fixed snapshot (the snapshot carries its own `now`).
//!
//! # Rules
//!
//! - **Overdue**: an unpaid transaction dated before today (High)
//! - **Bill due**: a card statement due within the next 3 days with charges
//!   in the active period (Medium)
//! - **Limit warning**: period charges at 80% of a card's limit (Medium),
//!   or past 100% (High)
//! - **Budget exceeded**: category spend at or past the budget cap (Medium)
//!
//! Rules evaluate independently; a record missing a required amount or date
//! is skipped by the rule that needs it and never suppresses other alerts.
//!
//! # Ordering
//!
//! Stable sort by `(severity, date descending)`. Ties keep rule-emission
//! order (overdue, bill-due, limit-warning, budget-exceeded) and snapshot
//! order within a rule, so the derived list is reproducible exactly.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use finsignal_types::{
    format_brl, round_percent, ActionRef, Alert, AlertId, AlertKind, Card, FinancialSnapshot,
    Severity, TransactionKind,
};

/// How close a due date must be before a bill-due alert fires.
const BILL_DUE_WINDOW_DAYS: i64 = 3;

/// Limit usage percentage at which a warning starts.
const LIMIT_WARNING_PCT: u32 = 80;

/// Derive the ordered alert list for a snapshot.
///
/// Total over well-formed input: malformed records are skipped per rule,
/// never propagated.
pub fn derive_alerts(snapshot: &FinancialSnapshot) -> Vec<Alert> {
    let today = snapshot.now.date_naive();

    let mut alerts = Vec::new();
    overdue_alerts(snapshot, today, &mut alerts);
    bill_due_alerts(snapshot, today, &mut alerts);
    limit_alerts(snapshot, today, &mut alerts);
    budget_alerts(snapshot, today, &mut alerts);

    // Stable sort, so equal keys keep rule-emission order.
    alerts.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.date.cmp(&a.date))
    });
    alerts
}

/// Rule 1: unpaid transactions dated strictly before today.
fn overdue_alerts(snapshot: &FinancialSnapshot, today: NaiveDate, out: &mut Vec<Alert>) {
    for tx in &snapshot.transactions {
        if tx.paid {
            continue;
        }
        let (Some(date), Some(amount)) = (tx.date, tx.amount) else {
            continue;
        };
        if date.date_naive() >= today {
            continue;
        }
        out.push(Alert {
            id: AlertId::overdue(&tx.id),
            kind: AlertKind::Overdue,
            severity: Severity::High,
            title: "Lançamento vencido".to_string(),
            message: format!("{} - {}", tx.description, format_brl(amount)),
            date,
            action: ActionRef::transaction(&*tx.id),
        });
    }
}

/// Rule 2: card statements due within the next 3 days that have charges.
fn bill_due_alerts(snapshot: &FinancialSnapshot, today: NaiveDate, out: &mut Vec<Alert>) {
    for card in &snapshot.cards {
        // Due day that does not exist in this month (e.g. 31 in February).
        let Some(due) = snapshot.period.day(card.due_day) else {
            continue;
        };
        if due < today || due > today + Duration::days(BILL_DUE_WINDOW_DAYS) {
            continue;
        }
        let total = card_period_total(snapshot, card);
        if total <= Decimal::ZERO {
            continue;
        }
        let days_left = (due - today).num_days();
        out.push(Alert {
            id: AlertId::bill_due(&card.id, snapshot.period),
            kind: AlertKind::BillDue,
            severity: Severity::Medium,
            title: "Fatura próxima do vencimento".to_string(),
            message: format!(
                "{} vence em {} dia(s) - {}",
                card.name,
                days_left,
                format_brl(total)
            ),
            date: midnight(due),
            action: ActionRef::card(&*card.id),
        });
    }
}

/// Rule 3: period charges at 80% of a card's limit, High past 100%.
fn limit_alerts(snapshot: &FinancialSnapshot, today: NaiveDate, out: &mut Vec<Alert>) {
    for card in &snapshot.cards {
        let Some(limit) = card.limit else {
            continue;
        };
        if limit <= Decimal::ZERO {
            continue;
        }
        let total = card_period_total(snapshot, card);
        let pct = total / limit * Decimal::ONE_HUNDRED;
        if pct < Decimal::from(LIMIT_WARNING_PCT) {
            continue;
        }
        let exceeded = pct >= Decimal::ONE_HUNDRED;
        out.push(Alert {
            id: AlertId::limit_warning(&card.id, snapshot.period),
            kind: AlertKind::LimitWarning,
            severity: if exceeded {
                Severity::High
            } else {
                Severity::Medium
            },
            title: if exceeded {
                "Limite do cartão excedido".to_string()
            } else {
                "Limite do cartão próximo".to_string()
            },
            message: format!("{} - {}% do limite usado", card.name, round_percent(pct)),
            date: midnight(today),
            action: ActionRef::card(&*card.id),
        });
    }
}

/// Rule 4: category spend (transactions + card expenses) past the budget cap.
fn budget_alerts(snapshot: &FinancialSnapshot, today: NaiveDate, out: &mut Vec<Alert>) {
    for budget in &snapshot.budgets {
        // A zero or negative cap is a malformed record.
        if budget.amount <= Decimal::ZERO {
            continue;
        }

        let tx_spent: Decimal = snapshot
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense && t.category == budget.category_id)
            .filter_map(|t| t.amount)
            .sum();
        let card_spent: Decimal = snapshot
            .card_expenses
            .iter()
            .filter(|e| e.category == budget.category_id)
            .filter(|e| e.date.is_some_and(|d| snapshot.period.contains(d)))
            .filter_map(|e| e.amount)
            .sum();

        let pct = (tx_spent + card_spent) / budget.amount * Decimal::ONE_HUNDRED;
        if pct < Decimal::ONE_HUNDRED {
            continue;
        }
        out.push(Alert {
            id: AlertId::budget_exceeded(&budget.id, snapshot.period),
            kind: AlertKind::BudgetExceeded,
            severity: Severity::Medium,
            title: "Orçamento excedido".to_string(),
            message: format!("Categoria com {}% do orçamento gasto", round_percent(pct)),
            date: midnight(today),
            action: ActionRef::budget(&*budget.id),
        });
    }
}

/// Sum of a card's expenses dated inside the active period.
///
/// Expenses without a date are excluded; expenses without an amount
/// contribute nothing.
fn card_period_total(snapshot: &FinancialSnapshot, card: &Card) -> Decimal {
    snapshot
        .card_expenses
        .iter()
        .filter(|e| e.card_id == card.id)
        .filter(|e| e.date.is_some_and(|d| snapshot.period.contains(d)))
        .filter_map(|e| e.amount)
        .sum()
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

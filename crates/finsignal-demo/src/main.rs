//! Deterministic demo: feeds a canned March/2024 snapshot through the full
//! pipeline and prints the derived alerts plus every push the channel would
//! have shown.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use finsignal_core::AlertCenter;
use finsignal_push::{PushChannel, PushPayload, PushPermission, PushResult};
use finsignal_state::SledStore;
use finsignal_types::{
    Budget, Card, CardExpense, FinancialSnapshot, Period, Transaction, TransactionKind,
};

/// Channel that prints notifications to stdout.
struct ConsoleChannel;

#[async_trait]
impl PushChannel for ConsoleChannel {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> PushPermission {
        PushPermission::Granted
    }

    async fn send(&self, title: &str, payload: &PushPayload) -> PushResult<()> {
        println!("  [push] {title}: {} (tag {})", payload.body, payload.tag);
        Ok(())
    }
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

fn demo_snapshot() -> FinancialSnapshot {
    FinancialSnapshot {
        transactions: vec![
            Transaction {
                id: "A".to_string(),
                kind: TransactionKind::Expense,
                amount: Some(dec!(120)),
                date: Some(at(2024, 3, 5)),
                paid: false,
                category: "moradia".to_string(),
                account_id: "acc1".to_string(),
                description: "Aluguel".to_string(),
            },
            Transaction {
                id: "T2".to_string(),
                kind: TransactionKind::Expense,
                amount: Some(dec!(520)),
                date: Some(at(2024, 3, 8)),
                paid: true,
                category: "mercado".to_string(),
                account_id: "acc1".to_string(),
                description: "Compras do mês".to_string(),
            },
        ],
        cards: vec![Card {
            id: "X".to_string(),
            name: "Cartão X".to_string(),
            due_day: 12,
            limit: Some(dec!(1000)),
        }],
        card_expenses: vec![CardExpense {
            id: "e1".to_string(),
            card_id: "X".to_string(),
            amount: Some(dec!(850)),
            date: Some(at(2024, 3, 2)),
            category: "geral".to_string(),
        }],
        budgets: vec![Budget {
            id: "B".to_string(),
            category_id: "mercado".to_string(),
            amount: dec!(500),
        }],
        period: Period::new(2, 2024),
        now: at(2024, 3, 10),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let store = Arc::new(SledStore::temporary()?);
    let mut center = AlertCenter::new(store, Arc::new(ConsoleChannel));
    center.set_push_enabled(true);

    let snapshot = demo_snapshot();
    center.recompute(&snapshot).await;

    println!("Derived alerts ({} unread):", center.unread_count());
    for alert in center.alerts() {
        println!(
            "  [{:?}] {}: {} ({})",
            alert.severity, alert.title, alert.message, alert.id
        );
    }

    center.mark_all_read();
    println!("After mark_all_read: {} unread", center.unread_count());

    Ok(())
}

//! FinSignal Core - the AlertCenter facade
//!
//! [`AlertCenter`] is the single entry point consumers wire up. It owns the
//! derived alert list, the acknowledged-id set, the push throttler and the
//! push-enabled preference, and exposes:
//!
//! - `recompute(&snapshot)` — called by the data layer whenever records
//!   change; derives alerts and runs one push-dispatch cycle
//! - `alerts()` / `unread_alerts()` / `unread_count()` — queried by the UI
//! - `mark_read(id)` / `mark_all_read()` — acknowledgement commands
//! - `set_push_enabled(bool)` — the per-user push preference
//!
//! The center holds no subscription machinery and no internal scheduler;
//! a new snapshot simply supersedes the previous derived list on the next
//! `recompute` call. No operation here ever returns an error to the caller:
//! the worst case is a stale or missing alert.

use std::sync::Arc;

use tracing::{debug, warn};

use finsignal_engine::derive_alerts;
use finsignal_push::{PushChannel, PushThrottler};
use finsignal_state::{KvStore, ReadState};
use finsignal_types::{Alert, AlertId, FinancialSnapshot, Severity};

/// Key under which the push preference is stored (JSON bool).
pub const PUSH_ENABLED_KEY: &str = "pushEnabled";

/// Facade over derivation, read state and push dispatch.
pub struct AlertCenter {
    store: Arc<dyn KvStore>,
    read_state: ReadState,
    throttler: PushThrottler,
    channel: Arc<dyn PushChannel>,
    push_enabled: bool,
    alerts: Vec<Alert>,
}

impl AlertCenter {
    /// Build a center on top of a KV store and a push channel.
    ///
    /// Loads the acknowledged-id set and the push preference; either failing
    /// to load falls back to a safe default (empty set, pushes off).
    pub fn new(store: Arc<dyn KvStore>, channel: Arc<dyn PushChannel>) -> Self {
        let read_state = ReadState::load(store.clone());
        let push_enabled = load_push_enabled(&*store);
        Self {
            store,
            read_state,
            throttler: PushThrottler::new(),
            channel,
            push_enabled,
            alerts: Vec::new(),
        }
    }

    /// Swap in a throttler, e.g. one with a shorter cooldown.
    pub fn with_throttler(mut self, throttler: PushThrottler) -> Self {
        self.throttler = throttler;
        self
    }

    /// Recompute the alert list from a fresh snapshot and run one push
    /// dispatch cycle over the unread subset.
    pub async fn recompute(&mut self, snapshot: &FinancialSnapshot) {
        self.alerts = derive_alerts(snapshot);
        debug!(count = self.alerts.len(), "alerts derived");

        let unread_high: Vec<&Alert> = self
            .alerts
            .iter()
            .filter(|a| a.severity == Severity::High && !self.read_state.is_read(&a.id))
            .collect();
        self.throttler
            .run_cycle(&unread_high, self.push_enabled, &*self.channel, snapshot.now)
            .await;
    }

    /// The current derived alert list, ordered.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Alerts the user has not acknowledged, in derived order.
    pub fn unread_alerts(&self) -> Vec<&Alert> {
        self.read_state.unread(&self.alerts)
    }

    /// Derived, never stored.
    pub fn unread_count(&self) -> usize {
        self.unread_alerts().len()
    }

    /// Acknowledge one alert.
    pub fn mark_read(&mut self, id: AlertId) {
        self.read_state.mark_read(id);
    }

    /// Acknowledge everything currently derived.
    ///
    /// Replaces the persisted set with exactly the current ids; ids of
    /// alerts no longer derived are dropped.
    pub fn mark_all_read(&mut self) {
        let current: Vec<AlertId> = self.alerts.iter().map(|a| a.id.clone()).collect();
        self.read_state.mark_all_read(&current);
    }

    pub fn push_enabled(&self) -> bool {
        self.push_enabled
    }

    /// Flip the push preference and persist it best-effort.
    pub fn set_push_enabled(&mut self, enabled: bool) {
        self.push_enabled = enabled;
        if let Err(err) = self.store.put(PUSH_ENABLED_KEY, if enabled { "true" } else { "false" }) {
            warn!(%err, "failed to persist push preference");
        }
    }
}

fn load_push_enabled(store: &dyn KvStore) -> bool {
    match store.get(PUSH_ENABLED_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or(false),
        Ok(None) => false,
        Err(err) => {
            warn!(%err, "failed to load push preference, defaulting to off");
            false
        }
    }
}

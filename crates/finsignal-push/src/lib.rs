//! FinSignal Push - channel capability and dispatch throttling
//!
//! This crate decides which derived alerts reach the user's push channel:
//!
//! - **[`PushChannel`]** — the capability the host environment provides
//!   (support probe, permission state, fire-and-forget send)
//! - **[`InMemoryChannel`]** — recording implementation for tests
//! - **[`PushThrottler`]** — the stateful gate enforcing a minimum interval
//!   between scans and at most one send per alert per calendar day
//!
//! # Re-entrancy
//!
//! Recomputation cycles can fire in rapid bursts. Two mechanisms keep sends
//! bounded: the cooldown gate short-circuits whole cycles, and the dedup key
//! is recorded BEFORE the send is awaited, so a cycle re-entered mid-send
//! cannot dispatch the same alert twice on the same day.
//!
//! Sends are fire-and-forget with no delivery receipt. A failed send is
//! logged and swallowed; its dedup key stays recorded, trading one missed
//! notification that day for protection against repeat spam from transient
//! channel failures.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use finsignal_types::{ActionRef, Alert, Severity};

/// Minimum interval between throttler scans.
pub const DEFAULT_COOLDOWN_SECS: i64 = 5 * 60;

/// Push errors
#[derive(Debug, Error)]
pub enum PushError {
    #[error("channel rejected notification: {0}")]
    ChannelRejected(String),
}

/// Result type for push operations
pub type PushResult<T> = Result<T, PushError>;

/// Host permission state for showing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushPermission {
    Granted,
    Denied,
    /// Not yet asked.
    Default,
}

/// Notification payload delivered alongside the title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    pub body: String,
    /// Collapse key; carries the alert id so the host replaces stale copies.
    pub tag: String,
    pub action: Option<ActionRef>,
}

/// Push-notification capability provided by the host environment.
///
/// Delivery is best-effort: `send` returning `Ok` means the channel accepted
/// the notification, not that the user saw it. This crate never retries.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Whether the host environment can show push notifications at all.
    fn is_supported(&self) -> bool;

    /// Current notification permission.
    fn permission(&self) -> PushPermission;

    /// Hand a notification to the channel.
    async fn send(&self, title: &str, payload: &PushPayload) -> PushResult<()>;
}

/// Recording channel for tests.
pub struct InMemoryChannel {
    supported: bool,
    permission: PushPermission,
    fail_sends: bool,
    sent: RwLock<Vec<(String, PushPayload)>>,
}

impl InMemoryChannel {
    /// A supported channel with permission granted.
    pub fn granted() -> Self {
        Self {
            supported: true,
            permission: PushPermission::Granted,
            fail_sends: false,
            sent: RwLock::new(Vec::new()),
        }
    }

    pub fn with_permission(mut self, permission: PushPermission) -> Self {
        self.permission = permission;
        self
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// Make every `send` call fail.
    pub fn failing(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn sent(&self) -> Vec<(String, PushPayload)> {
        self.sent.read().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().len()
    }
}

#[async_trait]
impl PushChannel for InMemoryChannel {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> PushPermission {
        self.permission
    }

    async fn send(&self, title: &str, payload: &PushPayload) -> PushResult<()> {
        if self.fail_sends {
            return Err(PushError::ChannelRejected("simulated failure".to_string()));
        }
        self.sent
            .write()
            .push((title.to_string(), payload.clone()));
        Ok(())
    }
}

/// Stateful gate between derived alerts and the push channel.
///
/// Holds process-lifetime state only: the set of `{alertId}#{day}` keys
/// already forwarded and the time of the last scan. Neither survives a
/// restart; duplicate sends across processes are an accepted limitation.
/// The clock is passed in by the caller, so tests drive it directly.
pub struct PushThrottler {
    cooldown: Duration,
    last_check: Option<DateTime<Utc>>,
    sent_today: HashSet<String>,
}

impl PushThrottler {
    pub fn new() -> Self {
        Self::with_cooldown(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_check: None,
            sent_today: HashSet::new(),
        }
    }

    /// Run one dispatch cycle over the unread alerts.
    ///
    /// No-op while the cooldown from the previous scan is still running.
    /// Otherwise forwards each unread High alert not yet sent today, subject
    /// to the user preference and the channel's support/permission state.
    /// Returns the number of notifications handed to the channel.
    pub async fn run_cycle(
        &mut self,
        unread: &[&Alert],
        enabled: bool,
        channel: &dyn PushChannel,
        now: DateTime<Utc>,
    ) -> usize {
        if let Some(last) = self.last_check {
            if now - last < self.cooldown {
                debug!("push scan skipped, cooldown active");
                return 0;
            }
        }
        self.last_check = Some(now);

        let day = now.date_naive();
        let mut dispatched = 0;

        for alert in unread {
            if alert.severity != Severity::High {
                continue;
            }
            let dedup_key = format!("{}#{}", alert.id, day);
            if self.sent_today.contains(&dedup_key) {
                continue;
            }
            if !enabled {
                continue;
            }
            if !channel.is_supported() {
                continue;
            }
            if channel.permission() != PushPermission::Granted {
                continue;
            }

            // Recorded before the await so a re-entered cycle cannot send
            // the same alert again today. Deliberately not rolled back on
            // failure.
            self.sent_today.insert(dedup_key);

            let payload = PushPayload {
                body: alert.message.clone(),
                tag: alert.id.to_string(),
                action: Some(alert.action.clone()),
            };
            match channel.send(&alert.title, &payload).await {
                Ok(()) => {
                    info!(alert = %alert.id, "push notification dispatched");
                    dispatched += 1;
                }
                Err(err) => {
                    warn!(alert = %alert.id, %err, "push send failed");
                }
            }
        }

        dispatched
    }
}

impl Default for PushThrottler {
    fn default() -> Self {
        Self::new()
    }
}

/// Send a fixed test notification, bypassing throttling and dedup.
///
/// Only the permission gate applies; used by settings screens to let the
/// user verify their channel works.
pub async fn send_test_notification(channel: &dyn PushChannel) -> PushResult<()> {
    if !channel.is_supported() || channel.permission() != PushPermission::Granted {
        warn!("test notification skipped, channel unavailable");
        return Ok(());
    }
    channel
        .send(
            "Teste de Notificação",
            &PushPayload {
                body: "As notificações push estão funcionando!".to_string(),
                tag: "finsignal-test".to_string(),
                action: None,
            },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use finsignal_types::{AlertId, AlertKind};

    fn high_alert(id: &str) -> Alert {
        Alert {
            id: AlertId::new(id),
            kind: AlertKind::Overdue,
            severity: Severity::High,
            title: "Lançamento vencido".to_string(),
            message: "Aluguel - R$ 120,00".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            action: ActionRef::transaction("A"),
        }
    }

    fn medium_alert(id: &str) -> Alert {
        Alert {
            severity: Severity::Medium,
            kind: AlertKind::BillDue,
            ..high_alert(id)
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn dispatches_unread_high_alerts() {
        let channel = InMemoryChannel::granted();
        let mut throttler = PushThrottler::new();
        let overdue = high_alert("overdue-A");
        let bill = medium_alert("bill-due-X-2-2024");

        let sent = throttler
            .run_cycle(&[&overdue, &bill], true, &channel, at(10, 0))
            .await;

        assert_eq!(sent, 1);
        let recorded = channel.sent();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "Lançamento vencido");
        assert_eq!(recorded[0].1.tag, "overdue-A");
    }

    #[tokio::test]
    async fn same_day_duplicate_is_suppressed() {
        let channel = InMemoryChannel::granted();
        let mut throttler = PushThrottler::new();
        let overdue = high_alert("overdue-A");

        throttler
            .run_cycle(&[&overdue], true, &channel, at(10, 0))
            .await;
        // Past the cooldown, same calendar day.
        throttler
            .run_cycle(&[&overdue], true, &channel, at(10, 10))
            .await;

        assert_eq!(channel.sent_count(), 1);
    }

    #[tokio::test]
    async fn next_day_sends_again() {
        let channel = InMemoryChannel::granted();
        let mut throttler = PushThrottler::new();
        let overdue = high_alert("overdue-A");

        throttler
            .run_cycle(&[&overdue], true, &channel, at(10, 0))
            .await;
        let next_day = Utc.with_ymd_and_hms(2024, 3, 11, 10, 0, 0).unwrap();
        throttler
            .run_cycle(&[&overdue], true, &channel, next_day)
            .await;

        assert_eq!(channel.sent_count(), 2);
    }

    #[tokio::test]
    async fn second_scan_within_cooldown_is_noop() {
        let channel = InMemoryChannel::granted();
        let mut throttler = PushThrottler::new();
        let first = high_alert("overdue-A");
        let second = high_alert("overdue-B");

        throttler
            .run_cycle(&[&first], true, &channel, at(10, 0))
            .await;
        // Four minutes later: still cooling, even for a brand new alert.
        let sent = throttler
            .run_cycle(&[&second], true, &channel, at(10, 4))
            .await;

        assert_eq!(sent, 0);
        assert_eq!(channel.sent_count(), 1);
    }

    #[tokio::test]
    async fn disabled_preference_blocks_sends() {
        let channel = InMemoryChannel::granted();
        let mut throttler = PushThrottler::new();
        let overdue = high_alert("overdue-A");

        let sent = throttler
            .run_cycle(&[&overdue], false, &channel, at(10, 0))
            .await;
        assert_eq!(sent, 0);
        assert_eq!(channel.sent_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_channel_blocks_sends() {
        let channel = InMemoryChannel::granted().unsupported();
        let mut throttler = PushThrottler::new();
        let overdue = high_alert("overdue-A");

        let sent = throttler
            .run_cycle(&[&overdue], true, &channel, at(10, 0))
            .await;
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn missing_permission_blocks_sends() {
        for permission in [PushPermission::Denied, PushPermission::Default] {
            let channel = InMemoryChannel::granted().with_permission(permission);
            let mut throttler = PushThrottler::new();
            let overdue = high_alert("overdue-A");

            let sent = throttler
                .run_cycle(&[&overdue], true, &channel, at(10, 0))
                .await;
            assert_eq!(sent, 0);
        }
    }

    #[tokio::test]
    async fn send_failure_is_swallowed_and_key_stays_recorded() {
        let failing = InMemoryChannel::granted().failing();
        let mut throttler = PushThrottler::new();
        let first = high_alert("overdue-A");
        let second = high_alert("overdue-B");

        // Failure on one alert does not block the next in the same cycle.
        let sent = throttler
            .run_cycle(&[&first, &second], true, &failing, at(10, 0))
            .await;
        assert_eq!(sent, 0);

        // The key stays recorded: a healthy channel later the same day does
        // not re-send.
        let healthy = InMemoryChannel::granted();
        throttler
            .run_cycle(&[&first], true, &healthy, at(10, 10))
            .await;
        assert_eq!(healthy.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_notification_respects_permission_gate() {
        let channel = InMemoryChannel::granted();
        send_test_notification(&channel).await.unwrap();
        assert_eq!(channel.sent_count(), 1);
        assert_eq!(channel.sent()[0].1.tag, "finsignal-test");

        let denied = InMemoryChannel::granted().with_permission(PushPermission::Denied);
        send_test_notification(&denied).await.unwrap();
        assert_eq!(denied.sent_count(), 0);
    }
}

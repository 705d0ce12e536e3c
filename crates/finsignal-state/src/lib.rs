//! FinSignal State - acknowledged-alert tracking
//!
//! This crate provides:
//!
//! - **[`KvStore`]** — minimal string key-value capability the tracker
//!   persists through
//! - **[`SledStore`]** — embedded sled database implementation
//! - **[`MemoryStore`]** — in-memory implementation for tests
//! - **[`ReadState`]** — the set of alert ids the user has acknowledged
//!
//! Persistence is best-effort: a failed save is logged and the in-memory set
//! stays authoritative for the rest of the process lifetime. A failed load
//! starts from an empty set. Neither path ever surfaces an error to the
//! caller.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

use finsignal_types::{Alert, AlertId};

/// Key under which the acknowledged alert ids are stored (JSON string array).
pub const READ_NOTIFICATIONS_KEY: &str = "readNotifications";

/// State persistence errors
#[derive(Debug, Error)]
pub enum StateError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("stored value for {key} is not valid UTF-8")]
    NotUtf8 { key: String },

    #[error("stored value for {key} could not be decoded: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;

/// Minimal key-value capability used for persisted engine state.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> StateResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> StateResult<()>;
}

/// Embedded sled-backed store.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StateResult<Self> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// Open a throwaway in-temp-dir database, dropped with the value.
    pub fn temporary() -> StateResult<Self> {
        Ok(Self {
            db: sled::Config::new().temporary(true).open()?,
        })
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &str) -> StateResult<Option<String>> {
        match self.db.get(key)? {
            Some(bytes) => {
                let text =
                    String::from_utf8(bytes.to_vec()).map_err(|_| StateError::NotUtf8 {
                        key: key.to_string(),
                    })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &str) -> StateResult<()> {
        self.db.insert(key, value.as_bytes())?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> StateResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StateResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The set of alert ids the user has acknowledged.
///
/// Loaded once at startup and kept in memory; every mutation triggers a
/// best-effort save. Ids never expire on their own — only
/// [`ReadState::mark_all_read`] can drop them, because it REPLACES the set
/// with the ids of the currently derived alerts.
pub struct ReadState {
    store: Arc<dyn KvStore>,
    read: HashSet<AlertId>,
}

impl ReadState {
    /// Load the acknowledged set from the store.
    ///
    /// A missing or undecodable entry yields an empty set (logged, not
    /// propagated).
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let read = match Self::load_ids(&*store) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(%err, "failed to load read state, starting empty");
                HashSet::new()
            }
        };
        Self { store, read }
    }

    fn load_ids(store: &dyn KvStore) -> StateResult<HashSet<AlertId>> {
        let Some(raw) = store.get(READ_NOTIFICATIONS_KEY)? else {
            return Ok(HashSet::new());
        };
        let ids: Vec<String> =
            serde_json::from_str(&raw).map_err(|source| StateError::Decode {
                key: READ_NOTIFICATIONS_KEY.to_string(),
                source,
            })?;
        Ok(ids.into_iter().map(AlertId::new).collect())
    }

    /// Whether the user has acknowledged this alert.
    pub fn is_read(&self, id: &AlertId) -> bool {
        self.read.contains(id)
    }

    /// Acknowledge a single alert. Idempotent.
    pub fn mark_read(&mut self, id: AlertId) {
        if self.read.insert(id) {
            self.persist();
        }
    }

    /// Replace the acknowledged set with exactly `current_ids`.
    ///
    /// Not a union: an id absent from `current_ids` is dropped, so an alert
    /// that later reappears under the same id starts unread again.
    pub fn mark_all_read(&mut self, current_ids: &[AlertId]) {
        self.read = current_ids.iter().cloned().collect();
        self.persist();
    }

    /// Number of acknowledged ids currently held.
    pub fn len(&self) -> usize {
        self.read.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read.is_empty()
    }

    /// Alerts from `alerts` the user has not acknowledged, in input order.
    pub fn unread<'a>(&self, alerts: &'a [Alert]) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| !self.is_read(&a.id)).collect()
    }

    /// Best-effort save; a failure leaves the in-memory set authoritative.
    fn persist(&self) {
        let ids: Vec<&str> = self.read.iter().map(|id| id.as_str()).collect();
        let encoded = match serde_json::to_string(&ids) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(%err, "failed to encode read state");
                return;
            }
        };
        if let Err(err) = self.store.put(READ_NOTIFICATIONS_KEY, &encoded) {
            warn!(%err, "failed to persist read state, keeping in-memory set");
        }
    }
}

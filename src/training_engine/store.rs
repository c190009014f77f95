//! Persisted rules store.
//!
//! [`RulesStore`] is an explicit state container: construct one at startup
//! with a [`RulesRepository`], read with `get`, replace with `set`, and
//! listen for replacements with `subscribe`. The persisted record is a
//! versioned JSON envelope:
//!
//! ```json
//! { "state": { "rules": { "blackjackPayout": "Ratio3to2", "numDecks": 6, ... } }, "version": 2 }
//! ```
//!
//! A record with another version, or one that fails to parse or validate, is
//! discarded and the defaults are used instead. No migration is attempted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::training_engine::rules::{Rules, ValidationError};

/// Name the record is stored under.
pub const STORE_NAME: &str = "blackjack:rules";
/// Schema version written with every record.
pub const STORE_VERSION: u32 = 2;

const DEFAULT_FILE_NAME: &str = "blackjack-rules.json";
const SUBSCRIBER_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rejected rules: {0}")]
    Invalid(#[from] ValidationError),
    #[error("failed to persist rules: {0}")]
    Persist(#[from] io::Error),
    #[error("failed to encode rules: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Storage backends
// ---------------------------------------------------------------------------

/// Raw storage for the serialized record.
pub trait RulesRepository: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, record: &str) -> io::Result<()>;
}

/// Stores the record as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRepository { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileRepository {
    fn default() -> Self {
        JsonFileRepository::new(Self::default_path())
    }
}

impl RulesRepository for JsonFileRepository {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, record: &str) -> io::Result<()> {
        // Replace atomically.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, record)?;
        fs::rename(&tmp, &self.path)
    }
}

/// In-process storage, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    record: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: impl Into<String>) -> Self {
        MemoryRepository {
            record: Mutex::new(Some(record.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `save` fail with a permission error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn record(&self) -> Option<String> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RulesRepository for MemoryRepository {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.record())
    }

    fn save(&self, record: &str) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "storage is read-only"));
        }
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Envelope codec
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct PersistedState {
    rules: Rules,
}

#[derive(Serialize)]
struct Envelope<'a> {
    state: &'a PersistedState,
    version: u32,
}

#[derive(Deserialize)]
struct RawEnvelope {
    state: serde_json::Value,
    version: u32,
}

fn encode(rules: Rules) -> Result<String, serde_json::Error> {
    let state = PersistedState { rules };
    serde_json::to_string(&Envelope { state: &state, version: STORE_VERSION })
}

/// Decode a stored record. `None` means it must be discarded.
fn decode(record: &str) -> Option<Rules> {
    let envelope: RawEnvelope = match serde_json::from_str(record) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!("Discarding corrupt {} record: {}", STORE_NAME, e);
            return None;
        }
    };
    if envelope.version != STORE_VERSION {
        tracing::warn!(
            "Discarding {} record with version {} (expected {})",
            STORE_NAME,
            envelope.version,
            STORE_VERSION
        );
        return None;
    }
    let state: PersistedState = match serde_json::from_value(envelope.state) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Discarding malformed {} state: {}", STORE_NAME, e);
            return None;
        }
    };
    if let Err(e) = state.rules.validate() {
        tracing::warn!("Discarding out-of-range {} record: {}", STORE_NAME, e);
        return None;
    }
    Some(state.rules)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Anything that can report the rules currently in effect.
pub trait RulesSource: Send + Sync {
    fn rules(&self) -> Rules;
}

impl RulesSource for Rules {
    fn rules(&self) -> Rules {
        *self
    }
}

impl<T: RulesSource + ?Sized> RulesSource for std::sync::Arc<T> {
    fn rules(&self) -> Rules {
        (**self).rules()
    }
}

pub struct RulesStore<R: RulesRepository> {
    repo: R,
    current: RwLock<Rules>,
    update_tx: broadcast::Sender<Rules>,
}

impl<R: RulesRepository> RulesStore<R> {
    /// Load the persisted rules, falling back to defaults when absent,
    /// unreadable, from another schema version, or invalid. A discarded
    /// record is overwritten with the defaults.
    pub fn open(repo: R) -> Self {
        let rules = match repo.load() {
            Ok(Some(record)) => decode(&record).unwrap_or_else(|| {
                let rules = Rules::default();
                let saved = encode(rules)
                    .map_err(StoreError::from)
                    .and_then(|record| repo.save(&record).map_err(StoreError::from));
                if let Err(e) = saved {
                    tracing::warn!("Failed to overwrite discarded {} record: {}", STORE_NAME, e);
                }
                rules
            }),
            Ok(None) => Rules::default(),
            Err(e) => {
                tracing::warn!("Failed to read {} record, using defaults: {}", STORE_NAME, e);
                Rules::default()
            }
        };
        tracing::debug!("Opened rules store: {}", rules);
        let (update_tx, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        RulesStore { repo, current: RwLock::new(rules), update_tx }
    }

    pub fn get(&self) -> Rules {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, persist, then replace the whole record and notify
    /// subscribers. On any error the stored rules are left untouched.
    pub fn set(&self, candidate: Rules) -> Result<(), StoreError> {
        candidate.validate()?;
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.repo.save(&encode(candidate)?)?;
        *current = candidate;
        drop(current);
        tracing::info!("Rules replaced: {}", candidate);
        if self.update_tx.send(candidate).is_err() {
            tracing::warn!("Rules replaced with no subscribers");
        }
        Ok(())
    }

    /// Restore and persist the built-in defaults.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.set(Rules::default())
    }

    /// Receive every rules record accepted by `set` or `reset` from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Rules> {
        self.update_tx.subscribe()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

impl<R: RulesRepository> RulesSource for RulesStore<R> {
    fn rules(&self) -> Rules {
        self.get()
    }
}

//! The strategy oracle contract and the table cache in front of it.
//!
//! The oracle is an external collaborator: it turns [`Rules`] into strategy
//! tables and answers best-action queries. Both calls must be pure and
//! deterministic, and safe to run concurrently. Table generation may be slow,
//! so [`StrategyCache`] runs it on tokio's blocking pool and remembers the
//! result for the last rules value it saw.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::training_engine::{
    models::{PlayerAction, Rank, StrategyTables, TableShapeError},
    rules::{Rules, ValidationError},
    store::RulesSource,
};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle given invalid rules: {0}")]
    InvalidRules(#[from] ValidationError),
    #[error("oracle produced a malformed table: {0}")]
    Shape(#[from] TableShapeError),
    #[error("table generation task failed: {0}")]
    Task(String),
    #[error("oracle failure: {0}")]
    Failed(String),
}

pub trait StrategyOracle: Send + Sync {
    /// Hard, soft, and pair tables for `rules`.
    fn generate_tables(&self, rules: &Rules) -> Result<StrategyTables, OracleError>;

    /// Optimal action for `player` (at least two ranks) against `dealer`.
    fn best_action(
        &self,
        rules: &Rules,
        player: &[Rank],
        dealer: Rank,
    ) -> Result<PlayerAction, OracleError>;
}

impl<O: StrategyOracle + ?Sized> StrategyOracle for Arc<O> {
    fn generate_tables(&self, rules: &Rules) -> Result<StrategyTables, OracleError> {
        (**self).generate_tables(rules)
    }

    fn best_action(
        &self,
        rules: &Rules,
        player: &[Rank],
        dealer: Rank,
    ) -> Result<PlayerAction, OracleError> {
        (**self).best_action(rules, player, dealer)
    }
}

/// Ask `oracle` for the best action after checking the call is well formed.
///
/// # Panics
///
/// If `player` holds fewer than two ranks. Callers build hands internally,
/// so a short hand is a logic error rather than bad input.
pub fn query_best_action<O: StrategyOracle + ?Sized>(
    oracle: &O,
    rules: &Rules,
    player: &[Rank],
    dealer: Rank,
) -> Result<PlayerAction, OracleError> {
    assert!(
        player.len() >= 2,
        "best-action query needs at least two player cards, got {}",
        player.len()
    );
    rules.validate()?;
    oracle.best_action(rules, player, dealer)
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Size-one cache of generated tables, keyed by rules value.
///
/// A lookup with rules equal to the cached entry returns it; any other value
/// replaces it. Misses are serialized so concurrent callers asking for the
/// same new rules trigger a single generation. The generation task owns the
/// slot lock and fills the entry itself, so a caller that stops waiting does
/// not discard the result.
pub struct StrategyCache<O> {
    oracle: Arc<O>,
    slot: Arc<Mutex<Option<(Rules, Arc<StrategyTables>)>>>,
    generations: AtomicUsize,
}

impl<O: StrategyOracle + 'static> StrategyCache<O> {
    pub fn new(oracle: Arc<O>) -> Self {
        StrategyCache {
            oracle,
            slot: Arc::new(Mutex::new(None)),
            generations: AtomicUsize::new(0),
        }
    }

    pub fn oracle(&self) -> &Arc<O> {
        &self.oracle
    }

    /// Number of times the oracle has been asked to generate tables.
    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    /// Tables for `rules`, generating them off the async runtime on a miss.
    pub async fn tables(&self, rules: Rules) -> Result<Arc<StrategyTables>, OracleError> {
        rules.validate()?;
        let mut slot = Arc::clone(&self.slot).lock_owned().await;
        if let Some((cached, tables)) = slot.as_ref() {
            if *cached == rules {
                tracing::debug!("Strategy tables cache hit");
                return Ok(Arc::clone(tables));
            }
        }
        *slot = None;

        let oracle = Arc::clone(&self.oracle);
        self.generations.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Generating strategy tables for {}", rules);
        tokio::task::spawn_blocking(move || -> Result<_, OracleError> {
            let tables = Arc::new(oracle.generate_tables(&rules)?);
            *slot = Some((rules, Arc::clone(&tables)));
            Ok(tables)
        })
        .await
        .map_err(|e| OracleError::Task(e.to_string()))?
    }

    /// Tables for whatever rules `source` currently reports.
    pub async fn current<S: RulesSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Arc<StrategyTables>, OracleError> {
        self.tables(source.rules()).await
    }

    /// The cached tables if they were generated for `rules`. Returns `None`
    /// while a generation is in flight.
    pub fn cached(&self, rules: &Rules) -> Option<Arc<StrategyTables>> {
        let slot = self.slot.try_lock().ok()?;
        match slot.as_ref() {
            Some((cached, tables)) if cached == rules => Some(Arc::clone(tables)),
            _ => None,
        }
    }
}

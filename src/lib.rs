//! # blackjack_drill
//!
//! A blackjack basic-strategy trainer and reference viewer.
//!
//! The crate binds three pieces together:
//!
//! - a validated, persisted **rules store** describing the table (decks,
//!   payout, dealer soft 17, surrender, splits);
//! - **strategy tables** produced by an external oracle for those rules,
//!   cached per rules value and projected into a display grid;
//! - a **drill engine** that deals random hands, checks the user's action
//!   against the oracle, and keeps score.
//!
//! The oracle itself, the code that computes expected values, is not part
//! of this crate. Plug one in by implementing [`StrategyOracle`].
//!
//! ## How it works
//!
//! 1. Open a [`RulesStore`] over a [`RulesRepository`]. Missing, corrupt, or
//!    old-version records fall back to [`Rules::default`].
//! 2. Ask a [`StrategyCache`] for the tables of the current rules. Tables are
//!    generated on tokio's blocking pool and reused until the rules change.
//! 3. Build a [`TableGrid`] per [`TableKind`] for display, or render it as
//!    Markdown, CSV, or JSON.
//! 4. Drive a [`Trainer`]: show [`Trainer::hand`], pass the user's choice to
//!    [`Trainer::score`], and read [`Trainer::stats`].
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use blackjack_drill::{
//!     MemoryRepository, OracleError, PlayerAction, Rank, Rules, RulesStore,
//!     StrategyOracle, StrategyTables, Trainer,
//! };
//!
//! struct AlwaysStand;
//!
//! impl StrategyOracle for AlwaysStand {
//!     fn generate_tables(&self, _: &Rules) -> Result<StrategyTables, OracleError> {
//!         Err(OracleError::Failed("not a real oracle".into()))
//!     }
//!     fn best_action(&self, _: &Rules, _: &[Rank], _: Rank) -> Result<PlayerAction, OracleError> {
//!         Ok(PlayerAction::Stand)
//!     }
//! }
//!
//! let store = Arc::new(RulesStore::open(MemoryRepository::new()));
//! let mut trainer = Trainer::seeded(AlwaysStand, Arc::clone(&store), 42);
//!
//! let hand = *trainer.hand();
//! let verdict = trainer.score(hand.id, PlayerAction::Stand).unwrap();
//! assert!(verdict.correct);
//! assert_eq!(trainer.stats().success, 1);
//!
//! // The same hand cannot be scored twice.
//! assert!(trainer.score(hand.id, PlayerAction::Stand).is_err());
//! ```

pub mod training_engine;

// Convenience re-exports so callers can use `blackjack_drill::Trainer`
// directly without reaching into `training_engine::`.
pub use training_engine::{
    parse_ranks, query_best_action, ActionColor, ActionInfo, BlackjackPayout, Card, Cell,
    DealId, GridCell, GridRow, Hand, JsonFileRepository, MemoryRepository, OracleError,
    ParseCardError, ParseTableFormatError, Phase, PlayerAction, Rank, RoundEvs, Rules, RulesField, RulesRepository,
    RulesSource, RulesStore, Soft17Rule, Stats, StoreError, StrategyCache, StrategyOracle,
    StrategyTable, StrategyTables, Suit, SurrenderRule, TableFormat, TableGrid, TableKind,
    TableShapeError, Trainer, TrainerError, TrainerState, ValidationError, Verdict,
};

#[cfg(test)]
mod tests;

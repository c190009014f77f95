//! Core training engine: rules, strategy tables, and the drill loop.
//!
//! ## Module overview
//!
//! | Module    | Purpose |
//! |-----------|---------|
//! | `models`  | Cards, ranks, player actions, strategy tables |
//! | `catalog` | Label, short code, and colour for every player action |
//! | `rules`   | Table rules and their validation |
//! | `store`   | Persisted, versioned rules store with change notification |
//! | `oracle`  | Strategy oracle contract and the value-keyed table cache |
//! | `table`   | Display grid for a strategy table, plus Markdown/CSV/JSON output |
//! | `shoe`    | Infinite-shoe card dealing |
//! | `trainer` | Deal / score state machine and running stats |

pub mod catalog;
pub mod models;
pub mod oracle;
pub mod rules;
pub mod shoe;
pub mod store;
pub mod table;
pub mod trainer;

// Re-export the public API surface so callers can use
// `training_engine::Trainer` without reaching into sub-modules.
pub use catalog::{ActionColor, ActionInfo};
pub use models::{
    parse_ranks, Card, Cell, ParseCardError, PlayerAction, Rank, RoundEvs, StrategyTable,
    StrategyTables, Suit, TableShapeError,
};
pub use oracle::{query_best_action, OracleError, StrategyCache, StrategyOracle};
pub use rules::{
    BlackjackPayout, Rules, RulesField, Soft17Rule, SurrenderRule, ValidationError,
};
pub use store::{
    JsonFileRepository, MemoryRepository, RulesRepository, RulesSource, RulesStore, StoreError,
};
pub use table::{GridCell, GridRow, ParseTableFormatError, TableFormat, TableGrid, TableKind};
pub use trainer::{DealId, Hand, Phase, Stats, Trainer, TrainerError, TrainerState, Verdict};

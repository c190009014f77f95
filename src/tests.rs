//! Scenario tests for the `blackjack_drill` crate.
//!
//! Included from `lib.rs` under `#[cfg(test)]`.
//!
//! # Coverage
//!
//! | Group | What is tested |
//! |-------|----------------|
//! | Oracle contract | Table shapes for many rule sets; best action is pure; short hands panic |
//! | Cache | One generation per distinct rules value; size one; concurrent misses; abandoned waits; invalid rules |
//! | Rules store | Rejected candidates keep the previous rules |
//! | Trainer | Correct/incorrect scoring, re-deal, double scoring, rules changes reach the oracle |
//! | Presentation | Default hard grid is ascending with ten columns; all renderers agree on width |

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::training_engine::{
    models::{HARD_ROWS, PAIR_ROWS, SOFT_ROWS},
    query_best_action, BlackjackPayout, Cell, MemoryRepository, OracleError, PlayerAction, Rank,
    RoundEvs, Rules, RulesField, RulesStore, Soft17Rule, StoreError, StrategyCache,
    StrategyOracle, StrategyTable, StrategyTables, SurrenderRule, TableFormat, TableGrid,
    TableKind, Trainer, TrainerError,
};

// ── helpers ──────────────────────────────────────────────────────────────────

/// Deterministic stand-in for a real oracle. Counts every call.
#[derive(Default)]
struct FakeOracle {
    table_calls: AtomicUsize,
    action_calls: AtomicUsize,
}

impl FakeOracle {
    fn table_calls(&self) -> usize {
        self.table_calls.load(Ordering::SeqCst)
    }

    fn cell(rules: &Rules, action: PlayerAction, row: u8, column: usize, split: bool) -> Cell {
        let ev = (row as f64 - 12.0) / 10.0 - column as f64 / 100.0 + rules.num_decks as f64 / 1000.0;
        Cell {
            action,
            ev,
            evs: RoundEvs {
                hit: ev,
                stand: ev - 0.1,
                double: ev - 0.2,
                split: split.then_some(ev),
            },
        }
    }

    fn table(
        rules: &Rules,
        (from, to): (u8, u8),
        pick: impl Fn(u8, usize) -> PlayerAction,
        split: bool,
    ) -> Result<StrategyTable, OracleError> {
        let cells = (from..=to)
            .flat_map(|row| (0..StrategyTable::COLUMNS).map(move |column| (row, column)))
            .map(|(row, column)| Self::cell(rules, pick(row, column), row, column, split))
            .collect();
        Ok(StrategyTable::new(from, to, cells)?)
    }
}

impl StrategyOracle for FakeOracle {
    fn generate_tables(&self, rules: &Rules) -> Result<StrategyTables, OracleError> {
        self.table_calls.fetch_add(1, Ordering::SeqCst);
        let hard = Self::table(rules, HARD_ROWS, |row, _| match row {
            17.. => PlayerAction::Stand,
            11 => PlayerAction::DoubleOrHit,
            _ => PlayerAction::Hit,
        }, false)?;
        let soft = Self::table(rules, SOFT_ROWS, |row, column| match (row, column) {
            (19.., _) => PlayerAction::Stand,
            (18, 0..=4) => PlayerAction::DoubleOrStand,
            _ => PlayerAction::Hit,
        }, false)?;
        let pair = Self::table(rules, PAIR_ROWS, |row, _| match row {
            10 => PlayerAction::Stand,
            _ => PlayerAction::Split,
        }, true)?;
        Ok(StrategyTables { hard, soft, pair })
    }

    fn best_action(
        &self,
        rules: &Rules,
        player: &[Rank],
        dealer: Rank,
    ) -> Result<PlayerAction, OracleError> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        let action = if rules.surrender == SurrenderRule::Late && dealer == Rank::Ace {
            PlayerAction::Surrender
        } else if player[0] == player[1] {
            PlayerAction::Split
        } else if player.contains(&Rank::Ace) {
            PlayerAction::Stand
        } else {
            PlayerAction::Hit
        };
        Ok(action)
    }
}

/// Oracle that always fails, for error propagation.
struct BrokenOracle;

impl StrategyOracle for BrokenOracle {
    fn generate_tables(&self, _rules: &Rules) -> Result<StrategyTables, OracleError> {
        Err(OracleError::Failed("out of memory".into()))
    }

    fn best_action(&self, _: &Rules, _: &[Rank], _: Rank) -> Result<PlayerAction, OracleError> {
        Err(OracleError::Failed("out of memory".into()))
    }
}

/// Wraps [`FakeOracle`] with a fixed delay on table generation.
#[derive(Default)]
struct SlowOracle {
    inner: FakeOracle,
}

impl StrategyOracle for SlowOracle {
    fn generate_tables(&self, rules: &Rules) -> Result<StrategyTables, OracleError> {
        std::thread::sleep(Duration::from_millis(200));
        self.inner.generate_tables(rules)
    }

    fn best_action(&self, rules: &Rules, player: &[Rank], dealer: Rank) -> Result<PlayerAction, OracleError> {
        self.inner.best_action(rules, player, dealer)
    }
}

/// A spread of valid rule sets covering every enum value and both bounds.
fn rule_sets() -> Vec<Rules> {
    vec![
        Rules::default(),
        Rules { num_decks: 1, max_splits: 255, ..Rules::default() },
        Rules { num_decks: 255, max_splits: 1, ..Rules::default() },
        Rules {
            blackjack_payout: BlackjackPayout::Ratio6to5,
            dealer_soft17: Soft17Rule::Hit,
            surrender: SurrenderRule::Early,
            double_after_split_allowed: true,
            ..Rules::default()
        },
        Rules { surrender: SurrenderRule::Late, num_decks: 8, max_splits: 3, ..Rules::default() },
    ]
}

fn store() -> Arc<RulesStore<MemoryRepository>> {
    Arc::new(RulesStore::open(MemoryRepository::new()))
}

// ── oracle contract ──────────────────────────────────────────────────────────

#[test]
fn generated_tables_have_ten_columns_per_row() {
    let oracle = FakeOracle::default();
    for rules in rule_sets() {
        let tables = oracle.generate_tables(&rules).unwrap();
        for kind in TableKind::ALL {
            let table = kind.table(&tables);
            let rows = (table.player_to() - table.player_from()) as usize + 1;
            assert_eq!(table.cells().len(), rows * 10, "{kind} table for {rules}");
            assert!(table.rows().all(|(_, cells)| cells.len() == 10));
        }
    }
}

#[test]
fn best_action_is_pure() {
    let oracle = FakeOracle::default();
    for rules in rule_sets() {
        for dealer in Rank::ALL {
            let hand = [Rank::Ace, Rank::Seven];
            let first = query_best_action(&oracle, &rules, &hand, dealer).unwrap();
            for _ in 0..5 {
                assert_eq!(query_best_action(&oracle, &rules, &hand, dealer).unwrap(), first);
            }
        }
    }
}

#[test]
#[should_panic(expected = "at least two player cards")]
fn single_card_query_is_a_logic_error() {
    let _ = query_best_action(&FakeOracle::default(), &Rules::default(), &[Rank::Nine], Rank::Two);
}

#[test]
fn query_rejects_invalid_rules_before_the_oracle() {
    let oracle = FakeOracle::default();
    let rules = Rules { max_splits: 0, ..Rules::default() };
    let err = query_best_action(&oracle, &rules, &[Rank::Two, Rank::Three], Rank::Ace).unwrap_err();
    assert!(matches!(err, OracleError::InvalidRules(e) if e.field == RulesField::MaxSplits));
    assert_eq!(oracle.action_calls.load(Ordering::SeqCst), 0);
}

// ── cache ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cache_generates_once_per_rules_value() {
    let oracle = Arc::new(FakeOracle::default());
    let cache = StrategyCache::new(Arc::clone(&oracle));
    let rules = Rules::default();

    let a = cache.tables(rules).await.unwrap();
    let b = cache.tables(Rules { ..rules }).await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(oracle.table_calls(), 1);
    assert_eq!(cache.generations(), 1);
    assert!(cache.cached(&rules).is_some());
}

#[tokio::test]
async fn cache_holds_a_single_entry() {
    let oracle = Arc::new(FakeOracle::default());
    let cache = StrategyCache::new(Arc::clone(&oracle));
    let six = Rules::default();
    let two = Rules { num_decks: 2, ..six };

    cache.tables(six).await.unwrap();
    let tables = cache.tables(two).await.unwrap();
    assert_eq!(oracle.table_calls(), 2);
    assert!(cache.cached(&six).is_none());
    assert_eq!(cache.cached(&two).unwrap(), tables);

    cache.tables(six).await.unwrap();
    assert_eq!(oracle.table_calls(), 3);
}

#[tokio::test]
async fn concurrent_misses_share_one_generation() {
    let oracle = Arc::new(FakeOracle::default());
    let cache = StrategyCache::new(Arc::clone(&oracle));
    let rules = Rules { num_decks: 4, ..Rules::default() };

    let (a, b) = tokio::join!(cache.tables(rules), cache.tables(rules));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(oracle.table_calls(), 1);
}

#[tokio::test]
async fn abandoned_generation_still_fills_the_cache() {
    let oracle = Arc::new(SlowOracle::default());
    let cache = StrategyCache::new(Arc::clone(&oracle));
    let rules = Rules::default();

    let abandoned = tokio::time::timeout(Duration::from_millis(20), cache.tables(rules)).await;
    assert!(abandoned.is_err());

    let tables = cache.tables(rules).await.unwrap();
    assert_eq!(oracle.inner.table_calls(), 1);
    assert_eq!(cache.cached(&rules).unwrap(), tables);
}

#[tokio::test]
async fn cache_rejects_invalid_rules_without_generating() {
    let oracle = Arc::new(FakeOracle::default());
    let cache = StrategyCache::new(Arc::clone(&oracle));
    let result = cache.tables(Rules { num_decks: 0, ..Rules::default() }).await;
    assert!(matches!(result, Err(OracleError::InvalidRules(_))));
    assert_eq!(oracle.table_calls(), 0);
}

#[tokio::test]
async fn cache_surfaces_oracle_failures() {
    let cache = StrategyCache::new(Arc::new(BrokenOracle));
    let result = cache.tables(Rules::default()).await;
    assert!(matches!(result, Err(OracleError::Failed(_))));
    assert!(cache.cached(&Rules::default()).is_none());
}

#[tokio::test]
async fn store_changes_reach_the_cache() {
    let store = store();
    let oracle = Arc::new(FakeOracle::default());
    let cache = StrategyCache::new(Arc::clone(&oracle));

    let before = cache.current(&store).await.unwrap();
    store.set(Rules { num_decks: 1, ..Rules::default() }).unwrap();
    let after = cache.current(&store).await.unwrap();

    assert_ne!(before, after);
    assert_eq!(oracle.table_calls(), 2);
}

// ── rules store ──────────────────────────────────────────────────────────────

#[test]
fn zero_decks_is_rejected_and_prior_rules_kept() {
    let store = store();
    let prior = Rules { num_decks: 2, ..Rules::default() };
    store.set(prior).unwrap();

    let err = store.set(Rules { num_decks: 0, ..Rules::default() }).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(e) if e.field == RulesField::NumDecks));
    assert_eq!(store.get(), prior);
}

#[test]
fn set_then_get_round_trips_every_rule_set() {
    let store = store();
    for rules in rule_sets() {
        store.set(rules).unwrap();
        assert_eq!(store.get(), rules);
    }
}

// ── trainer ──────────────────────────────────────────────────────────────────

#[test]
fn matching_action_counts_success_and_deals_fresh_hand() {
    let store = store();
    let oracle = Arc::new(FakeOracle::default());
    let mut trainer = Trainer::seeded(Arc::clone(&oracle), Arc::clone(&store), 11);

    let hand = *trainer.hand();
    let best = query_best_action(&*oracle, &store.get(), &hand.player_ranks(), hand.dealer.rank)
        .unwrap();
    let verdict = trainer.score(hand.id, best).unwrap();

    assert!(verdict.correct);
    let stats = trainer.stats();
    assert_eq!((stats.total, stats.success, stats.failures), (1, 1, 0));
    assert_ne!(trainer.hand().id, hand.id);
}

#[test]
fn differing_action_counts_failure() {
    let store = store();
    let oracle = Arc::new(FakeOracle::default());
    let mut trainer = Trainer::seeded(Arc::clone(&oracle), Arc::clone(&store), 12);

    let hand = *trainer.hand();
    let best = query_best_action(&*oracle, &store.get(), &hand.player_ranks(), hand.dealer.rank)
        .unwrap();
    let wrong = PlayerAction::ALL.into_iter().find(|a| *a != best).unwrap();
    let verdict = trainer.score(hand.id, wrong).unwrap();

    assert!(!verdict.correct);
    assert_eq!(verdict.correct_action, best);
    let stats = trainer.stats();
    assert_eq!((stats.total, stats.success, stats.failures), (1, 0, 1));
}

#[test]
fn repeated_scoring_of_one_deal_counts_once() {
    let mut trainer = Trainer::seeded(FakeOracle::default(), Rules::default(), 13);
    let id = trainer.hand().id;
    let results: Vec<_> = (0..5).map(|_| trainer.score(id, PlayerAction::Hit)).collect();
    assert!(results[0].is_ok());
    assert!(results[1..].iter().all(|r| matches!(r, Err(TrainerError::StaleDeal(_)))));
    assert_eq!(trainer.stats().total, 1);
}

#[test]
fn trainer_reads_rules_at_scoring_time() {
    let store = store();
    let mut trainer = Trainer::seeded(FakeOracle::default(), Arc::clone(&store), 14);
    store.set(Rules { surrender: SurrenderRule::Late, ..Rules::default() }).unwrap();

    // Deal until the dealer shows an ace; with late surrender the fake oracle
    // then always says surrender.
    let mut hand = *trainer.hand();
    while hand.dealer.rank != Rank::Ace {
        hand = trainer.deal();
    }
    let verdict = trainer.score(hand.id, PlayerAction::Surrender).unwrap();
    assert!(verdict.correct);
}

#[test]
fn oracle_failure_leaves_round_unscored() {
    let mut trainer = Trainer::seeded(BrokenOracle, Rules::default(), 15);
    let id = trainer.hand().id;
    assert!(matches!(trainer.score(id, PlayerAction::Hit), Err(TrainerError::Oracle(_))));
    assert_eq!(trainer.stats().total, 0);
    assert_eq!(trainer.hand().id, id);
}

#[test]
fn verdict_follows_player_ranks() {
    let oracle = FakeOracle::default();
    let mut trainer = Trainer::seeded(oracle, Rules::default(), 16);
    for _ in 0..100 {
        let hand = *trainer.hand();
        let verdict = trainer.score(hand.id, PlayerAction::Hit).unwrap();
        let ranks = hand.player_ranks();
        let expected = if ranks[0] == ranks[1] {
            PlayerAction::Split
        } else if ranks.contains(&Rank::Ace) {
            PlayerAction::Stand
        } else {
            PlayerAction::Hit
        };
        assert_eq!(verdict.correct_action, expected, "hand {hand}");
    }
}

// ── presentation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn default_hard_grid_is_ascending_with_ten_columns() {
    let cache = StrategyCache::new(Arc::new(FakeOracle::default()));
    let tables = cache.tables(Rules::default()).await.unwrap();
    let grid = TableGrid::build(TableKind::Hard, &tables.hard);

    assert!(grid.rows.iter().all(|row| row.cells.len() == 10));
    assert!(grid.rows.windows(2).all(|w| w[0].value < w[1].value));
    assert_eq!(grid.rows.first().unwrap().label, "5");
    assert_eq!(grid.rows.last().unwrap().label, "21");
}

#[tokio::test]
async fn every_grid_renders_in_every_format() {
    let cache = StrategyCache::new(Arc::new(FakeOracle::default()));
    let tables = cache.tables(Rules::default()).await.unwrap();

    for grid in TableGrid::build_all(&tables) {
        let rows = grid.rows.len();
        let csv = grid.render(TableFormat::Csv);
        assert_eq!(csv.lines().count(), rows + 1);
        assert!(csv.lines().all(|line| line.split(',').count() == 11));

        let md = grid.render(TableFormat::Markdown);
        assert_eq!(md.lines().count(), rows + 2);

        let json: serde_json::Value = serde_json::from_str(&grid.render(TableFormat::Json)).unwrap();
        assert_eq!(json.as_array().unwrap().len(), rows);
    }
}

#[tokio::test]
async fn pair_cells_expose_split_in_breakdown() {
    let cache = StrategyCache::new(Arc::new(FakeOracle::default()));
    let tables = cache.tables(Rules::default()).await.unwrap();
    let pairs = TableGrid::build(TableKind::Pair, &tables.pair);
    let hard = TableGrid::build(TableKind::Hard, &tables.hard);

    assert_eq!(pairs.rows.last().unwrap().label, "A A");
    assert!(pairs.rows[0].cells.iter().all(|c| c.breakdown().len() == 5));
    assert!(hard.rows[0].cells.iter().all(|c| c.breakdown().len() == 4));
}

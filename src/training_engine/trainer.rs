//! Drill engine: deal a hand, take the user's action, score it against the
//! oracle, deal again.
//!
//! Every dealt hand carries a [`DealId`]. [`Trainer::score`] only accepts the
//! id of the hand currently on display, so a round can be scored at most
//! once no matter how often the caller retries.

use std::fmt;

use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::training_engine::{
    models::{Card, PlayerAction, Rank},
    oracle::{query_best_action, OracleError, StrategyOracle},
    shoe::InfiniteShoe,
    store::RulesSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DealId(u64);

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Running score. `total == success + failures` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: u64,
    pub success: u64,
    pub failures: u64,
}

impl Stats {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.success += 1;
        } else {
            self.failures += 1;
        }
    }

    /// Share of correct answers, `None` before the first round.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.success as f64 / self.total as f64)
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} correct", self.success, self.total)
    }
}

/// Two player cards and the dealer's upcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hand {
    pub id: DealId,
    pub player: [Card; 2],
    pub dealer: Card,
}

impl Hand {
    pub fn player_ranks(&self) -> [Rank; 2] {
        [self.player[0].rank, self.player[1].rank]
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} vs {}", self.player[0], self.player[1], self.dealer)
    }
}

/// Round phase. `score` passes through `Scored` and deals again before it
/// returns, so callers only ever observe `Dealt`. At-most-once scoring rests
/// on the [`DealId`] ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// A hand is on display, waiting for a decision.
    Dealt,
    /// The hand has been scored; the next deal has not happened yet.
    Scored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainerState {
    pub hand: Hand,
    pub phase: Phase,
    pub stats: Stats,
}

/// Outcome of one scored round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub hand: Hand,
    pub chosen: PlayerAction,
    pub correct_action: PlayerAction,
    pub correct: bool,
}

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("deal {0} is not awaiting a decision")]
    StaleDeal(DealId),
    #[error("strategy oracle failed: {0}")]
    Oracle(#[from] OracleError),
}

pub struct Trainer<O, S> {
    oracle: O,
    rules: S,
    shoe: InfiniteShoe,
    rng: StdRng,
    next_id: u64,
    hand: Hand,
    phase: Phase,
    stats: Stats,
}

impl<O: StrategyOracle, S: RulesSource> Trainer<O, S> {
    /// Start a session with an entropy-seeded shoe and deal the first hand.
    pub fn new(oracle: O, rules: S) -> Self {
        Self::with_rng(oracle, rules, StdRng::from_entropy())
    }

    /// Like [`Trainer::new`] but every deal is reproducible from `seed`.
    pub fn seeded(oracle: O, rules: S, seed: u64) -> Self {
        Self::with_rng(oracle, rules, StdRng::seed_from_u64(seed))
    }

    fn with_rng(oracle: O, rules: S, mut rng: StdRng) -> Self {
        let shoe = InfiniteShoe::new();
        let hand = draw_hand(&shoe, &mut rng, DealId(0));
        Trainer {
            oracle,
            rules,
            shoe,
            rng,
            next_id: 1,
            hand,
            phase: Phase::Dealt,
            stats: Stats::default(),
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> TrainerState {
        TrainerState { hand: self.hand, phase: self.phase, stats: self.stats }
    }

    /// Replace the current hand with a fresh one. Stats are kept, and the
    /// previous hand can no longer be scored.
    pub fn deal(&mut self) -> Hand {
        let id = DealId(self.next_id);
        self.next_id += 1;
        self.hand = draw_hand(&self.shoe, &mut self.rng, id);
        self.phase = Phase::Dealt;
        tracing::debug!("Dealt {} {}", id, self.hand);
        self.hand
    }

    /// Score `action` for hand `deal`, then deal the next hand.
    ///
    /// Fails with [`TrainerError::StaleDeal`] unless `deal` is the hand on
    /// display and has not been scored; stats are untouched in that case.
    /// An oracle failure also leaves the round unscored.
    pub fn score(&mut self, deal: DealId, action: PlayerAction) -> Result<Verdict, TrainerError> {
        if deal != self.hand.id {
            tracing::debug!("Ignoring score for stale deal {}", deal);
            return Err(TrainerError::StaleDeal(deal));
        }

        let rules = self.rules.rules();
        let correct_action = query_best_action(
            &self.oracle,
            &rules,
            &self.hand.player_ranks(),
            self.hand.dealer.rank,
        )?;

        let correct = action == correct_action;
        self.phase = Phase::Scored;
        self.stats.record(correct);
        let verdict = Verdict { hand: self.hand, chosen: action, correct_action, correct };
        tracing::debug!(
            "Scored {}: chose {:?}, best {:?} ({})",
            deal,
            action,
            correct_action,
            self.stats
        );

        self.deal();
        Ok(verdict)
    }
}

fn draw_hand(shoe: &InfiniteShoe, rng: &mut StdRng, id: DealId) -> Hand {
    let player = [shoe.draw(rng), shoe.draw(rng)];
    let dealer = shoe.draw(rng);
    Hand { id, player, dealer }
}

use rand::Rng;
use crate::training_engine::models::{Card, Rank, Suit};

/// An infinite shoe: every draw is independent and uniform over the 13
/// ranks and 4 suits, so a card is never used up.
///
/// Does not consult the configured deck count.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfiniteShoe;

impl InfiniteShoe {
    pub fn new() -> Self {
        InfiniteShoe
    }

    /// Draw one card.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        let rank = Rank::ALL[rng.gen_range(0..Rank::ALL.len())];
        let suit = Suit::ALL[rng.gen_range(0..Suit::ALL.len())];
        Card { rank, suit }
    }

    /// Draw `n` cards.
    pub fn draw_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Card> {
        (0..n).map(|_| self.draw(rng)).collect()
    }
}

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Card primitives
// ---------------------------------------------------------------------------

/// Card suit. Only selects how a card is drawn; it never reaches the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suit::Clubs    => write!(f, "c"),
            Suit::Diamonds => write!(f, "d"),
            Suit::Hearts   => write!(f, "h"),
            Suit::Spades   => write!(f, "s"),
        }
    }
}

/// One of the thirteen card ranks.
///
/// A rank is an opaque token handed to the strategy oracle. Nothing in this
/// crate assigns it a blackjack point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Rank::Ace   => "A",
            Rank::Two   => "2",
            Rank::Three => "3",
            Rank::Four  => "4",
            Rank::Five  => "5",
            Rank::Six   => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine  => "9",
            Rank::Ten   => "10",
            Rank::Jack  => "J",
            Rank::Queen => "Q",
            Rank::King  => "K",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid card rank {0:?}, expected one of A 2-10 J Q K")]
pub struct ParseCardError(pub String);

impl FromStr for Rank {
    type Err = ParseCardError;

    /// Accepts the display tokens (`A`, `2`..`10`, `J`, `Q`, `K`) in any
    /// case, plus `T` for ten.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let rank = match token.to_ascii_uppercase().as_str() {
            "A"        => Rank::Ace,
            "2"        => Rank::Two,
            "3"        => Rank::Three,
            "4"        => Rank::Four,
            "5"        => Rank::Five,
            "6"        => Rank::Six,
            "7"        => Rank::Seven,
            "8"        => Rank::Eight,
            "9"        => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J"        => Rank::Jack,
            "Q"        => Rank::Queen,
            "K"        => Rank::King,
            _ => return Err(ParseCardError(token.to_string())),
        };
        Ok(rank)
    }
}

/// Parse a colon- or space-separated list of rank tokens, e.g. `"A:7"`.
pub fn parse_ranks(s: &str) -> Result<Vec<Rank>, ParseCardError> {
    s.split(|c: char| c == ':' || c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::parse::<Rank>)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

// ---------------------------------------------------------------------------
// Player decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    Hit,
    Stand,
    DoubleOrHit,
    DoubleOrStand,
    Split,
    Surrender,
}

impl PlayerAction {
    pub const ALL: [PlayerAction; 6] = [
        PlayerAction::Hit,
        PlayerAction::Stand,
        PlayerAction::DoubleOrHit,
        PlayerAction::DoubleOrStand,
        PlayerAction::Split,
        PlayerAction::Surrender,
    ];
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info().label)
    }
}

// ---------------------------------------------------------------------------
// Strategy tables
// ---------------------------------------------------------------------------

/// Expected value of every alternative for one hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundEvs {
    pub hit: f64,
    pub stand: f64,
    pub double: f64,
    /// Only present when splitting is a legal alternative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<f64>,
}

/// One entry of a strategy table: the recommended action and its EVs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub action: PlayerAction,
    pub ev: f64,
    pub evs: RoundEvs,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableShapeError {
    #[error("row range {from}..={to} is empty")]
    EmptyRange { from: u8, to: u8 },
    #[error("table {from}..={to} needs {expected} cells, got {actual}")]
    CellCount { from: u8, to: u8, expected: usize, actual: usize },
}

/// Row bounds the reference oracle uses for each category.
pub const HARD_ROWS: (u8, u8) = (5, 21);
pub const SOFT_ROWS: (u8, u8) = (13, 21);
/// Pair rows are indexed by the paired card's value, 11 standing for aces.
pub const PAIR_ROWS: (u8, u8) = (2, 11);

/// A row-major grid of cells. Rows run over player values `from..=to`,
/// columns over dealer upcards 2..=10 then Ace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct StrategyTable {
    from: u8,
    to: u8,
    cells: Vec<Cell>,
}

#[derive(Deserialize)]
struct TableParts {
    from: u8,
    to: u8,
    cells: Vec<Cell>,
}

impl TryFrom<TableParts> for StrategyTable {
    type Error = TableShapeError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        StrategyTable::new(parts.from, parts.to, parts.cells)
    }
}

impl StrategyTable {
    /// Dealer upcard columns: 2 through 10, then Ace.
    pub const COLUMNS: usize = 10;

    pub fn new(from: u8, to: u8, cells: Vec<Cell>) -> Result<Self, TableShapeError> {
        if from > to {
            return Err(TableShapeError::EmptyRange { from, to });
        }
        let expected = (to - from) as usize * Self::COLUMNS + Self::COLUMNS;
        if cells.len() != expected {
            return Err(TableShapeError::CellCount { from, to, expected, actual: cells.len() });
        }
        Ok(StrategyTable { from, to, cells })
    }

    pub fn player_from(&self) -> u8 {
        self.from
    }

    pub fn player_to(&self) -> u8 {
        self.to
    }

    pub fn row_count(&self) -> usize {
        (self.to - self.from) as usize + 1
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `row` (0 = `from`) and `column` (0 = upcard 2).
    pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
        if column >= Self::COLUMNS {
            return None;
        }
        self.cells.get(row.checked_mul(Self::COLUMNS)?.checked_add(column)?)
    }

    /// Cells of one row, ordered by dealer upcard.
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        let start = row.checked_mul(Self::COLUMNS)?;
        self.cells.get(start..start.checked_add(Self::COLUMNS)?)
    }

    pub fn rows(&self) -> impl Iterator<Item = (u8, &[Cell])> + '_ {
        (self.from..=self.to).zip(self.cells.chunks(Self::COLUMNS))
    }
}

/// The three category tables an oracle produces for one set of rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTables {
    pub hard: StrategyTable,
    pub soft: StrategyTable,
    pub pair: StrategyTable,
}

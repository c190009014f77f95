//! Table rules the strategy is derived from.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlackjackPayout {
    Ratio3to2,
    Ratio6to5,
}

impl fmt::Display for BlackjackPayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlackjackPayout::Ratio3to2 => write!(f, "3:2"),
            BlackjackPayout::Ratio6to5 => write!(f, "6:5"),
        }
    }
}

/// What the dealer does holding a soft 17.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Soft17Rule {
    Hit,
    Stand,
}

impl fmt::Display for Soft17Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Soft17Rule::Hit   => write!(f, "H17"),
            Soft17Rule::Stand => write!(f, "S17"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurrenderRule {
    None,
    /// Surrender before the dealer checks for blackjack.
    Early,
    /// Surrender after the dealer checks for blackjack.
    Late,
}

impl fmt::Display for SurrenderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurrenderRule::None  => write!(f, "no surrender"),
            SurrenderRule::Early => write!(f, "early surrender"),
            SurrenderRule::Late  => write!(f, "late surrender"),
        }
    }
}

/// Bounds shared by the integer rule fields.
pub const MIN_COUNT: u32 = 1;
pub const MAX_COUNT: u32 = 255;

/// A complete table configuration.
///
/// Integer fields are wider than their valid range so that out-of-range
/// candidates can be represented and rejected by [`Rules::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    pub blackjack_payout: BlackjackPayout,
    pub dealer_soft17: Soft17Rule,
    pub surrender: SurrenderRule,
    pub num_decks: u32,
    pub max_splits: u32,
    pub double_after_split_allowed: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            blackjack_payout: BlackjackPayout::Ratio3to2,
            dealer_soft17: Soft17Rule::Stand,
            surrender: SurrenderRule::None,
            num_decks: 6,
            max_splits: 1,
            double_after_split_allowed: false,
        }
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} decks, {}, blackjack pays {}, {}, max {} split(s), {}",
            self.num_decks,
            self.dealer_soft17,
            self.blackjack_payout,
            self.surrender,
            self.max_splits,
            if self.double_after_split_allowed { "DAS" } else { "no DAS" },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RulesField {
    NumDecks,
    MaxSplits,
}

impl fmt::Display for RulesField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesField::NumDecks  => write!(f, "numDecks"),
            RulesField::MaxSplits => write!(f, "maxSplits"),
        }
    }
}

/// A rule field outside its allowed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} must be between {min} and {max}, got {value}")]
pub struct ValidationError {
    pub field: RulesField,
    pub value: u32,
    pub min: u32,
    pub max: u32,
}

impl Rules {
    /// Check every bounded field. Enum fields are valid by construction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_count(RulesField::NumDecks, self.num_decks)?;
        check_count(RulesField::MaxSplits, self.max_splits)?;
        Ok(())
    }
}

fn check_count(field: RulesField, value: u32) -> Result<(), ValidationError> {
    if (MIN_COUNT..=MAX_COUNT).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError { field, value, min: MIN_COUNT, max: MAX_COUNT })
    }
}

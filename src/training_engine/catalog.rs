//! Display metadata for every [`PlayerAction`].
//!
//! This is the single source for labels, short codes, and colour tags. The
//! `match` in [`PlayerAction::info`] is exhaustive, so a new action variant
//! does not compile until it has an entry here.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::training_engine::models::PlayerAction;

/// Colour category used to group actions in a strategy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionColor {
    Red,
    Yellow,
    Blue,
    Green,
    Gray,
}

impl fmt::Display for ActionColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionColor::Red    => write!(f, "red"),
            ActionColor::Yellow => write!(f, "yellow"),
            ActionColor::Blue   => write!(f, "blue"),
            ActionColor::Green  => write!(f, "green"),
            ActionColor::Gray   => write!(f, "gray"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub label: &'static str,
    pub short: &'static str,
    pub color: ActionColor,
}

impl PlayerAction {
    pub fn info(self) -> ActionInfo {
        let (label, short, color) = match self {
            PlayerAction::Hit           => ("Hit", "H", ActionColor::Red),
            PlayerAction::Stand         => ("Stand", "S", ActionColor::Yellow),
            PlayerAction::DoubleOrHit   => ("Double (or hit)", "DH", ActionColor::Blue),
            PlayerAction::DoubleOrStand => ("Double (or stand)", "DS", ActionColor::Blue),
            PlayerAction::Split         => ("Split", "P", ActionColor::Green),
            PlayerAction::Surrender     => ("Surrender", "R", ActionColor::Gray),
        };
        ActionInfo { label, short, color }
    }

    pub fn short(self) -> &'static str {
        self.info().short
    }
}

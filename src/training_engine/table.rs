//! Display grid for a [`StrategyTable`].
//!
//! A grid has a fixed header of ten dealer upcards (`2`..`10`, `A`) and one
//! row per player value, labelled according to the table kind:
//!
//! | Kind | Row value | Label |
//! |------|-----------|-------|
//! | Hard | 12        | `12`  |
//! | Soft | 18        | `A7`  |
//! | Pair | 8 / 11    | `8 8` / `A A` |
//!
//! Each cell carries the action's short code and colour for the grid itself
//! plus the full EV breakdown for inspection. Grids render to Markdown, CSV,
//! or JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::training_engine::{
    catalog::ActionColor,
    models::{Cell, PlayerAction, RoundEvs, StrategyTable, StrategyTables},
};

/// Dealer upcard column headers, in column order.
pub const COLUMN_LABELS: [&str; StrategyTable::COLUMNS] =
    ["2", "3", "4", "5", "6", "7", "8", "9", "10", "A"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Hard,
    Soft,
    Pair,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Hard, TableKind::Soft, TableKind::Pair];

    pub fn title(self) -> &'static str {
        match self {
            TableKind::Hard => "Hard",
            TableKind::Soft => "Soft",
            TableKind::Pair => "Pair",
        }
    }

    /// Label for the row holding player value `value`.
    pub fn row_label(self, value: u8) -> String {
        match self {
            TableKind::Hard => value.to_string(),
            TableKind::Soft => format!("A{}", value.saturating_sub(11)),
            TableKind::Pair => {
                let rank = match value {
                    11 => "A".to_string(),
                    _ => value.to_string(),
                };
                format!("{rank} {rank}")
            }
        }
    }

    pub fn table(self, tables: &StrategyTables) -> &StrategyTable {
        match self {
            TableKind::Hard => &tables.hard,
            TableKind::Soft => &tables.soft,
            TableKind::Pair => &tables.pair,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub action: PlayerAction,
    pub short: &'static str,
    pub color: ActionColor,
    pub ev: f64,
    pub evs: RoundEvs,
}

impl GridCell {
    fn from_cell(cell: &Cell) -> Self {
        let info = cell.action.info();
        GridCell {
            action: cell.action,
            short: info.short,
            color: info.color,
            ev: cell.ev,
            evs: cell.evs,
        }
    }

    /// Named EVs for a tooltip: overall first, then each alternative.
    /// Split is left out when it was not a legal alternative.
    pub fn breakdown(&self) -> Vec<(&'static str, f64)> {
        let mut rows = vec![
            ("EV", self.ev),
            ("Hit", self.evs.hit),
            ("Stand", self.evs.stand),
            ("Double", self.evs.double),
        ];
        if let Some(split) = self.evs.split {
            rows.push(("Split", split));
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub value: u8,
    pub label: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    pub kind: TableKind,
    pub rows: Vec<GridRow>,
}

impl TableGrid {
    pub fn build(kind: TableKind, table: &StrategyTable) -> Self {
        let rows = table
            .rows()
            .map(|(value, cells)| GridRow {
                value,
                label: kind.row_label(value),
                cells: cells.iter().map(GridCell::from_cell).collect(),
            })
            .collect();
        TableGrid { kind, rows }
    }

    /// Hard, soft, and pair grids in that order.
    pub fn build_all(tables: &StrategyTables) -> Vec<TableGrid> {
        TableKind::ALL
            .iter()
            .map(|&kind| TableGrid::build(kind, kind.table(tables)))
            .collect()
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMN_LABELS
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&GridCell> {
        self.rows.get(row)?.cells.get(column)
    }

    pub fn render(&self, format: TableFormat) -> String {
        match format {
            TableFormat::Markdown => self.to_markdown(),
            TableFormat::Csv => self.to_csv(),
            TableFormat::Json => format!("{:#}", self.to_json()),
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("| Hand \\ Dealer |");
        for label in COLUMN_LABELS {
            out.push_str(&format!(" {label:<2} |"));
        }
        out.push_str("\n|---------------|");
        for _ in COLUMN_LABELS {
            out.push_str(":--:|");
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!("| {:<13} |", row.label));
            for cell in &row.cells {
                out.push_str(&format!(" {:<2} |", cell.short));
            }
            out.push('\n');
        }
        out
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for label in COLUMN_LABELS {
            out.push(',');
            out.push_str(label);
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.label);
            for cell in &row.cells {
                out.push(',');
                out.push_str(cell.short);
            }
            out.push('\n');
        }
        out
    }

    /// `[{ "player": "A7", "entries": [{ "dealer": "2", "action": "DS", "ev": 0.1 }, ..] }, ..]`
    pub fn to_json(&self) -> Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let entries = row
                    .cells
                    .iter()
                    .zip(COLUMN_LABELS)
                    .map(|(cell, dealer)| {
                        json!({ "dealer": dealer, "action": cell.short, "ev": cell.ev })
                    })
                    .collect::<Vec<_>>();
                json!({ "player": row.label, "entries": entries })
            })
            .collect();
        Value::Array(rows)
    }
}

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableFormat {
    #[default]
    Markdown,
    Csv,
    Json,
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableFormat::Markdown => write!(f, "markdown"),
            TableFormat::Csv      => write!(f, "csv"),
            TableFormat::Json     => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown table format {0:?}, expected markdown, csv, or json")]
pub struct ParseTableFormatError(pub String);

impl FromStr for TableFormat {
    type Err = ParseTableFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(TableFormat::Markdown),
            "csv"             => Ok(TableFormat::Csv),
            "json"            => Ok(TableFormat::Json),
            _ => Err(ParseTableFormatError(s.to_string())),
        }
    }
}

//! Pairing per-column move lists and rendering PGN.
//!
//! Physical columns alternate sides: even column indices hold White's
//! moves, odd indices hold Black's. The assembler concatenates the sides
//! in column order, zips them into numbered pairs, and renders a PGN
//! document with a seven-tag header. A side running one move short is
//! normal (White may have the last move); the gap is carried as an absent
//! move, never an error.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::core::traits::ColumnarMoves;

/// One numbered move pair; either side may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePair {
    /// One-based move number.
    pub move_number: usize,
    /// White's move, if read.
    pub white: Option<String>,
    /// Black's reply, if read.
    pub black: Option<String>,
}

/// The seven-tag PGN header roster.
///
/// Unknown players and sites render as `"?"`, an unfinished or unknown
/// result as `"*"`, per the PGN export convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTags {
    /// Event name. Default `"?"`.
    #[serde(default = "unknown_tag")]
    pub event: String,
    /// Site of the game. Default `"?"`.
    #[serde(default = "unknown_tag")]
    pub site: String,
    /// Date as `YYYY.MM.DD`; defaults to the day of processing.
    #[serde(default)]
    pub date: Option<String>,
    /// Round, when known.
    #[serde(default)]
    pub round: Option<String>,
    /// White player name. Default `"?"`.
    #[serde(default = "unknown_tag")]
    pub white: String,
    /// Black player name. Default `"?"`.
    #[serde(default = "unknown_tag")]
    pub black: String,
    /// Game result. Default `"*"`.
    #[serde(default = "unknown_result")]
    pub result: String,
}

fn unknown_tag() -> String {
    "?".to_string()
}

fn unknown_result() -> String {
    "*".to_string()
}

impl Default for GameTags {
    fn default() -> Self {
        Self {
            event: unknown_tag(),
            site: unknown_tag(),
            date: None,
            round: None,
            white: unknown_tag(),
            black: unknown_tag(),
            result: unknown_result(),
        }
    }
}

/// Merges per-column move arrays into move pairs and renders PGN.
#[derive(Debug, Clone, Default)]
pub struct TranscriptAssembler {
    tags: GameTags,
}

impl TranscriptAssembler {
    /// Creates an assembler rendering the given header tags.
    pub fn new(tags: GameTags) -> Self {
        Self { tags }
    }

    /// Splits per-column move arrays into White's and Black's sequences.
    ///
    /// Columns are consumed in index order; even indices append to White,
    /// odd to Black.
    pub fn split_sides(columns: &[Vec<String>]) -> (Vec<String>, Vec<String>) {
        let mut white = Vec::new();
        let mut black = Vec::new();
        for (index, column) in columns.iter().enumerate() {
            if index % 2 == 0 {
                white.extend(column.iter().cloned());
            } else {
                black.extend(column.iter().cloned());
            }
        }
        (white, black)
    }

    /// Reorders a structured whole-sheet response into per-column arrays.
    ///
    /// Missing column indices become empty columns so the even/odd side
    /// convention stays aligned.
    pub fn columns_from_response(response: &ColumnarMoves) -> Vec<Vec<String>> {
        let count = response
            .columns
            .iter()
            .map(|c| c.column_index + 1)
            .max()
            .unwrap_or(0);
        let mut columns = vec![Vec::new(); count];
        for column in &response.columns {
            columns[column.column_index] = column.moves.clone();
        }
        columns
    }

    /// Zips the two sides into numbered pairs.
    ///
    /// The longer side pads the shorter with absent moves; `pair[i]` is
    /// move `i + 1`.
    pub fn pair_moves(white: &[String], black: &[String]) -> Vec<MovePair> {
        let rounds = white.len().max(black.len());
        (0..rounds)
            .map(|i| MovePair {
                move_number: i + 1,
                white: white.get(i).cloned(),
                black: black.get(i).cloned(),
            })
            .collect()
    }

    /// Renders the PGN document: header block, blank line, movetext, and
    /// the `*` termination marker.
    pub fn render_pgn(&self, pairs: &[MovePair]) -> String {
        let date = self
            .tags
            .date
            .clone()
            .unwrap_or_else(|| Local::now().format("%Y.%m.%d").to_string());
        let round = self.tags.round.clone().unwrap_or_else(unknown_tag);

        let mut pgn = String::new();
        pgn.push_str(&format!("[Event \"{}\"]\n", self.tags.event));
        pgn.push_str(&format!("[Site \"{}\"]\n", self.tags.site));
        pgn.push_str(&format!("[Date \"{}\"]\n", date));
        pgn.push_str(&format!("[Round \"{}\"]\n", round));
        pgn.push_str(&format!("[White \"{}\"]\n", self.tags.white));
        pgn.push_str(&format!("[Black \"{}\"]\n", self.tags.black));
        pgn.push_str(&format!("[Result \"{}\"]\n", self.tags.result));
        pgn.push('\n');

        let mut lines = Vec::new();
        for pair in pairs {
            if pair.white.is_none() && pair.black.is_none() {
                continue;
            }
            let mut line = format!("{}.", pair.move_number);
            if let Some(white) = &pair.white {
                line.push(' ');
                line.push_str(white);
            }
            if let Some(black) = &pair.black {
                line.push(' ');
                line.push_str(black);
            }
            lines.push(line);
        }
        pgn.push_str(&lines.join("\n"));
        pgn.push_str(" *");
        pgn
    }

    /// Pairs per-column arrays and renders them in one step.
    pub fn assemble(&self, columns: &[Vec<String>]) -> (Vec<MovePair>, String) {
        let (white, black) = Self::split_sides(columns);
        let pairs = Self::pair_moves(&white, &black);
        let pgn = self.render_pgn(&pairs);
        (pairs, pgn)
    }
}

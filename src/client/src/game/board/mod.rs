use core::fmt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::tile::stack_height;

/// Board square address. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Scrabble,
    Upwords,
}

impl Variant {
    pub fn from_game_id(game_id: &str) -> Option<Self> {
        match game_id {
            "scrabble" => Some(Variant::Scrabble),
            "upwords" => Some(Variant::Upwords),
            _ => None,
        }
    }

    pub fn board_size(&self) -> usize {
        match self {
            Variant::Scrabble => 15,
            Variant::Upwords => 10,
        }
    }

    pub fn default_stack_height(&self) -> usize {
        match self {
            Variant::Scrabble => 1,
            Variant::Upwords => 5,
        }
    }

    pub fn shows_points(&self) -> bool {
        matches!(self, Variant::Scrabble)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplier {
    #[serde(rename = "dl")]
    DoubleLetter,
    #[serde(rename = "tl")]
    TripleLetter,
    #[serde(rename = "dw")]
    DoubleWord,
    #[serde(rename = "tw")]
    TripleWord,
    #[serde(rename = "start")]
    Start,
}

impl Multiplier {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "dl" => Some(Multiplier::DoubleLetter),
            "tl" => Some(Multiplier::TripleLetter),
            "dw" => Some(Multiplier::DoubleWord),
            "tw" => Some(Multiplier::TripleWord),
            "start" => Some(Multiplier::Start),
            _ => None,
        }
    }

    /// Text printed on an empty square. The starting square has none.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Multiplier::DoubleLetter => Some("DL"),
            Multiplier::TripleLetter => Some("TL"),
            Multiplier::DoubleWord => Some("DW"),
            Multiplier::TripleWord => Some("TW"),
            Multiplier::Start => None,
        }
    }
}

/// Letters committed in earlier turns plus the static multiplier layout.
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: Vec<Vec<Option<String>>>,
    multipliers: Vec<Vec<Option<Multiplier>>>,
}

impl Board {
    /// Builds the board from the page's grid (`rows[y][x]`). Empty strings
    /// count as empty squares.
    pub fn new(rows: Vec<Vec<Option<String>>>, config: Option<Vec<Vec<Option<String>>>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|letter| letter.filter(|l| !l.is_empty()))
                    .collect()
            })
            .collect();

        let multipliers = config
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|label| {
                        let label = label?;
                        let multiplier = Multiplier::from_label(&label);
                        if multiplier.is_none() && !label.is_empty() {
                            debug!(label = %label, "Ignoring unknown multiplier label");
                        }
                        multiplier
                    })
                    .collect()
            })
            .collect();

        Self { rows, multipliers }
    }

    pub fn empty(size: usize) -> Self {
        Self {
            rows: vec![vec![None; size]; size],
            multipliers: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.rows
            .get(coord.y)
            .is_some_and(|row| coord.x < row.len())
    }

    /// Permanent letter code at `coord`, if any.
    pub fn permanent(&self, coord: Coord) -> Option<&str> {
        self.rows.get(coord.y)?.get(coord.x)?.as_deref()
    }

    pub fn permanent_height(&self, coord: Coord) -> usize {
        self.permanent(coord).map_or(0, stack_height)
    }

    pub fn multiplier(&self, coord: Coord) -> Option<Multiplier> {
        *self.multipliers.get(coord.y)?.get(coord.x)?
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.rows {
            for letter in row {
                match letter {
                    Some(letter) => write!(f, " {} ", crate::game::tile::display_letter(letter))?,
                    None => write!(f, " . ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

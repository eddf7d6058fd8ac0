use serde::{Deserialize, Serialize};

use crate::game::{scoring::Scorer, Variant};

/// Leading character of a blank tile's letter code. The assigned letter, if
/// any, follows it (`"-"` unassigned, `"-Q"` played as Q).
pub const BLANK: char = '-';

/// Stable identifier of a tile while it is in hand.
pub type TileId = u32;

/// A letter tile that can be dragged between the rack, the board and the
/// exchange basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub letter: String,
    pub height: usize,
}

impl Tile {
    pub fn new(id: TileId, letter: impl Into<String>) -> Self {
        let letter = letter.into();
        let height = stack_height(&letter);
        Self { id, letter, height }
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.letter)
    }

    pub fn display_letter(&self) -> &str {
        display_letter(&self.letter)
    }

    /// Face value of the tile, `None` for variants whose tiles carry no
    /// printed points.
    pub fn points(&self, variant: Variant) -> Option<u32> {
        if self.is_blank() {
            return variant.shows_points().then_some(0);
        }
        let scorer = Scorer::for_variant(variant)?;
        self.letter
            .chars()
            .next()
            .map(|c| scorer.get_letter_points(c))
    }
}

/// Empty rack slots have no tile, so nothing there can be picked up.
pub fn is_draggable(slot: Option<&Tile>) -> bool {
    slot.is_some()
}

pub fn is_blank(letter: &str) -> bool {
    letter.starts_with(BLANK)
}

/// Letter shown on the tile face. Blanks show their assigned letter (or
/// nothing); stacks show their most recent letter.
pub fn display_letter(letter: &str) -> &str {
    if let Some(assigned) = letter.strip_prefix(BLANK) {
        return assigned;
    }
    match letter.char_indices().nth(1) {
        Some((end, _)) => &letter[..end],
        None => letter,
    }
}

/// Number of letters layered in a letter code.
pub fn stack_height(letter: &str) -> usize {
    if is_blank(letter) {
        return 1;
    }
    letter.chars().count().max(1)
}

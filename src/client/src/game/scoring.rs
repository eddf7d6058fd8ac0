use std::collections::HashMap;

use super::Variant;

const SCRABBLE_TILE_SCORES: [(char, u32); 26] = [
    ('A', 1),
    ('B', 3),
    ('C', 3),
    ('D', 2),
    ('E', 1),
    ('F', 4),
    ('G', 2),
    ('H', 4),
    ('I', 1),
    ('J', 8),
    ('K', 5),
    ('L', 1),
    ('M', 3),
    ('N', 1),
    ('O', 1),
    ('P', 3),
    ('Q', 10),
    ('R', 1),
    ('S', 1),
    ('T', 1),
    ('U', 1),
    ('V', 4),
    ('W', 4),
    ('X', 8),
    ('Y', 4),
    ('Z', 10),
];

/// Static letter → face value lookup. Only used for display; the real turn
/// score always comes from the scoring endpoint.
#[derive(Clone, Debug)]
pub struct Scorer {
    letter_points: HashMap<char, u32>,
}

impl Scorer {
    /// Scorer for the variant's tile faces, `None` when tiles have no
    /// printed value.
    pub fn for_variant(variant: Variant) -> Option<Self> {
        match variant {
            Variant::Scrabble => Some(Self {
                letter_points: Scorer::generate_point_values(&SCRABBLE_TILE_SCORES),
            }),
            Variant::Upwords => None,
        }
    }

    fn generate_point_values(table: &[(char, u32)]) -> HashMap<char, u32> {
        let mut letter_points = HashMap::new();
        for &(letter, points) in table {
            letter_points.insert(letter, points);
        }
        letter_points
    }

    pub fn get_letter_points(&self, letter: char) -> u32 {
        *self
            .letter_points
            .get(&letter.to_ascii_uppercase())
            .unwrap_or(&0)
    }
}

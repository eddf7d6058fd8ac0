use serde::Serialize;
use tracing::debug;

use crate::game::board::{Board, Coord};
use crate::game::tile::{display_letter, stack_height, Tile, TileId};
use crate::game::transfer::Rejection;

/// A tile placed on the board this turn, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub tile: Tile,
    pub coord: Coord,
}

/// What a board square shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub coord: Coord,
    pub tile: Option<CellTile>,
    /// Multiplier text, only on squares without a tile.
    pub label: Option<&'static str>,
    /// Stack height, only in the stacking variant and only under a tile.
    pub height_indicator: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellTile {
    /// Set for provisional tiles, which can be dragged off again.
    pub id: Option<TileId>,
    /// Full letter code of the square, permanent letters first.
    pub letter: String,
    /// Letter visible on top of the square.
    pub top: String,
    pub height: usize,
    pub provisional: bool,
}

/// Provisional placements layered over the permanent board. At most one
/// placement per square per turn.
#[derive(Debug, Clone)]
pub struct PlacementOverlay {
    board: Board,
    stack_height: usize,
    placements: Vec<Placement>,
}

impl PlacementOverlay {
    pub fn new(board: Board, stack_height: usize) -> Self {
        Self {
            board,
            stack_height: stack_height.max(1),
            placements: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn stack_height(&self) -> usize {
        self.stack_height
    }

    pub fn is_stacking(&self) -> bool {
        self.stack_height > 1
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.placement_of(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.placements.iter().map(|p| p.tile.id)
    }

    pub fn placement_of(&self, id: TileId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.tile.id == id)
    }

    pub fn placement_at(&self, coord: Coord) -> Option<&Placement> {
        self.placements.iter().find(|p| p.coord == coord)
    }

    /// Drop predicate for a square: no provisional tile yet, and the
    /// permanent stack (if any) still has room for one more letter.
    pub fn check_cell(&self, coord: Coord) -> Result<(), Rejection> {
        if !self.board.contains(coord) {
            return Err(Rejection::OutOfBounds(coord));
        }
        if self.placement_at(coord).is_some() {
            return Err(Rejection::CellOccupied(coord));
        }
        if self.board.permanent_height(coord) >= self.stack_height {
            return Err(Rejection::StackFull(coord));
        }
        Ok(())
    }

    pub fn can_place(&self, coord: Coord) -> bool {
        self.check_cell(coord).is_ok()
    }

    /// Places `tile` at `coord`, lifting it from any square it already
    /// occupies this turn.
    pub fn place(&mut self, tile: Tile, coord: Coord) -> Result<(), Rejection> {
        self.check_cell(coord)?;
        self.remove(tile.id);
        debug!(tile_id = tile.id, letter = %tile.letter, %coord, "Placed tile");
        self.placements.push(Placement { tile, coord });
        Ok(())
    }

    pub fn remove(&mut self, id: TileId) -> Option<Placement> {
        let index = self.placements.iter().position(|p| p.tile.id == id)?;
        Some(self.placements.remove(index))
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }

    pub fn cell(&self, coord: Coord) -> CellView {
        let permanent = self.board.permanent(coord);
        let tile = match (self.placement_at(coord), permanent) {
            (Some(placement), permanent) => {
                let letter = format!("{}{}", permanent.unwrap_or(""), placement.tile.letter);
                Some(CellTile {
                    id: Some(placement.tile.id),
                    height: stack_height(&letter),
                    top: placement.tile.display_letter().to_string(),
                    letter,
                    provisional: true,
                })
            }
            (None, Some(permanent)) => Some(CellTile {
                id: None,
                letter: permanent.to_string(),
                top: display_letter(permanent).to_string(),
                height: stack_height(permanent),
                provisional: false,
            }),
            (None, None) => None,
        };

        let label = match tile {
            Some(_) => None,
            None => self.board.multiplier(coord).and_then(|m| m.label()),
        };
        let height_indicator = match &tile {
            Some(tile) if self.is_stacking() => Some(tile.height),
            _ => None,
        };

        CellView {
            coord,
            tile,
            label,
            height_indicator,
        }
    }

    pub fn rows(&self) -> Vec<Vec<CellView>> {
        (0..self.board.height())
            .map(|y| {
                (0..self.board.width())
                    .map(|x| self.cell(Coord::new(x, y)))
                    .collect()
            })
            .collect()
    }
}

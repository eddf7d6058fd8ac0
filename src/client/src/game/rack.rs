use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::tile::{Tile, TileId};

pub const RACK_CAPACITY: usize = 8;

/// A rack tile as delivered by the page. Tiles normally arrive without an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackTile {
    #[serde(default)]
    pub id: Option<TileId>,
    pub letter: String,
}

impl RackTile {
    pub fn new(letter: impl Into<String>) -> Self {
        Self {
            id: None,
            letter: letter.into(),
        }
    }
}

/// Ordered rack slots. Every tile in hand keeps a slot here, even while it is
/// withdrawn to the board or the basket, so that it returns to the same
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct Rack {
    slots: Vec<Option<Tile>>,
}

impl Rack {
    pub fn initialize(tiles: Vec<RackTile>) -> Self {
        Self::with_capacity(tiles, RACK_CAPACITY)
    }

    /// Assigns sequential ids to tiles lacking one and pads with empty slots
    /// up to `capacity`.
    pub fn with_capacity(tiles: Vec<RackTile>, capacity: usize) -> Self {
        let mut taken: HashSet<TileId> = tiles.iter().filter_map(|t| t.id).collect();
        let mut next_free: TileId = 0;
        let mut slots: Vec<Option<Tile>> = Vec::with_capacity(capacity.max(tiles.len()));

        for (index, tile) in tiles.into_iter().enumerate() {
            let id = match tile.id {
                Some(id) => id,
                None => {
                    let preferred = index as TileId;
                    let id = if taken.contains(&preferred) {
                        while taken.contains(&next_free) {
                            next_free += 1;
                        }
                        next_free
                    } else {
                        preferred
                    };
                    taken.insert(id);
                    id
                }
            };
            slots.push(Some(Tile::new(id, tile.letter)));
        }

        if slots.len() > capacity {
            debug!(tiles = slots.len(), capacity, "Rack holds more tiles than its capacity");
        }
        while slots.len() < capacity {
            slots.push(None);
        }

        Self { slots }
    }

    pub fn slots(&self) -> &[Option<Tile>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles().next().is_none()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.slots.iter().flatten()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles().map(|t| t.id)
    }

    pub fn position(&self, id: TileId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|t| t.id == id))
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles().find(|t| t.id == id)
    }

    pub fn tile_at(&self, index: usize) -> Option<&Tile> {
        self.slots.get(index)?.as_ref()
    }

    /// Removes the tile from its slot and splices it in at `destination`, so
    /// the tiles in between shift one place toward the tile's old index.
    /// Returns whether the order changed. Unknown ids are a silent miss.
    pub fn move_tile(&mut self, id: TileId, destination: usize) -> bool {
        let Some(start) = self.position(id) else {
            debug!(tile_id = id, destination, "move_tile: tile not in rack");
            return false;
        };
        let destination = destination.min(self.slots.len() - 1);
        if start == destination {
            return false;
        }
        let tile = self.slots.remove(start);
        self.slots.insert(destination, tile);
        true
    }

    /// Live reorder while a tile is dragged over slot `index`.
    pub fn hover(&mut self, dragged: TileId, index: usize) -> bool {
        let occupant = self.tile_at(index).map(|t| t.id);
        if occupant == Some(dragged) {
            return false;
        }
        self.move_tile(dragged, index)
    }

    /// Fisher–Yates shuffle of the occupied slots, re-padded to the same
    /// length.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let len = self.slots.len();
        let mut tiles: Vec<Option<Tile>> = self.slots.drain(..).filter(Option::is_some).collect();
        tiles.shuffle(rng);
        tiles.resize(len, None);
        self.slots = tiles;
    }

    /// Letters of the occupied slots in rack order, as persisted remotely.
    pub fn letters(&self) -> Vec<String> {
        self.tiles().map(|t| t.letter.clone()).collect()
    }
}

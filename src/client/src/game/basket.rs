use crate::game::tile::{Tile, TileId};

/// Tiles set aside for a turn-ending exchange, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeBasket {
    tiles: Vec<Tile>,
    open: bool,
}

impl ExchangeBasket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the basket and hands every tile back.
    pub fn cancel(&mut self) {
        self.open = false;
        self.tiles.clear();
    }

    /// Adds a tile; adding one that is already present changes nothing.
    pub fn accept(&mut self, tile: Tile) -> bool {
        if self.contains(tile.id) {
            return false;
        }
        self.tiles.push(tile);
        true
    }

    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.remove(index))
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.iter().any(|t| t.id == id)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.iter().map(|t| t.id)
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn letters(&self) -> Vec<String> {
        self.tiles.iter().map(|t| t.letter.clone()).collect()
    }
}

//! Drag-and-drop moves between the rack, the board and the exchange basket.
//!
//! Every tile in hand belongs to the rack's ordering. A tile is "withdrawn"
//! while it is placed on the board or sitting in the basket, and the rack
//! shows an empty slot in its place. The overlay and basket are therefore
//! always disjoint from the tiles the rack displays.

use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::game::basket::ExchangeBasket;
use crate::game::board::Coord;
use crate::game::overlay::PlacementOverlay;
use crate::game::rack::Rack;
use crate::game::tile::{is_blank, Tile, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    Tile,
}

/// Where a dragged tile currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Container {
    Rack { index: usize },
    Board { coord: Coord },
    Basket,
}

/// Payload carried by a dragged tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragPayload {
    pub kind: DragKind,
    pub id: TileId,
    pub letter: String,
    pub height: usize,
    pub source: Container,
}

/// Why a drop was refused. Refusals are local and never shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("tile {0} is not in hand")]
    UnknownTile(TileId),
    #[error("square {0} is off the board")]
    OutOfBounds(Coord),
    #[error("square {0} already has a tile this turn")]
    CellOccupied(Coord),
    #[error("stack at {0} is at its maximum height")]
    StackFull(Coord),
    #[error("tile {0} is set aside for exchange")]
    InExchange(TileId),
    #[error("tile {0} is placed on the board")]
    OnBoard(TileId),
    #[error("exchange is not open")]
    ExchangeClosed,
    #[error("tile {0} cannot be played as that letter")]
    LetterMismatch(TileId),
}

/// Which containers a drop touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropOutcome {
    pub rack_reordered: bool,
    pub placements_changed: bool,
    pub basket_changed: bool,
}

impl DropOutcome {
    pub fn is_noop(&self) -> bool {
        *self == DropOutcome::default()
    }
}

/// A container that tiles can be dropped on.
pub trait DropTarget {
    fn accepts(&self) -> DragKind {
        DragKind::Tile
    }

    /// Drop predicate over the current state of the destination.
    fn check(&self, hand: &Hand, payload: &DragPayload) -> Result<(), Rejection>;

    /// Moves the tile out of wherever it is and into this container.
    fn accept(&self, hand: &mut Hand, payload: &DragPayload) -> Result<DropOutcome, Rejection>;

    fn can_accept(&self, hand: &Hand, payload: &DragPayload) -> bool {
        payload.kind == self.accepts() && self.check(hand, payload).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RackSlot {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardCell {
    pub coord: Coord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Basket;

impl DropTarget for RackSlot {
    fn check(&self, hand: &Hand, payload: &DragPayload) -> Result<(), Rejection> {
        hand.known(payload.id).map(|_| ())
    }

    fn accept(&self, hand: &mut Hand, payload: &DragPayload) -> Result<DropOutcome, Rejection> {
        self.check(hand, payload)?;
        let (placements_changed, basket_changed) = hand.withdraw(payload.id);
        let rack_reordered = hand.rack.move_tile(payload.id, self.index);
        Ok(DropOutcome {
            rack_reordered,
            placements_changed,
            basket_changed,
        })
    }
}

impl DropTarget for BoardCell {
    fn check(&self, hand: &Hand, payload: &DragPayload) -> Result<(), Rejection> {
        hand.known(payload.id)?;
        if hand.basket.contains(payload.id) {
            return Err(Rejection::InExchange(payload.id));
        }
        hand.overlay.check_cell(self.coord)
    }

    fn accept(&self, hand: &mut Hand, payload: &DragPayload) -> Result<DropOutcome, Rejection> {
        hand.place(&payload.letter, payload.id, self.coord)?;
        Ok(DropOutcome {
            placements_changed: true,
            ..DropOutcome::default()
        })
    }
}

impl DropTarget for Basket {
    fn check(&self, hand: &Hand, payload: &DragPayload) -> Result<(), Rejection> {
        hand.known(payload.id)?;
        if !hand.basket.is_open() {
            return Err(Rejection::ExchangeClosed);
        }
        if hand.overlay.contains(payload.id) {
            return Err(Rejection::OnBoard(payload.id));
        }
        Ok(())
    }

    fn accept(&self, hand: &mut Hand, payload: &DragPayload) -> Result<DropOutcome, Rejection> {
        self.check(hand, payload)?;
        let tile = hand.known(payload.id)?.clone();
        Ok(DropOutcome {
            basket_changed: hand.basket.accept(tile),
            ..DropOutcome::default()
        })
    }
}

/// A blank (`-`) may be played as `-` or assigned one letter (`-E`). Any
/// other tile plays as exactly its own letter.
fn letter_fits(held: &str, letter: &str) -> bool {
    if held == letter {
        return true;
    }
    is_blank(held) && is_blank(letter) && letter.chars().count() == 2
}

/// The three containers of tiles in hand.
#[derive(Debug, Clone)]
pub struct Hand {
    pub(crate) rack: Rack,
    pub(crate) overlay: PlacementOverlay,
    pub(crate) basket: ExchangeBasket,
}

impl Hand {
    pub fn new(rack: Rack, overlay: PlacementOverlay) -> Self {
        Self {
            rack,
            overlay,
            basket: ExchangeBasket::new(),
        }
    }

    pub fn rack(&self) -> &Rack {
        &self.rack
    }

    pub fn overlay(&self) -> &PlacementOverlay {
        &self.overlay
    }

    pub fn basket(&self) -> &ExchangeBasket {
        &self.basket
    }

    pub fn basket_mut(&mut self) -> &mut ExchangeBasket {
        &mut self.basket
    }

    fn known(&self, id: TileId) -> Result<&Tile, Rejection> {
        self.rack.get(id).ok_or(Rejection::UnknownTile(id))
    }

    /// Ids withdrawn from the rack display: the union of the overlay and
    /// the basket.
    pub fn withdrawn_ids(&self) -> HashSet<TileId> {
        self.overlay.ids().chain(self.basket.ids()).collect()
    }

    pub fn has_withdrawn(&self) -> bool {
        !self.overlay.is_empty() || !self.basket.is_empty()
    }

    /// Rack slots as displayed, with withdrawn tiles shown as gaps.
    pub fn rack_view(&self) -> Vec<Option<&Tile>> {
        let withdrawn = self.withdrawn_ids();
        self.rack
            .slots()
            .iter()
            .map(|slot| slot.as_ref().filter(|t| !withdrawn.contains(&t.id)))
            .collect()
    }

    /// Ids the rack currently displays.
    pub fn rack_ids(&self) -> HashSet<TileId> {
        let withdrawn = self.withdrawn_ids();
        self.rack.ids().filter(|id| !withdrawn.contains(id)).collect()
    }

    pub fn source_of(&self, id: TileId) -> Option<Container> {
        if let Some(placement) = self.overlay.placement_of(id) {
            return Some(Container::Board {
                coord: placement.coord,
            });
        }
        if self.basket.contains(id) {
            return Some(Container::Basket);
        }
        self.rack
            .position(id)
            .map(|index| Container::Rack { index })
    }

    /// Builds the drag payload for picking up tile `id`. Tiles on the board
    /// carry their own letter rather than the merged stack.
    pub fn payload(&self, id: TileId) -> Option<DragPayload> {
        let source = self.source_of(id)?;
        let tile = match source {
            Container::Board { .. } => &self.overlay.placement_of(id)?.tile,
            Container::Basket => self.basket.get(id)?,
            Container::Rack { .. } => self.rack.get(id)?,
        };
        Some(DragPayload {
            kind: DragKind::Tile,
            id,
            letter: tile.letter.clone(),
            height: tile.height,
            source,
        })
    }

    /// Places tile `id` on the board as `letter`. The tile must be in hand
    /// and `letter` must be its own letter, or an assignment when it is a
    /// blank. Refused while the tile is in the exchange basket.
    pub fn place(&mut self, letter: &str, id: TileId, coord: Coord) -> Result<(), Rejection> {
        let held = self.known(id)?;
        if !letter_fits(&held.letter, letter) {
            debug!(tile_id = id, held = %held.letter, letter, "Refusing letter that does not match the tile");
            return Err(Rejection::LetterMismatch(id));
        }
        if self.basket.contains(id) {
            debug!(tile_id = id, %coord, "Refusing to place a tile set aside for exchange");
            return Err(Rejection::InExchange(id));
        }
        self.overlay.place(Tile::new(id, letter), coord)
    }

    /// Takes `id` off the board and out of the basket. Returns which of the
    /// two it was removed from.
    fn withdraw(&mut self, id: TileId) -> (bool, bool) {
        let placed = self.overlay.remove(id).is_some();
        let exchanged = self.basket.remove(id).is_some();
        (placed, exchanged)
    }

    pub fn return_to_rack(&mut self, id: TileId) -> DropOutcome {
        let (placements_changed, basket_changed) = self.withdraw(id);
        DropOutcome {
            placements_changed,
            basket_changed,
            ..DropOutcome::default()
        }
    }

    pub fn return_all_to_rack(&mut self) -> DropOutcome {
        let outcome = DropOutcome {
            placements_changed: !self.overlay.is_empty(),
            basket_changed: !self.basket.is_empty(),
            ..DropOutcome::default()
        };
        self.overlay.clear();
        self.basket.clear();
        outcome
    }

    pub fn drop_on<T: DropTarget + ?Sized>(
        &mut self,
        target: &T,
        payload: &DragPayload,
    ) -> Result<DropOutcome, Rejection> {
        target.accept(self, payload)
    }

    /// Swap-ahead preview while dragging over a rack slot.
    pub fn hover_rack(&mut self, dragged: TileId, index: usize) -> bool {
        self.rack.hover(dragged, index)
    }

    /// Shuffling only applies to a full rack.
    pub fn can_shuffle(&self) -> bool {
        !self.has_withdrawn()
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.can_shuffle() {
            debug!("Shuffle skipped while tiles are withdrawn");
            return false;
        }
        self.rack.shuffle(rng);
        true
    }
}

pub mod basket;
pub mod board;
pub mod overlay;
pub mod rack;
pub mod scoring;
pub mod tile;
pub mod transfer;

pub use basket::ExchangeBasket;
pub use board::{Board, Coord, Multiplier, Variant};
pub use overlay::{CellTile, CellView, Placement, PlacementOverlay};
pub use rack::{Rack, RackTile, RACK_CAPACITY};
pub use scoring::Scorer;
pub use tile::{Tile, TileId};
pub use transfer::{
    Basket, BoardCell, Container, DragKind, DragPayload, DropOutcome, DropTarget, Hand, RackSlot,
    Rejection,
};

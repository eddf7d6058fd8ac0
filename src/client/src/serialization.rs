use crate::game::{ExchangeBasket, Placement, PlacementOverlay};
use crate::http_api::{PlayedTile, TurnAction, TurnRequest};

impl From<&Placement> for PlayedTile {
    fn from(placement: &Placement) -> Self {
        Self {
            x: placement.coord.x,
            y: placement.coord.y,
            tile: placement.tile.letter.clone(),
        }
    }
}

/// Provisional placements in the order they were made.
pub fn serialize_played_tiles(overlay: &PlacementOverlay) -> Vec<PlayedTile> {
    overlay.placements().iter().map(PlayedTile::from).collect()
}

pub fn serialize_exchanged_tiles(basket: &ExchangeBasket) -> Vec<String> {
    basket.letters()
}

/// Builds the body for a turn submission, fresh from current state.
pub fn turn_request(
    action: TurnAction,
    overlay: &PlacementOverlay,
    basket: &ExchangeBasket,
) -> TurnRequest {
    match action {
        TurnAction::Play => TurnRequest::play(serialize_played_tiles(overlay)),
        TurnAction::Exchange => TurnRequest::exchange(serialize_exchanged_tiles(basket)),
        TurnAction::Pass => TurnRequest::pass(),
    }
}

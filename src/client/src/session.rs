//! Turn orchestration for one mounted game page.
//!
//! All state mutations happen synchronously on the caller's event loop. The
//! three network calls run as spawned tasks (score preview, rack save) or as
//! awaited futures (turn submission, undo); preview results come back as
//! [`SessionEvent`]s that the host feeds into [`GameSession::handle_event`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::debounce::Debouncer;
use crate::error::{GameError, Result};
use crate::game::{
    Basket, Board, BoardCell, CellView, Coord, DropOutcome, DropTarget, Hand, PlacementOverlay,
    Rack, RackSlot, RackTile, Rejection, Tile, TileId, Variant,
};
use crate::http_api::{
    Endpoints, GameApi, HttpGameApi, Redirect, ScoreResponse, TurnAction, TurnRequest,
};
use crate::serialization::{serialize_played_tiles, turn_request};

/// Everything the hosting page hands over at mount time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountProps {
    pub board: Vec<Vec<Option<String>>>,
    pub rack: Vec<RackTile>,
    #[serde(default)]
    pub board_config: Option<Vec<Vec<Option<String>>>>,
    pub score_url: String,
    pub turn_url: String,
    #[serde(default)]
    pub update_rack_url: Option<String>,
    pub game_id: String,
    #[serde(default)]
    pub in_turn: bool,
    #[serde(default)]
    pub can_undo: bool,
    #[serde(default)]
    pub undo_turn_url: Option<String>,
    pub csrf_token: String,
    #[serde(default)]
    pub enforce_word_validation: bool,
    #[serde(default)]
    pub stack_height: Option<usize>,
}

impl MountProps {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Board variant named by `gameId`; unknown ids get the flat board.
    pub fn variant(&self) -> Variant {
        Variant::from_game_id(&self.game_id).unwrap_or_else(|| {
            warn!(game_id = %self.game_id, "Unknown game id, using flat board rules");
            Variant::Scrabble
        })
    }

    pub fn max_stack_height(&self) -> usize {
        self.stack_height
            .unwrap_or_else(|| self.variant().default_stack_height())
            .max(1)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            score_url: self.score_url.clone(),
            turn_url: self.turn_url.clone(),
            update_rack_url: self.update_rack_url.clone(),
            undo_turn_url: self.undo_turn_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Nothing placed, nothing outstanding.
    Idle,
    /// A preview is shown but the play cannot be submitted.
    Previewing,
    AwaitingScore,
    ReadyToSubmit,
    Submitting,
    Error,
    /// A turn was committed and the page is navigating away.
    Finished,
}

/// Last applied score preview. Never authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScorePreview {
    pub points: i32,
    pub invalid_words: Vec<String>,
    pub processing: bool,
}

/// Status badges derived from the preview and error state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badges {
    pub points: Option<i32>,
    pub validation_error: Option<String>,
    pub word_error: Option<String>,
    /// Render badges muted while a slow preview is outstanding.
    pub processing: bool,
}

#[derive(Debug)]
pub enum SessionEvent {
    /// The preview for `generation` has been outstanding past the
    /// processing delay.
    PreviewProcessing { generation: u64 },
    PreviewReady {
        generation: u64,
        result: Result<ScoreResponse>,
    },
}

pub struct GameSession {
    config: SessionConfig,
    variant: Variant,
    hand: Hand,
    api: Arc<dyn GameApi>,
    events: mpsc::UnboundedSender<SessionEvent>,
    in_turn: bool,
    can_undo: bool,
    enforce_word_validation: bool,
    preview: ScorePreview,
    validation_error: Option<String>,
    /// Message from a refused submission or undo. Shown, but the arrangement
    /// stays playable.
    submit_error: Option<String>,
    generation: u64,
    pending_generation: Option<u64>,
    submitting: bool,
    rack_saver: Debouncer,
    redirect: Option<Redirect>,
}

impl GameSession {
    /// Mounts a session talking to the endpoints in `props` over HTTP.
    pub fn connect(
        props: MountProps,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let endpoints = props.endpoints().resolve(config.base_url.as_ref())?;
        let api = HttpGameApi::new(
            endpoints,
            props.csrf_token.clone(),
            config.request_timeout,
        )?;
        Ok(Self::mount(props, config, Arc::new(api)))
    }

    pub fn mount(
        props: MountProps,
        config: SessionConfig,
        api: Arc<dyn GameApi>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let variant = props.variant();
        let stack_height = props.max_stack_height();
        let rack = Rack::with_capacity(props.rack, config.rack_capacity);
        let board = Board::new(props.board, props.board_config);
        let hand = Hand::new(rack, PlacementOverlay::new(board, stack_height));
        let (events, receiver) = mpsc::unbounded_channel();

        info!(
            game_id = %props.game_id,
            tiles = hand.rack().tiles().count(),
            stack_height,
            in_turn = props.in_turn,
            "Mounted game session"
        );

        let session = Self {
            rack_saver: Debouncer::new(config.rack_save_delay),
            config,
            variant,
            hand,
            api,
            events,
            in_turn: props.in_turn,
            can_undo: props.can_undo,
            enforce_word_validation: props.enforce_word_validation,
            preview: ScorePreview::default(),
            validation_error: None,
            submit_error: None,
            generation: 0,
            pending_generation: None,
            submitting: false,
            redirect: None,
        };
        (session, receiver)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn in_turn(&self) -> bool {
        self.in_turn
    }

    pub fn can_undo(&self) -> bool {
        self.can_undo && !self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.redirect.is_some()
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    pub fn preview(&self) -> &ScorePreview {
        &self.preview
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Generation of the most recent preview request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_generation(&self) -> Option<u64> {
        self.pending_generation
    }

    pub fn rack_view(&self) -> Vec<Option<&Tile>> {
        self.hand.rack_view()
    }

    pub fn board_rows(&self) -> Vec<Vec<CellView>> {
        self.hand.overlay().rows()
    }

    pub fn cell(&self, coord: Coord) -> CellView {
        self.hand.overlay().cell(coord)
    }

    pub fn basket_tiles(&self) -> &[Tile] {
        self.hand.basket().tiles()
    }

    pub fn is_exchanging(&self) -> bool {
        self.hand.basket().is_open()
    }

    pub fn state(&self) -> TurnState {
        if self.is_closed() {
            TurnState::Finished
        } else if self.submitting {
            TurnState::Submitting
        } else if self.validation_error.is_some() {
            TurnState::Error
        } else if self.pending_generation.is_some() {
            TurnState::AwaitingScore
        } else if self.hand.overlay().is_empty() {
            TurnState::Idle
        } else if self.can_play() {
            TurnState::ReadyToSubmit
        } else {
            TurnState::Previewing
        }
    }

    fn word_error(&self) -> Option<String> {
        if self.preview.invalid_words.is_empty() {
            return None;
        }
        Some(format!(
            "Invalid words: {}",
            self.preview.invalid_words.join(", ")
        ))
    }

    fn play_blocker(&self) -> Option<&'static str> {
        if self.is_closed() {
            Some("turn already submitted")
        } else if !self.in_turn {
            Some("not your turn")
        } else if self.submitting {
            Some("a turn is being submitted")
        } else if self.validation_error.is_some() {
            Some("the play has a validation error")
        } else if self.hand.overlay().is_empty() {
            Some("no tiles placed")
        } else if self.enforce_word_validation && !self.preview.invalid_words.is_empty() {
            Some("the play forms invalid words")
        } else {
            None
        }
    }

    pub fn can_play(&self) -> bool {
        self.play_blocker().is_none()
    }

    pub fn badges(&self) -> Badges {
        let word_error = self.word_error();
        let points = match (&self.validation_error, &word_error) {
            (Some(_), _) => None,
            (None, Some(_)) if self.enforce_word_validation => None,
            _ => Some(self.preview.points),
        };
        Badges {
            points,
            validation_error: self
                .validation_error
                .clone()
                .or_else(|| self.submit_error.clone()),
            word_error,
            processing: self.preview.processing || self.submitting,
        }
    }

    pub fn dismiss_error(&mut self) {
        self.validation_error = None;
        self.submit_error = None;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(GameError::SessionClosed);
        }
        Ok(())
    }

    /// Drops tile `id` on `target`.
    pub fn drop_on<T: DropTarget + ?Sized>(&mut self, target: &T, id: TileId) -> Result<DropOutcome> {
        self.ensure_open()?;
        let payload = self.hand.payload(id).ok_or(Rejection::UnknownTile(id))?;
        let outcome = self.hand.drop_on(target, &payload).map_err(|rejection| {
            debug!(tile_id = id, %rejection, "Drop rejected");
            rejection
        })?;
        self.apply(outcome);
        Ok(outcome)
    }

    pub fn move_tile(&mut self, id: TileId, index: usize) -> Result<DropOutcome> {
        self.drop_on(&RackSlot { index }, id)
    }

    pub fn place_tile(&mut self, id: TileId, coord: Coord) -> Result<DropOutcome> {
        self.drop_on(&BoardCell { coord }, id)
    }

    pub fn exchange_tile(&mut self, id: TileId) -> Result<DropOutcome> {
        self.drop_on(&Basket, id)
    }

    /// Places a tile by letter, as dropped from outside the rack's own
    /// drag payload.
    pub fn place(&mut self, letter: &str, id: TileId, coord: Coord) -> Result<()> {
        self.ensure_open()?;
        self.hand.place(letter, id, coord)?;
        self.apply(DropOutcome {
            placements_changed: true,
            ..DropOutcome::default()
        });
        Ok(())
    }

    pub fn hover_rack(&mut self, id: TileId, index: usize) -> bool {
        if self.is_closed() || !self.hand.hover_rack(id, index) {
            return false;
        }
        self.schedule_rack_save();
        true
    }

    pub fn return_to_rack(&mut self, id: TileId) -> DropOutcome {
        if self.is_closed() {
            return DropOutcome::default();
        }
        let outcome = self.hand.return_to_rack(id);
        self.apply(outcome);
        outcome
    }

    pub fn return_all_to_rack(&mut self) -> DropOutcome {
        if self.is_closed() {
            return DropOutcome::default();
        }
        let outcome = self.hand.return_all_to_rack();
        self.apply(outcome);
        outcome
    }

    pub fn can_shuffle(&self) -> bool {
        !self.is_closed() && self.hand.can_shuffle()
    }

    pub fn shuffle(&mut self) -> bool {
        let mut rng = rand::thread_rng();
        self.shuffle_with(&mut rng)
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_closed() || !self.hand.shuffle(rng) {
            return false;
        }
        self.schedule_rack_save();
        true
    }

    pub fn open_exchange(&mut self) {
        if !self.is_closed() {
            self.hand.basket_mut().open();
        }
    }

    /// Closes the exchange box; its tiles reappear in the rack.
    pub fn cancel_exchange(&mut self) {
        self.hand.basket_mut().cancel();
    }

    fn apply(&mut self, outcome: DropOutcome) {
        if outcome.rack_reordered {
            self.schedule_rack_save();
        }
        if outcome.placements_changed {
            self.request_preview();
        }
    }

    fn schedule_rack_save(&mut self) {
        let letters = self.hand.rack().letters();
        let api = self.api.clone();
        self.rack_saver.schedule(async move {
            match api.update_rack(&letters).await {
                Ok(()) => debug!(tiles = letters.len(), "Saved rack order"),
                Err(err) => warn!(error = %err, "Failed to save rack order"),
            }
        });
    }

    /// Issues a fresh preview for the current placements. Responses to
    /// older generations are discarded when they arrive.
    fn request_preview(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.preview.processing = false;
        self.submit_error = None;

        if self.hand.overlay().is_empty() {
            self.pending_generation = None;
            self.preview = ScorePreview::default();
            self.validation_error = None;
            return;
        }

        self.pending_generation = Some(generation);
        let request = TurnRequest::play(serialize_played_tiles(self.hand.overlay()));
        let api = self.api.clone();
        let events = self.events.clone();
        let processing_delay = self.config.processing_delay;
        debug!(generation, tiles = self.hand.overlay().len(), "Requesting score preview");

        tokio::spawn(async move {
            let score = api.score(&request);
            tokio::pin!(score);
            let result = tokio::select! {
                result = &mut score => result,
                _ = tokio::time::sleep(processing_delay) => {
                    let _ = events.send(SessionEvent::PreviewProcessing { generation });
                    score.await
                }
            };
            if events
                .send(SessionEvent::PreviewReady { generation, result })
                .is_err()
            {
                debug!(generation, "Session gone, dropping score preview");
            }
        });
    }

    /// Applies a completed background request. Returns whether the event
    /// changed anything.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        if self.is_closed() {
            debug!(?event, "Ignoring event after turn submission");
            return false;
        }
        match event {
            SessionEvent::PreviewProcessing { generation } => {
                if self.pending_generation != Some(generation) {
                    return false;
                }
                self.preview.processing = true;
                true
            }
            SessionEvent::PreviewReady { generation, result } => {
                if self.pending_generation != Some(generation) {
                    debug!(
                        generation,
                        latest = self.generation,
                        "Discarding stale score preview"
                    );
                    return false;
                }
                self.pending_generation = None;
                self.preview.processing = false;
                match result {
                    Ok(response) => {
                        debug!(generation, points = response.points, "Score preview updated");
                        self.preview.points = response.points;
                        self.preview.invalid_words = response.invalid_words;
                        self.validation_error = None;
                    }
                    Err(err) => {
                        debug!(generation, error = %err, "Score preview failed");
                        self.preview.points = 0;
                        self.preview.invalid_words.clear();
                        self.validation_error = Some(err.user_message());
                    }
                }
                true
            }
        }
    }

    /// Checks the action is allowed and builds its payload. Marks the
    /// session as submitting.
    pub fn prepare_turn(&mut self, action: TurnAction) -> Result<TurnRequest> {
        self.ensure_open()?;
        if !self.in_turn {
            return Err(GameError::NotInTurn);
        }
        if self.submitting {
            return Err(GameError::PlayUnavailable("a turn is being submitted"));
        }
        if action == TurnAction::Play {
            if let Some(reason) = self.play_blocker() {
                return Err(GameError::PlayUnavailable(reason));
            }
        }
        let request = turn_request(action, self.hand.overlay(), self.hand.basket());
        self.submitting = true;
        Ok(request)
    }

    /// Records the server's answer to a submission. On failure the
    /// arrangement is kept so the player can fix it and retry.
    pub fn complete_turn(&mut self, action: TurnAction, result: Result<Redirect>) -> Result<Redirect> {
        self.submitting = false;
        match result {
            Ok(redirect) => {
                info!(?action, location = %redirect.location, "Turn submitted");
                if action == TurnAction::Exchange {
                    self.hand.basket_mut().cancel();
                }
                self.close(redirect.clone());
                Ok(redirect)
            }
            Err(err) => {
                warn!(?action, error = %err, "Turn submission failed");
                self.submit_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn submit(&mut self, action: TurnAction) -> Result<Redirect> {
        let request = self.prepare_turn(action)?;
        let result = self.api.submit_turn(&request).await;
        self.complete_turn(action, result)
    }

    pub async fn play(&mut self) -> Result<Redirect> {
        self.submit(TurnAction::Play).await
    }

    pub async fn pass(&mut self) -> Result<Redirect> {
        self.submit(TurnAction::Pass).await
    }

    pub async fn exchange(&mut self) -> Result<Redirect> {
        self.submit(TurnAction::Exchange).await
    }

    /// Reverts the previous committed turn on the server. Independent of
    /// anything placed locally.
    pub async fn undo(&mut self) -> Result<Redirect> {
        self.ensure_open()?;
        if !self.can_undo {
            return Err(GameError::UndoUnavailable);
        }
        match self.api.undo_turn().await {
            Ok(redirect) => {
                info!(location = %redirect.location, "Previous turn undone");
                self.close(redirect.clone());
                Ok(redirect)
            }
            Err(err) => {
                warn!(error = %err, "Undo failed");
                self.submit_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Terminal: the page navigates away. A rack save still waiting would
    /// describe a rack the server has already replaced.
    fn close(&mut self, redirect: Redirect) {
        self.rack_saver.cancel();
        self.pending_generation = None;
        self.redirect = Some(redirect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{scrabble_props, upwords_props, RecordingApi};
    use std::collections::HashSet;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn mount(props: MountProps) -> (GameSession, mpsc::UnboundedReceiver<SessionEvent>, Arc<RecordingApi>) {
        let api = Arc::new(RecordingApi::new());
        let (session, rx) = GameSession::mount(props, SessionConfig::default(), api.clone());
        (session, rx, api)
    }

    /// Feeds events into the session until the latest preview has landed.
    async fn settle(session: &mut GameSession, rx: &mut mpsc::UnboundedReceiver<SessionEvent>) {
        while session.pending_generation().is_some() {
            let event = rx.recv().await.expect("preview task dropped its sender");
            session.handle_event(event);
        }
    }

    fn assert_partition(session: &GameSession) {
        let hand = session.hand();
        let rack = hand.rack_ids();
        let overlay: HashSet<TileId> = hand.overlay().ids().collect();
        let basket: HashSet<TileId> = hand.basket().ids().collect();
        assert!(rack.is_disjoint(&overlay) && rack.is_disjoint(&basket) && overlay.is_disjoint(&basket));
        assert_eq!(rack.len() + overlay.len() + basket.len(), hand.rack().tiles().count());
    }

    #[tokio::test]
    async fn test_play_enabled_once_a_tile_is_placed() {
        let (mut session, mut rx, api) = mount(scrabble_props(&["C", "T"]));
        assert!(!session.can_play());
        assert_eq!(session.state(), TurnState::Idle);

        session.place_tile(0, Coord::new(6, 7)).unwrap();
        assert!(session.can_play());
        assert_eq!(session.state(), TurnState::AwaitingScore);

        settle(&mut session, &mut rx).await;
        assert_eq!(session.state(), TurnState::ReadyToSubmit);
        assert_eq!(session.badges().points, Some(2));
        assert_eq!(
            api.score_requests.lock().unwrap()[0].played_tiles.as_ref().unwrap()[0].tile,
            "C"
        );
        assert_partition(&session);
    }

    #[tokio::test]
    async fn test_every_change_requests_a_preview() {
        let (mut session, mut rx, api) = mount(scrabble_props(&["C", "T"]));
        session.place_tile(0, Coord::new(6, 7)).unwrap();
        session.place_tile(1, Coord::new(8, 7)).unwrap();
        settle(&mut session, &mut rx).await;
        assert_eq!(session.preview().points, 4);

        session.return_to_rack(1);
        settle(&mut session, &mut rx).await;
        assert_eq!(session.preview().points, 2);

        session.return_all_to_rack();
        assert_eq!(session.pending_generation(), None);
        assert_eq!(session.preview(), &ScorePreview::default());
        assert_eq!(session.state(), TurnState::Idle);
        tokio::task::yield_now().await;
        assert!(api.score_requests.lock().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn test_stale_preview_is_discarded() {
        let (mut session, _rx, _api) = mount(scrabble_props(&["C", "T"]));
        session.place_tile(0, Coord::new(6, 7)).unwrap();
        let first = session.generation();
        session.place_tile(1, Coord::new(8, 7)).unwrap();
        let second = session.generation();

        assert!(session.handle_event(SessionEvent::PreviewReady {
            generation: second,
            result: Ok(ScoreResponse { points: 9, invalid_words: vec![] }),
        }));
        assert!(!session.handle_event(SessionEvent::PreviewReady {
            generation: first,
            result: Ok(ScoreResponse { points: 3, invalid_words: vec![] }),
        }));
        assert_eq!(session.preview().points, 9);
        assert!(!session.handle_event(SessionEvent::PreviewProcessing { generation: first }));
    }

    #[tokio::test]
    async fn test_preview_error_blocks_play() {
        let (mut session, mut rx, api) = mount(scrabble_props(&["C"]));
        *api.score_error.lock().unwrap() = Some("Play must be connected".to_string());
        session.place_tile(0, Coord::new(0, 0)).unwrap();
        settle(&mut session, &mut rx).await;

        assert_eq!(session.state(), TurnState::Error);
        assert!(!session.can_play());
        let badges = session.badges();
        assert_eq!(badges.points, None);
        assert_eq!(badges.validation_error.as_deref(), Some("Play must be connected"));
        assert!(matches!(
            session.prepare_turn(TurnAction::Play),
            Err(GameError::PlayUnavailable(_))
        ));

        session.dismiss_error();
        assert!(session.can_play());
    }

    #[tokio::test]
    async fn test_invalid_words_block_only_when_enforced() {
        let props = MountProps {
            enforce_word_validation: true,
            ..scrabble_props(&["X"])
        };
        let (mut session, mut rx, api) = mount(props);
        *api.invalid_words.lock().unwrap() = vec!["AX".to_string(), "XA".to_string()];
        session.place_tile(0, Coord::new(6, 7)).unwrap();
        settle(&mut session, &mut rx).await;

        assert!(!session.can_play());
        assert_eq!(session.state(), TurnState::Previewing);
        let badges = session.badges();
        assert_eq!(badges.points, None);
        assert_eq!(badges.word_error.as_deref(), Some("Invalid words: AX, XA"));

        let (mut lenient, mut rx, api) = mount(scrabble_props(&["X"]));
        *api.invalid_words.lock().unwrap() = vec!["AX".to_string()];
        lenient.place_tile(0, Coord::new(6, 7)).unwrap();
        settle(&mut lenient, &mut rx).await;
        assert!(lenient.can_play());
        assert_eq!(lenient.badges().points, Some(2));
        assert!(lenient.badges().word_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rack_reorders_are_debounced() {
        let (mut session, _rx, api) = mount(scrabble_props(&["A", "B", "C", "D"]));
        session.move_tile(0, 3).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        session.move_tile(1, 2).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        session.move_tile(2, 3).unwrap();
        assert!(api.rack_saves.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(4)).await;
        let saves = api.rack_saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0], vec!["D", "B", "A", "C"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shuffle_saves_and_is_gated() {
        let (mut session, _rx, api) = mount(scrabble_props(&["A", "B", "C"]));
        session.place_tile(0, Coord::new(6, 7)).unwrap();
        assert!(!session.can_shuffle());
        assert!(!session.shuffle());

        session.return_all_to_rack();
        assert!(session.shuffle());
        assert_eq!(session.rack_view().len(), 8);
        tokio::time::sleep(Duration::from_secs(4)).await;
        let saves = api.rack_saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        let letters: HashSet<&str> = saves[0].iter().map(String::as_str).collect();
        assert_eq!(letters, HashSet::from(["A", "B", "C"]));
    }

    #[tokio::test]
    async fn test_exchange_flow() {
        let (mut session, _rx, api) = mount(scrabble_props(&["Q", "E", "-"]));
        assert!(matches!(
            session.exchange_tile(0),
            Err(GameError::Rejected(Rejection::ExchangeClosed))
        ));

        session.open_exchange();
        session.exchange_tile(0).unwrap();
        session.exchange_tile(2).unwrap();
        assert!(session.rack_view()[0].is_none());
        assert!(matches!(
            session.place_tile(0, Coord::new(6, 7)),
            Err(GameError::Rejected(Rejection::InExchange(0)))
        ));
        assert!(session.hand().overlay().is_empty());
        assert_partition(&session);

        let redirect = session.exchange().await.unwrap();
        assert_eq!(redirect.location, "/games/1");
        assert_eq!(
            api.turn_requests.lock().unwrap()[0],
            TurnRequest::exchange(vec!["Q".to_string(), "-".to_string()])
        );
        assert!(session.basket_tiles().is_empty());
        assert_eq!(session.state(), TurnState::Finished);
    }

    #[tokio::test]
    async fn test_cancel_exchange_returns_tiles() {
        let (mut session, _rx, _api) = mount(scrabble_props(&["Q", "E"]));
        session.open_exchange();
        session.exchange_tile(1).unwrap();
        session.cancel_exchange();
        assert!(!session.is_exchanging());
        assert!(session.rack_view()[1].is_some());
    }

    #[tokio::test]
    async fn test_failed_play_keeps_arrangement() {
        let (mut session, mut rx, api) = mount(scrabble_props(&["C", "T"]));
        *api.turn_error.lock().unwrap() = Some("Play includes non-empty square".to_string());
        session.place_tile(0, Coord::new(6, 7)).unwrap();
        settle(&mut session, &mut rx).await;

        let err = session.play().await.unwrap_err();
        assert_eq!(err.user_message(), "Play includes non-empty square");
        assert_eq!(session.state(), TurnState::ReadyToSubmit);
        assert!(session.can_play());
        assert_eq!(
            session.badges().validation_error.as_deref(),
            Some("Play includes non-empty square")
        );
        assert_eq!(session.hand().overlay().len(), 1);
        assert!(!session.is_closed());

        *api.turn_error.lock().unwrap() = None;
        let redirect = session.play().await.unwrap();
        assert_eq!(redirect.location, "/games/1");
        assert_eq!(
            api.turn_requests.lock().unwrap()[1].played_tiles.as_ref().unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_pass_stays_idle() {
        let (mut session, mut rx, api) = mount(scrabble_props(&["C"]));
        *api.turn_error.lock().unwrap() = Some("Game is over".to_string());
        assert!(session.pass().await.is_err());
        assert_eq!(session.state(), TurnState::Idle);
        assert_eq!(session.submit_error(), Some("Game is over"));

        session.place_tile(0, Coord::new(6, 7)).unwrap();
        assert_eq!(session.submit_error(), None);
        settle(&mut session, &mut rx).await;
        assert_eq!(session.state(), TurnState::ReadyToSubmit);
    }

    #[tokio::test]
    async fn test_submission_closes_session() {
        let (mut session, _rx, _api) = mount(scrabble_props(&["C"]));
        session.pass().await.unwrap();
        assert!(session.is_closed());
        assert!(matches!(
            session.place_tile(0, Coord::new(6, 7)),
            Err(GameError::SessionClosed)
        ));
        assert!(!session.handle_event(SessionEvent::PreviewProcessing { generation: 0 }));
        assert!(matches!(session.pass().await, Err(GameError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_not_in_turn() {
        let props = MountProps {
            in_turn: false,
            ..scrabble_props(&["C"])
        };
        let (mut session, _rx, api) = mount(props);
        assert!(matches!(session.pass().await, Err(GameError::NotInTurn)));
        assert!(api.turn_requests.lock().unwrap().is_empty());

        // Undo does not depend on whose turn it is or what is placed.
        session.undo().await.unwrap();
        assert_eq!(*api.undo_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_undo_requires_permission() {
        let props = MountProps {
            can_undo: false,
            ..scrabble_props(&["C"])
        };
        let (mut session, _rx, api) = mount(props);
        assert!(!session.can_undo());
        tokio_test::block_on(async {
            assert!(matches!(session.undo().await, Err(GameError::UndoUnavailable)));
        });
        assert_eq!(*api.undo_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stacking_session() {
        let (mut session, mut rx, _api) = mount(upwords_props(&["B", "D"]));
        assert_eq!(session.variant(), Variant::Upwords);
        session.place_tile(0, Coord::new(0, 0)).unwrap();
        let cell = session.cell(Coord::new(0, 0));
        let tile = cell.tile.unwrap();
        assert_eq!(tile.letter, "CAB");
        assert_eq!(tile.height, 3);
        assert_eq!(cell.height_indicator, Some(3));

        assert!(matches!(
            session.place_tile(1, Coord::new(0, 0)),
            Err(GameError::Rejected(Rejection::CellOccupied(_)))
        ));
        settle(&mut session, &mut rx).await;
        assert_partition(&session);
    }

    #[tokio::test]
    async fn test_place_by_letter() {
        let (mut session, _rx, _api) = mount(scrabble_props(&["-"]));
        session.place("-E", 0, Coord::new(7, 8)).unwrap();
        let cell = session.cell(Coord::new(7, 8)).tile.unwrap();
        assert_eq!(cell.top, "E");
    }

    #[tokio::test]
    async fn test_place_rejects_tiles_not_in_hand() {
        let (mut session, _rx, api) = mount(scrabble_props(&["C", "T"]));
        assert!(matches!(
            session.place("Z", 99, Coord::new(6, 7)),
            Err(GameError::Rejected(Rejection::UnknownTile(99)))
        ));
        assert!(matches!(
            session.place("Q", 0, Coord::new(6, 7)),
            Err(GameError::Rejected(Rejection::LetterMismatch(0)))
        ));
        assert!(session.hand().overlay().is_empty());
        assert!(!session.can_play());
        assert_eq!(session.pending_generation(), None);
        assert!(api.score_requests.lock().unwrap().is_empty());
        assert_partition(&session);
    }

    #[test]
    fn test_props_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "board": [["", "CA"], [null, ""]],
                "rack": [{{"letter": "A", "points": 1}}, {{"letter": "-"}}],
                "boardConfig": [["tw", null], [null, "start"]],
                "scoreUrl": "/score",
                "turnUrl": "/turn",
                "gameId": "upwords",
                "inTurn": true,
                "csrfToken": "abc",
                "enforceWordValidation": true
            }}"#
        )
        .unwrap();
        file.flush().unwrap();

        let props = MountProps::from_json_file(file.path()).unwrap();
        assert_eq!(props.variant(), Variant::Upwords);
        assert_eq!(props.max_stack_height(), 5);
        assert_eq!(props.rack.len(), 2);
        assert!(!props.can_undo);
        assert_eq!(props.endpoints().update_rack_url, None);
    }

    #[test]
    fn test_unknown_game_id_uses_flat_rules() {
        let props = MountProps {
            game_id: "mystery".to_string(),
            ..scrabble_props(&[])
        };
        assert_eq!(props.variant(), Variant::Scrabble);
        assert_eq!(props.max_stack_height(), 1);
    }
}

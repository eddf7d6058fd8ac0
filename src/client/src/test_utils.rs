use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{GameError, Result};
use crate::game::RackTile;
use crate::http_api::{GameApi, Redirect, ScoreResponse, TurnRequest};
use crate::session::MountProps;

/// In-memory `GameApi` that records every call.
#[derive(Default)]
pub struct RecordingApi {
    pub score_requests: Mutex<Vec<TurnRequest>>,
    pub turn_requests: Mutex<Vec<TurnRequest>>,
    pub rack_saves: Mutex<Vec<Vec<String>>>,
    pub undo_calls: Mutex<usize>,
    /// Invalid words reported by every score response.
    pub invalid_words: Mutex<Vec<String>>,
    /// When set, score requests fail with this message.
    pub score_error: Mutex<Option<String>>,
    /// When set, turn submissions fail with this message.
    pub turn_error: Mutex<Option<String>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn remote(message: &str) -> GameError {
        GameError::Remote {
            status: 400,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl GameApi for RecordingApi {
    async fn score(&self, request: &TurnRequest) -> Result<ScoreResponse> {
        self.score_requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.score_error.lock().unwrap().as_deref() {
            return Err(Self::remote(message));
        }
        let tiles = request.played_tiles.as_ref().map_or(0, Vec::len);
        Ok(ScoreResponse {
            points: tiles as i32 * 2,
            invalid_words: self.invalid_words.lock().unwrap().clone(),
        })
    }

    async fn submit_turn(&self, request: &TurnRequest) -> Result<Redirect> {
        self.turn_requests.lock().unwrap().push(request.clone());
        if let Some(message) = self.turn_error.lock().unwrap().as_deref() {
            return Err(Self::remote(message));
        }
        Ok(Redirect {
            location: "/games/1".to_string(),
        })
    }

    async fn update_rack(&self, letters: &[String]) -> Result<()> {
        self.rack_saves.lock().unwrap().push(letters.to_vec());
        Ok(())
    }

    async fn undo_turn(&self) -> Result<Redirect> {
        *self.undo_calls.lock().unwrap() += 1;
        Ok(Redirect {
            location: "/games/1".to_string(),
        })
    }
}

/// Props for a 15x15 board with a single permanent letter at the centre.
pub fn scrabble_props(letters: &[&str]) -> MountProps {
    let mut board = vec![vec![None; 15]; 15];
    board[7][7] = Some("A".to_string());
    MountProps {
        board,
        rack: letters.iter().map(|l| RackTile::new(*l)).collect(),
        board_config: None,
        score_url: "http://localhost/score".to_string(),
        turn_url: "http://localhost/turn".to_string(),
        update_rack_url: Some("http://localhost/rack".to_string()),
        game_id: "scrabble".to_string(),
        in_turn: true,
        can_undo: true,
        undo_turn_url: Some("http://localhost/undo".to_string()),
        csrf_token: "token".to_string(),
        enforce_word_validation: false,
        stack_height: None,
    }
}

/// Props for a 10x10 stacking board with `"CA"` at (0, 0).
pub fn upwords_props(letters: &[&str]) -> MountProps {
    let mut board = vec![vec![None; 10]; 10];
    board[0][0] = Some("CA".to_string());
    MountProps {
        game_id: "upwords".to_string(),
        board,
        stack_height: Some(5),
        ..scrabble_props(letters)
    }
}

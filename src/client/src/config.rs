use std::env;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::game::RACK_CAPACITY;

/// Timing and sizing knobs for a game session. Endpoints and the
/// anti-forgery token are not here; they come with the mount props.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Quiet period before a reordered rack is saved.
    pub rack_save_delay: Duration,
    /// How long a score preview may be outstanding before the preview is
    /// flagged as processing.
    pub processing_delay: Duration,
    pub request_timeout: Duration,
    pub rack_capacity: usize,
    /// Origin that relative endpoint paths are resolved against.
    pub base_url: Option<Url>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rack_save_delay: Duration::from_secs(3),
            processing_delay: Duration::from_millis(300),
            request_timeout: Duration::from_secs(30),
            rack_capacity: RACK_CAPACITY,
            base_url: None,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(delay) = env::var("RACK_SAVE_DELAY_MS") {
            if let Ok(millis) = delay.parse::<u64>() {
                config.rack_save_delay = Duration::from_millis(millis);
            }
        }

        if let Ok(delay) = env::var("PROCESSING_DELAY_MS") {
            if let Ok(millis) = delay.parse::<u64>() {
                config.processing_delay = Duration::from_millis(millis);
            }
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.request_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(capacity) = env::var("RACK_CAPACITY") {
            if let Ok(value) = capacity.parse::<usize>() {
                config.rack_capacity = value;
            }
        }

        if let Ok(base) = env::var("GAME_BASE_URL") {
            match Url::parse(&base) {
                Ok(url) => config.base_url = Some(url),
                Err(e) => warn!(base = %base, error = %e, "Ignoring invalid GAME_BASE_URL"),
            }
        }

        config
    }
}

pub mod config;
pub mod debounce;
pub mod error;
pub mod game;
pub mod http_api;
pub mod serialization;
pub mod session;

#[cfg(test)]
mod test_utils;

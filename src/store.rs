//! Keyed persistence of game states.
//!
//! States are stored as JSON strings so that a store backed by a remote cache
//! holds exactly what the in-memory one does. Optional fields that are unset
//! stay absent in the encoding.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::trace;

use crate::error::StoreError;
use crate::game::GameState;

pub fn to_json(state: &GameState) -> Result<String, StoreError> {
    serde_json::to_string(state).map_err(StoreError::Encode)
}

pub fn from_json(text: &str) -> Result<GameState, StoreError> {
    serde_json::from_str(text).map_err(StoreError::Decode)
}

/// A key-value store of game states with optional expiry.
pub trait GameStore {
    /// The state saved under `id`, or `None` if absent or expired.
    fn get(&self, id: &str) -> Result<Option<GameState>, StoreError>;

    /// Save `state` under `id`, replacing any previous value.
    fn set(&mut self, id: &str, state: &GameState, ttl: Option<Duration>) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, (String, Option<Instant>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries.
    pub fn purge(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, expires)| expires.is_none_or(|t| t > now));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GameStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<GameState>, StoreError> {
        match self.entries.get(id) {
            Some((_, Some(expires))) if *expires <= Instant::now() => Ok(None),
            Some((text, _)) => from_json(text).map(Some),
            None => Ok(None),
        }
    }

    fn set(&mut self, id: &str, state: &GameState, ttl: Option<Duration>) -> Result<(), StoreError> {
        let text = to_json(state)?;
        trace!("storing {id} ({} bytes)", text.len());
        let expires = ttl.map(|d| Instant::now() + d);
        self.entries.insert(id.to_string(), (text, expires));
        Ok(())
    }
}

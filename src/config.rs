//! Game and AI configuration.
//!
//! Every field has a default so a partial JSON file (or none at all) yields a
//! playable setup. The CLI applies its own flags on top.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::Ability;
use crate::constants::{
    DEFAULT_BOARD_SIZE, DEFAULT_MAX_REINFORCEMENTS, DEFAULT_MIN_REINFORCEMENTS, MAX_BOARD_SIZE,
    MIN_BOARD_SIZE,
};
use crate::error::ConfigError;
use crate::game::Inventory;

/// AI strength tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    #[default]
    Hard,
    Expert,
    Impossible,
}

impl Difficulty {
    /// Nominal search depth before board-size caps.
    pub fn depth(self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert | Difficulty::Impossible => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_board_size")]
    pub board_size: usize,
    #[serde(default = "default_min_reinforcements")]
    pub min_reinforcements: usize,
    #[serde(default = "default_max_reinforcements")]
    pub max_reinforcements: usize,
    #[serde(default = "default_inventory")]
    pub attacker_inventory: Inventory,
    #[serde(default = "default_inventory")]
    pub defender_inventory: Inventory,
    /// Attacker turns after which a surviving resistance wins. AI games only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_limit: Option<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Let the rule-based behavior tree move before falling back to search.
    #[serde(default = "default_behavior_tree")]
    pub behavior_tree: bool,
}

fn default_board_size() -> usize {
    DEFAULT_BOARD_SIZE
}
fn default_min_reinforcements() -> usize {
    DEFAULT_MIN_REINFORCEMENTS
}
fn default_max_reinforcements() -> usize {
    DEFAULT_MAX_REINFORCEMENTS
}
fn default_inventory() -> Inventory {
    Inventory::new(BTreeMap::from([
        (Ability::Viral, 2),
        (Ability::Suppressor, 2),
        (Ability::Beam, 3),
        (Ability::Swap, 2),
    ]))
}
fn default_behavior_tree() -> bool {
    true
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: default_board_size(),
            min_reinforcements: default_min_reinforcements(),
            max_reinforcements: default_max_reinforcements(),
            attacker_inventory: default_inventory(),
            defender_inventory: default_inventory(),
            turn_limit: None,
            difficulty: Difficulty::default(),
            behavior_tree: default_behavior_tree(),
        }
    }
}

impl GameConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(ConfigError::BoardSize(
                self.board_size,
                MIN_BOARD_SIZE,
                MAX_BOARD_SIZE,
            ));
        }
        if self.min_reinforcements == 0 || self.min_reinforcements > self.max_reinforcements {
            return Err(ConfigError::ReinforcementRange(
                self.min_reinforcements,
                self.max_reinforcements,
            ));
        }
        if self.max_reinforcements >= self.board_size * self.board_size {
            return Err(ConfigError::TooManyReinforcements(
                self.max_reinforcements,
                self.board_size,
            ));
        }
        if self.turn_limit == Some(0) {
            return Err(ConfigError::TurnLimit);
        }
        Ok(())
    }
}

//! Error types for move rejection, configuration, and storage.

use thiserror::Error;

use crate::board::{Ability, Point};

/// Why a move, swap, undo, or commit was rejected. The input state is never
/// modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: the game is over")]
    GameOver,
    #[error("illegal move: {0:?} is off the board")]
    OutOfBounds(Point),
    #[error("illegal move: {0:?} is not empty")]
    Occupied(Point),
    #[error("illegal move: {0:?} is void")]
    Voided(Point),
    #[error("illegal move: {0:?} is blocked by residue")]
    ResidueBlocked(Point),
    #[error("illegal move: no {0} stones left")]
    AbilityUnavailable(Ability),
    #[error("illegal move: a stone was already placed this turn")]
    AlreadyPlaced,
    #[error("illegal swap: no swap is pending")]
    NoPendingSwap,
    #[error("illegal swap: {0:?} is not next to the swap stone")]
    SwapOutOfReach(Point),
    #[error("illegal swap: {0:?} has no stone")]
    SwapTargetEmpty(Point),
    #[error("illegal swap: both points are the same")]
    SwapSameCell,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to commit: place a stone first")]
    NothingToCommit,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board size {0} outside supported range {1}..={2}")]
    BoardSize(usize, usize, usize),
    #[error("reinforcement range {0}..={1} is empty or starts at zero")]
    ReinforcementRange(usize, usize),
    #[error("{0} reinforcements do not fit on a {1}x{1} board")]
    TooManyReinforcements(usize, usize),
    #[error("turn limit must be at least 1")]
    TurnLimit,
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot encode game state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("cannot decode game state: {0}")]
    Decode(#[source] serde_json::Error),
}

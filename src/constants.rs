//! Constants for board geometry, rule timings, evaluation weights, and AI parameters.
//!
//! Everything tunable about the engine lives here so the rules, evaluator, and
//! decision code read as plain logic.

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest board size accepted by [`GameConfig::validate`](crate::config::GameConfig::validate).
pub const MIN_BOARD_SIZE: usize = 4;

/// Largest board size accepted by [`GameConfig::validate`](crate::config::GameConfig::validate).
pub const MAX_BOARD_SIZE: usize = 9;

/// Default board size (NxN).
pub const DEFAULT_BOARD_SIZE: usize = 5;

/// Axis directions as (row, column) deltas: North, East, South, West.
pub const DIRECTIONS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

// =============================================================================
// Rule Timings
// =============================================================================

/// Turns a residue mark lives for. A residue created at turn `T` blocks its
/// owner at `T` and `T + 1`.
pub const RESIDUE_LIFETIME: u32 = 2;

/// Minimum number of stones destroyed in one commit to open a void.
pub const VOID_THRESHOLD: usize = 4;

/// Maximum number of in-turn undo snapshots.
pub const MAX_UNDO_HISTORY: usize = 16;

/// Number of committed boards remembered for repetition checks.
pub const REPETITION_WINDOW: usize = 2;

/// Default number of reinforcement stones seeded at game start (inclusive range).
pub const DEFAULT_MIN_REINFORCEMENTS: usize = 1;
pub const DEFAULT_MAX_REINFORCEMENTS: usize = 3;

// =============================================================================
// Evaluation Weights (defender perspective)
// =============================================================================

pub const DEF_STONE: i32 = 15;
pub const DEF_ATARI: i32 = -150;
pub const DEF_TWO_LIBS: i32 = 40;
pub const DEF_SAFE: i32 = 100;
pub const DEF_REINFORCEMENT: i32 = 120;
pub const DEF_VIRAL_GROUP: i32 = 60;

pub const ATT_STONE: i32 = -25;
pub const ATT_CAPTURED: i32 = 400;
pub const ATT_ATARI: i32 = 120;
pub const ATT_SAFE: i32 = -60;

/// Penalty per unit of Manhattan distance from the center for each empty cell.
pub const EMPTY_CENTER_DISTANCE: i32 = -3;

/// Bonus for a suppressor stone, signed by its owner.
pub const SUPPRESSOR_BONUS: i32 = 20;

/// Score of a decided game (no reinforcements left), well outside evaluator range.
pub const WIN_SCORE: i32 = 100_000;

// =============================================================================
// Search Parameters
// =============================================================================

/// Move-ordering bonus for a candidate next to an attacker stone.
pub const ORDER_ATTACKER_ADJ: i32 = 10;

/// Move-ordering bonus for a candidate next to a reinforcement stone.
pub const ORDER_REINFORCEMENT_ADJ: i32 = 20;

/// Depth cap applied on large or open boards.
pub const REDUCED_DEPTH: u32 = 2;

/// Boards of at least this size use [`REDUCED_DEPTH`].
pub const REDUCED_DEPTH_BOARD_SIZE: usize = 6;

/// Positions with more empty cells than this use [`REDUCED_DEPTH`].
pub const REDUCED_DEPTH_EMPTY_CELLS: usize = 20;

/// Penalty for a move that recreates the current position.
pub const REPEAT_PENALTY_LAST: i32 = 1000;

/// Penalty for a move that recreates the position before the current one.
pub const REPEAT_PENALTY_PREVIOUS: i32 = 800;

/// Medium difficulty picks uniformly among this many best candidates.
pub const MEDIUM_POOL: usize = 3;

// =============================================================================
// Behavior Tree
// =============================================================================

/// Behaviors with a priority below this must not play next to an active
/// attacker viral stone.
pub const VIRAL_GUARD_PRIORITY: u32 = 85;

/// Minimum evaluation gain for an opportunistic swap.
pub const SWAP_GAIN_THRESHOLD: i32 = 60;

//! Resistance Go: rules engine and opponent AI for a two-player capture game.
//!
//! An attacker tries to wipe out neutral-aligned reinforcement stones while a
//! defender protects and grows them. On top of Go-style captures, stones may
//! carry abilities: viral (converts adjacent enemy stones), suppressor
//! (neutralizes adjacent enemy abilities), beam (destroys everything on a line
//! closed by another beam), and swap (trades places of adjacent stones).
//!
//! ## Modules
//!
//! - [`board`] - Cells, occupants, abilities, and the grid
//! - [`groups`] - Connected groups and liberties
//! - [`suppression`] - Which abilities are currently neutralized
//! - [`rules`] - Beams, captures, spreading, residue, voids, win detection
//! - [`game`] - Game state and the turn pipeline
//! - [`eval`] - Static evaluation
//! - [`search`] - Minimax with alpha-beta pruning
//! - [`behavior`] - Rule-based defender tactics
//! - [`ai`] - Move selection by difficulty
//! - [`store`] - JSON persistence
//! - [`protocol`] - Text protocol for local play
//!
//! ## Example
//!
//! ```
//! use resistance_go::ai::{AiOptions, decide};
//! use resistance_go::config::GameConfig;
//! use resistance_go::game::{new_game, play_turn};
//!
//! let config = GameConfig::default();
//! let mut rng = fastrand::Rng::with_seed(42);
//! let state = new_game(&config, &mut rng);
//!
//! // Let the AI play the attacker's first turn.
//! let mv = decide(&state, AiOptions::from(&config), &mut rng).unwrap();
//! let next = play_turn(&state, &mv, &mut rng).unwrap();
//! assert_eq!(next.turn_count, 1);
//! println!("{}", next.board);
//! ```

pub mod ai;
pub mod behavior;
pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod eval;
pub mod game;
pub mod groups;
pub mod protocol;
pub mod rng;
pub mod rules;
pub mod search;
pub mod store;
pub mod suppression;

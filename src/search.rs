//! Depth-limited minimax search with alpha-beta pruning.
//!
//! Inside the search every candidate is a plain stone on an empty cell.
//! Ability choice happens once at the root in [`crate::ai::decide`]. Each ply
//! simulates the placement, the mover's captures, and the start of the next
//! side's turn (viral spread, plus territorial spread when the defender is
//! next). Territorial spread picks deterministically here so that the same
//! board always searches to the same score.

use std::cmp::Reverse;

use crate::board::{AbilitySet, Board, Occupant, Point, Side};
use crate::config::Difficulty;
use crate::constants::{
    ORDER_ATTACKER_ADJ, ORDER_REINFORCEMENT_ADJ, REDUCED_DEPTH, REDUCED_DEPTH_BOARD_SIZE,
    REDUCED_DEPTH_EMPTY_CELLS, WIN_SCORE,
};
use crate::eval::evaluate;
use crate::rng::Deterministic;
use crate::rules::{resolve_captures, spread_reinforcement, spread_viral};

/// Search depth for a difficulty tier, capped on big or open boards.
pub fn search_depth(difficulty: Difficulty, board: &Board) -> u32 {
    let depth = difficulty.depth();
    if board.size() >= REDUCED_DEPTH_BOARD_SIZE
        || board.count(Occupant::Empty) > REDUCED_DEPTH_EMPTY_CELLS
    {
        depth.min(REDUCED_DEPTH)
    } else {
        depth
    }
}

/// Cheap static priority for move ordering.
fn order_score(board: &Board, p: Point) -> i32 {
    board
        .neighbors(p)
        .map(|n| match board.get(n).occupant {
            Occupant::Attacker => ORDER_ATTACKER_ADJ,
            Occupant::Resistance => ORDER_REINFORCEMENT_ADJ,
            _ => 0,
        })
        .sum()
}

/// Empty cells, most promising first. Ordering only affects pruning.
pub fn ordered_candidates(board: &Board) -> Vec<Point> {
    let mut candidates = board.empty_points();
    candidates.sort_by_cached_key(|&p| Reverse(order_score(board, p)));
    candidates
}

/// Play a plain stone for `mover` and run the effects the search models.
pub fn simulate_placement(board: &Board, p: Point, mover: Side) -> Board {
    let mut next = board.clone();
    next.place(p, mover.stone(), AbilitySet::EMPTY);
    resolve_captures(&mut next, mover);
    let next_side = mover.opponent();
    spread_viral(&mut next, next_side);
    if next_side == Side::Defender {
        spread_reinforcement(&mut next, &mut Deterministic);
    }
    next
}

/// Alpha-beta searcher that counts the positions it visits.
#[derive(Debug, Default)]
pub struct Searcher {
    pub nodes: u64,
}

impl Searcher {
    /// Minimax value of `board`; the defender maximizes.
    ///
    /// Fail-soft: a result at or below `alpha` is an upper bound on the true
    /// value, one at or above `beta` a lower bound, anything between exact.
    pub fn search(
        &mut self,
        board: &Board,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> i32 {
        self.nodes += 1;
        if board.count(Occupant::Resistance) == 0 {
            return -WIN_SCORE - depth as i32;
        }
        let candidates = ordered_candidates(board);
        if depth == 0 || candidates.is_empty() {
            return evaluate(board);
        }

        let mover = if maximizing {
            Side::Defender
        } else {
            Side::Attacker
        };
        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for p in candidates {
            let child = simulate_placement(board, p, mover);
            let score = self.search(&child, depth - 1, alpha, beta, !maximizing);
            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if beta <= alpha {
                break;
            }
        }
        best
    }
}

/// Minimax value of `board`; the defender maximizes.
///
/// A board without reinforcement stones is a decided attacker win, scored so
/// that quicker wins rank higher for the attacker.
pub fn search(board: &Board, depth: u32, alpha: i32, beta: i32, maximizing: bool) -> i32 {
    Searcher::default().search(board, depth, alpha, beta, maximizing)
}

//! Rule-based tactical layer for the defender.
//!
//! Behaviors are plain data: a name, a priority, a trigger chance, and a pure
//! generator from the game state to an optional move. [`run_behavior_tree`]
//! walks them from the highest priority down, flips each behavior's coin, and
//! returns the first generated move that survives the safety filters. When
//! nothing survives, the caller falls back to search.

use std::cmp::Reverse;
use std::collections::HashSet;

use log::{debug, trace};

use crate::ai::simulate_turn;
use crate::board::{Ability, AbilitySet, Board, Occupant, Point, Side, manhattan};
use crate::constants::{DIRECTIONS, SWAP_GAIN_THRESHOLD, VIRAL_GUARD_PRIORITY};
use crate::eval::evaluate;
use crate::game::{GameState, Move, check_placement, legal_placements};
use crate::groups::{Group, group_of, groups, liberties_at};
use crate::rng::RandomSource;
use crate::rules::{beam_targets, resolve_captures};
use crate::suppression::{is_active, is_suppressed};

const US: Side = Side::Defender;
const THEM: Side = Side::Attacker;

/// Generates a candidate move, or nothing when the behavior does not apply.
pub type Generator = fn(&GameState) -> Option<Move>;

#[derive(Clone, Copy)]
pub struct Behavior {
    pub name: &'static str,
    pub priority: u32,
    /// Probability in `[0, 1]` that the behavior is considered on a given call.
    pub chance: f64,
    pub generate: Generator,
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("chance", &self.chance)
            .finish()
    }
}

/// The defender's behaviors, highest priority first.
pub const BEHAVIORS: &[Behavior] = &[
    Behavior {
        name: "save_reinforcement",
        priority: 100,
        chance: 0.95,
        generate: save_reinforcement,
    },
    Behavior {
        name: "capture_atari",
        priority: 95,
        chance: 0.9,
        generate: capture_atari,
    },
    Behavior {
        name: "avoid_encirclement",
        priority: 90,
        chance: 0.85,
        generate: avoid_encirclement,
    },
    Behavior {
        name: "counter_viral",
        priority: 88,
        chance: 0.7,
        generate: counter_viral,
    },
    Behavior {
        name: "counter_beam",
        priority: 86,
        chance: 0.75,
        generate: counter_beam,
    },
    Behavior {
        name: "counter_suppressor",
        priority: 80,
        chance: 0.7,
        generate: counter_suppressor,
    },
    Behavior {
        name: "expand_reinforcement",
        priority: 70,
        chance: 0.6,
        generate: expand_reinforcement,
    },
    Behavior {
        name: "place_viral",
        priority: 60,
        chance: 0.5,
        generate: place_viral,
    },
    Behavior {
        name: "place_beam",
        priority: 58,
        chance: 0.5,
        generate: place_beam,
    },
    Behavior {
        name: "place_suppressor",
        priority: 55,
        chance: 0.4,
        generate: place_suppressor,
    },
    Behavior {
        name: "place_swap",
        priority: 50,
        chance: 0.3,
        generate: place_swap,
    },
    Behavior {
        name: "positional",
        priority: 20,
        chance: 0.8,
        generate: positional,
    },
    Behavior {
        name: "first_empty",
        priority: 0,
        chance: 1.0,
        generate: first_empty,
    },
];

/// Why a generated move was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotEmpty,
    Illegal,
    IsolatedCrossfire,
    Repetition,
    FeedsViral,
}

/// Run `behaviors` in priority order and return the first surviving move.
pub fn run_behavior_tree(
    state: &GameState,
    behaviors: &[Behavior],
    rng: &mut impl RandomSource,
) -> Option<Move> {
    let mut ordered: Vec<&Behavior> = behaviors.iter().collect();
    ordered.sort_by_key(|b| Reverse(b.priority));
    for behavior in ordered {
        if rng.unit() > behavior.chance {
            continue;
        }
        let Some(mv) = (behavior.generate)(state) else {
            continue;
        };
        match vet(state, behavior, &mv) {
            Ok(()) => {
                debug!("behavior {} chose {mv:?}", behavior.name);
                return Some(mv);
            }
            Err(reason) => trace!("behavior {} move {mv:?} rejected: {reason:?}", behavior.name),
        }
    }
    None
}

/// Hard filters every behavior move must pass.
pub(crate) fn vet(state: &GameState, behavior: &Behavior, mv: &Move) -> Result<(), Rejection> {
    let board = &state.board;
    if !board.in_bounds(mv.point) || !board.get(mv.point).is_empty() {
        return Err(Rejection::NotEmpty);
    }
    if is_isolated(board, mv.point) && in_crossfire(board, mv.point) {
        return Err(Rejection::IsolatedCrossfire);
    }
    let result = simulate_turn(state, mv).ok_or(Rejection::Illegal)?;
    for back in [1, 2] {
        if state
            .previous_board(back)
            .is_some_and(|b| b.same_layout(&result.board))
        {
            return Err(Rejection::Repetition);
        }
    }
    if behavior.priority < VIRAL_GUARD_PRIORITY && next_to_enemy_viral(board, mv.point) {
        return Err(Rejection::FeedsViral);
    }
    Ok(())
}

// =============================================================================
// Shared helpers
// =============================================================================

/// No defender or resistance stone in the eight surrounding cells.
pub fn is_isolated(board: &Board, (r, c): Point) -> bool {
    let size = board.size() as isize;
    for dr in -1..=1isize {
        for dc in -1..=1isize {
            if dr == 0 && dc == 0 {
                continue;
            }
            let (nr, nc) = (r as isize + dr, c as isize + dc);
            if nr < 0 || nc < 0 || nr >= size || nc >= size {
                continue;
            }
            if board.get((nr as usize, nc as usize)).allegiance() == Some(US) {
                return false;
            }
        }
    }
    true
}

/// Walk from `p` along one direction over non-beam stones; return the beam
/// stone that closes the walk, if any.
fn beam_end(board: &Board, p: Point, (dr, dc): (isize, isize)) -> Option<Point> {
    let size = board.size();
    let mut cur = p;
    loop {
        let nr = cur.0.checked_add_signed(dr)?;
        let nc = cur.1.checked_add_signed(dc)?;
        if nr >= size || nc >= size {
            return None;
        }
        cur = (nr, nc);
        let cell = board.get(cur);
        if !cell.occupant.is_stone() {
            return None;
        }
        if cell.has(Ability::Beam) {
            return Some(cur);
        }
    }
}

/// A defender stone on `p` would sit on a closed line between two beams,
/// at least one of them an active attacker beam.
pub fn in_crossfire(board: &Board, p: Point) -> bool {
    let mut after = board.clone();
    after.place(p, US.stone(), AbilitySet::EMPTY);
    [((0, 1), (0, -1)), ((1, 0), (-1, 0))].into_iter().any(|(d1, d2)| {
        match (beam_end(&after, p, d1), beam_end(&after, p, d2)) {
            (Some(a), Some(b)) => [a, b].into_iter().any(|e| {
                after.get(e).allegiance() == Some(THEM) && is_active(&after, e, Ability::Beam)
            }),
            _ => false,
        }
    })
}

/// `p` touches an unsuppressed attacker viral stone.
pub fn next_to_enemy_viral(board: &Board, p: Point) -> bool {
    board
        .neighbors(p)
        .any(|n| board.get(n).allegiance() == Some(THEM) && is_active(board, n, Ability::Viral))
}

fn placeable(state: &GameState, p: Point) -> bool {
    check_placement(state, p, US).is_ok()
}

/// Liberties of our stone on `p` after enemy captures; zero if it would die.
fn libs_after(board: &Board, p: Point) -> usize {
    let mut after = board.clone();
    after.place(p, US.stone(), AbilitySet::EMPTY);
    resolve_captures(&mut after, US);
    liberties_at(&after, p)
}

fn has_ability(state: &GameState, ability: Ability) -> bool {
    state.inventories.get(US).has(ability)
}

fn ours(board: &Board, p: Point) -> bool {
    board.get(p).allegiance() == Some(US)
}

fn theirs(board: &Board, p: Point) -> bool {
    board.get(p).allegiance() == Some(THEM)
}

fn count_adjacent(board: &Board, p: Point, pred: impl Fn(Point) -> bool) -> i32 {
    board.neighbors(p).filter(|&n| pred(n)).count() as i32
}

/// The highest-scoring point, first one on ties.
fn best_point(points: impl IntoIterator<Item = Point>, score: impl Fn(Point) -> i32) -> Option<Point> {
    points.into_iter().min_by_key(|&p| Reverse(score(p)))
}

fn resistance_groups(board: &Board) -> Vec<Group> {
    let mut found: Vec<Group> = groups(board)
        .into_iter()
        .filter(|g| g.side == US && g.count(board, Occupant::Resistance) > 0)
        .collect();
    found.sort_by_key(|g| Reverse(g.count(board, Occupant::Resistance)));
    found
}

/// Stones hit by all of our active beams on `board`.
fn our_beam_hits(board: &Board) -> HashSet<Point> {
    board
        .points()
        .filter(|&p| ours(board, p) && is_active(board, p, Ability::Beam))
        .flat_map(|p| beam_targets(board, p))
        .collect()
}

// =============================================================================
// Emergency defense and capture
// =============================================================================

/// Extend a reinforcement group that is down to its last liberty.
pub fn save_reinforcement(state: &GameState) -> Option<Move> {
    let board = &state.board;
    resistance_groups(board)
        .into_iter()
        .filter(|g| g.liberty_count() == 1)
        .find_map(|g| {
            let lib = g.liberties[0];
            (placeable(state, lib) && libs_after(board, lib) >= 2).then(|| Move::plain(lib))
        })
}

/// Take an attacker group in atari, largest first.
pub fn capture_atari(state: &GameState) -> Option<Move> {
    let board = &state.board;
    let mut targets: Vec<Group> = groups(board)
        .into_iter()
        .filter(|g| g.side == THEM && g.liberty_count() == 1)
        .collect();
    targets.sort_by_key(|g| Reverse(g.size()));
    targets
        .into_iter()
        .map(|g| g.liberties[0])
        .find(|&lib| placeable(state, lib))
        .map(Move::plain)
}

/// Give a two-liberty reinforcement group room before it is surrounded.
pub fn avoid_encirclement(state: &GameState) -> Option<Move> {
    let board = &state.board;
    resistance_groups(board)
        .into_iter()
        .filter(|g| g.liberty_count() == 2)
        .find_map(|g| {
            let options: Vec<Point> = g
                .liberties
                .iter()
                .copied()
                .filter(|&p| placeable(state, p) && libs_after(board, p) >= 3)
                .collect();
            best_point(options, |p| libs_after(board, p) as i32).map(Move::plain)
        })
}

// =============================================================================
// Counters to enemy abilities
// =============================================================================

/// Cancel an attacker viral stone that threatens to convert our plain stones.
pub fn counter_viral(state: &GameState) -> Option<Move> {
    if !has_ability(state, Ability::Suppressor) {
        return None;
    }
    let board = &state.board;
    board
        .points()
        .filter(|&p| theirs(board, p) && is_active(board, p, Ability::Viral))
        .filter(|&p| {
            board.neighbors(p).any(|n| {
                let cell = board.get(n);
                cell.occupant == Occupant::Defender && cell.abilities.is_empty()
            })
        })
        .find_map(|v| {
            let spots: Vec<Point> = board
                .neighbors(v)
                .filter(|&n| placeable(state, n) && libs_after(board, n) >= 1)
                .collect();
            best_point(spots, |n| libs_after(board, n) as i32)
                .map(|n| Move::with_ability(n, Ability::Suppressor))
        })
}

/// An active attacker beam lined up on our stones with an open gap at the far end.
fn beam_threats(board: &Board) -> Vec<(Point, Point)> {
    let size = board.size();
    let mut threats = Vec::new();
    for b in board.points() {
        if !theirs(board, b) || !is_active(board, b, Ability::Beam) {
            continue;
        }
        for (dr, dc) in DIRECTIONS {
            let mut cur = b;
            let mut exposed = 0;
            loop {
                let Some(nr) = cur.0.checked_add_signed(dr) else { break };
                let Some(nc) = cur.1.checked_add_signed(dc) else { break };
                if nr >= size || nc >= size {
                    break;
                }
                cur = (nr, nc);
                let cell = board.get(cur);
                if cell.is_empty() {
                    if exposed > 0 {
                        threats.push((b, cur));
                    }
                    break;
                }
                if !cell.occupant.is_stone() || cell.has(Ability::Beam) {
                    break;
                }
                if cell.allegiance() == Some(US) {
                    exposed += 1;
                }
            }
        }
    }
    threats
}

/// Defuse an attacker beam aimed along a line of our stones.
pub fn counter_beam(state: &GameState) -> Option<Move> {
    let board = &state.board;
    for (beam, gap) in beam_threats(board) {
        let group = group_of(board, beam);
        if group.liberty_count() <= 2 {
            let attack = best_point(
                group
                    .liberties
                    .iter()
                    .copied()
                    .filter(|&p| placeable(state, p) && libs_after(board, p) >= 2),
                |p| libs_after(board, p) as i32,
            );
            if let Some(p) = attack {
                return Some(Move::plain(p));
            }
        }
        if has_ability(state, Ability::Suppressor) && placeable(state, gap) {
            return Some(Move::with_ability(gap, Ability::Suppressor));
        }
    }
    None
}

/// Cancel an attacker suppressor that is shutting down our ability stones.
pub fn counter_suppressor(state: &GameState) -> Option<Move> {
    let board = &state.board;
    let culprits: Vec<Point> = board
        .points()
        .filter(|&p| theirs(board, p) && is_active(board, p, Ability::Suppressor))
        .filter(|&p| {
            board
                .neighbors(p)
                .any(|n| ours(board, n) && !board.get(n).abilities.is_empty())
        })
        .collect();
    for s in culprits {
        if has_ability(state, Ability::Suppressor) {
            let spot = best_point(
                board
                    .neighbors(s)
                    .filter(|&n| placeable(state, n) && libs_after(board, n) >= 1),
                |n| libs_after(board, n) as i32,
            );
            if let Some(n) = spot {
                return Some(Move::with_ability(n, Ability::Suppressor));
            }
        }
        let group = group_of(board, s);
        if group.liberty_count() <= 2 {
            let attack = group
                .liberties
                .iter()
                .copied()
                .find(|&p| placeable(state, p) && libs_after(board, p) >= 2);
            if let Some(p) = attack {
                return Some(Move::plain(p));
            }
        }
    }
    None
}

// =============================================================================
// Growth and opportunistic abilities
// =============================================================================

/// Put a plain stone next to the resistance so it can spread into it.
pub fn expand_reinforcement(state: &GameState) -> Option<Move> {
    let board = &state.board;
    let spots: Vec<Point> = board
        .points()
        .filter(|&p| placeable(state, p))
        .filter(|&p| {
            board
                .neighbors(p)
                .any(|n| board.get(n).occupant == Occupant::Resistance)
        })
        .filter(|&p| libs_after(board, p) >= 2)
        .collect();
    best_point(spots, |p| {
        let resistance =
            count_adjacent(board, p, |n| board.get(n).occupant == Occupant::Resistance);
        10 * libs_after(board, p) as i32 + 5 * resistance - 5 * count_adjacent(board, p, |n| theirs(board, n))
    })
    .map(Move::plain)
}

/// Drop a viral stone where it will convert attacker stones next turn.
pub fn place_viral(state: &GameState) -> Option<Move> {
    if !has_ability(state, Ability::Viral) {
        return None;
    }
    let board = &state.board;
    let convertible = |p: Point| {
        count_adjacent(board, p, |n| {
            let cell = board.get(n);
            cell.occupant == Occupant::Attacker && cell.abilities.is_empty()
        })
    };
    let net = |p: Point| {
        let libs = libs_after(board, p);
        let mut after = board.clone();
        after.place(p, US.stone(), AbilitySet::only(Ability::Viral));
        if libs == 0 || is_suppressed(&after, p) {
            return i32::MIN;
        }
        2 * convertible(p) - i32::from(libs <= 1)
    };
    let spots: Vec<Point> = board
        .points()
        .filter(|&p| placeable(state, p) && net(p) >= 2)
        .collect();
    best_point(spots, net).map(|p| Move::with_ability(p, Ability::Viral))
}

/// Place a beam that destroys strictly more attacker than defender stones.
///
/// Any placement that would hit a resistance stone is discarded outright.
pub fn place_beam(state: &GameState) -> Option<Move> {
    if !has_ability(state, Ability::Beam) {
        return None;
    }
    let board = &state.board;
    let before = our_beam_hits(board);
    let net = |p: Point| -> Option<i32> {
        let mut after = board.clone();
        after.place(p, US.stone(), AbilitySet::only(Ability::Beam));
        let hits = our_beam_hits(&after);
        let mut enemy = 0;
        let mut friendly = 0;
        for q in hits.difference(&before) {
            match after.get(*q).occupant {
                Occupant::Resistance => return None,
                Occupant::Defender => friendly += 1,
                Occupant::Attacker => enemy += 1,
                _ => {}
            }
        }
        (enemy > friendly).then_some(enemy - friendly)
    };
    let spots: Vec<(Point, i32)> = board
        .points()
        .filter(|&p| placeable(state, p))
        .filter_map(|p| net(p).map(|n| (p, n)))
        .collect();
    spots
        .into_iter()
        .min_by_key(|&(_, n)| Reverse(n))
        .map(|(p, _)| Move::with_ability(p, Ability::Beam))
}

/// Neutralize active attacker ability stones with a suppressor.
pub fn place_suppressor(state: &GameState) -> Option<Move> {
    if !has_ability(state, Ability::Suppressor) {
        return None;
    }
    let board = &state.board;
    let value = |p: Point| {
        count_adjacent(board, p, |n| {
            theirs(board, n) && !board.get(n).abilities.is_empty() && !is_suppressed(board, n)
        })
    };
    let spots: Vec<Point> = board
        .points()
        .filter(|&p| placeable(state, p) && value(p) >= 1 && libs_after(board, p) >= 2)
        .collect();
    best_point(spots, value).map(|p| Move::with_ability(p, Ability::Suppressor))
}

/// Use a swap when trading places clearly beats a plain stone on the same cell.
pub fn place_swap(state: &GameState) -> Option<Move> {
    if !has_ability(state, Ability::Swap) {
        return None;
    }
    let board = &state.board;
    let mut best: Option<(Move, i32)> = None;
    for p in board.points().filter(|&p| placeable(state, p)) {
        let Some(plain) = simulate_turn(state, &Move::plain(p)) else {
            continue;
        };
        let baseline = evaluate(&plain.board);
        for n in board.neighbors(p).filter(|&n| board.get(n).occupant.is_stone()) {
            let mv = Move::swap(p, n);
            let Some(result) = simulate_turn(state, &mv) else {
                continue;
            };
            let gain = evaluate(&result.board) - baseline;
            if gain >= SWAP_GAIN_THRESHOLD && best.is_none_or(|(_, g)| gain > g) {
                best = Some((mv, gain));
            }
        }
    }
    best.map(|(mv, _)| mv)
}

// =============================================================================
// Fallbacks
// =============================================================================

/// A safe, central, connected plain stone.
pub fn positional(state: &GameState) -> Option<Move> {
    let board = &state.board;
    let mid = board.size() / 2;
    let spots: Vec<Point> = board
        .points()
        .filter(|&p| placeable(state, p) && libs_after(board, p) >= 2)
        .collect();
    best_point(spots, |p| {
        4 * count_adjacent(board, p, |n| ours(board, n))
            - 2 * count_adjacent(board, p, |n| theirs(board, n))
            - 3 * manhattan(p, (mid, mid)) as i32
            + libs_after(board, p) as i32
    })
    .map(Move::plain)
}

/// The first cell we may legally play on.
pub fn first_empty(state: &GameState) -> Option<Move> {
    legal_placements(state).first().copied().map(Move::plain)
}

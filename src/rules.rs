//! Board-level rules: beams, captures, viral and territorial spread,
//! mass-destruction escalation, residue, and win detection.
//!
//! Every function here mutates a board the caller owns. The turn pipeline in
//! [`crate::game`] clones the committed board first, so none of these effects
//! leak into history snapshots.

use log::{debug, trace};

use crate::board::{Ability, AbilitySet, Board, Cell, Occupant, Point, Residue, Side};
use crate::constants::{DIRECTIONS, RESIDUE_LIFETIME, VOID_THRESHOLD};
use crate::groups::groups;
use crate::rng::RandomSource;
use crate::suppression::{is_active, is_suppressed};

/// A stone removed from the board, with what it was before removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destroyed {
    pub point: Point,
    pub occupant: Occupant,
}

fn destroy(board: &mut Board, p: Point, out: &mut Vec<Destroyed>) {
    let occupant = board.get(p).occupant;
    board.get_mut(p).clear();
    out.push(Destroyed { point: p, occupant });
}

fn step((r, c): Point, (dr, dc): (isize, isize), size: usize) -> Option<Point> {
    let nr = r.checked_add_signed(dr)?;
    let nc = c.checked_add_signed(dc)?;
    (nr < size && nc < size).then_some((nr, nc))
}

/// Cells a beam fired from `origin` would destroy, ignoring whether the origin
/// actually carries an active beam.
///
/// Each direction walks outward until it meets an empty or voided cell (no
/// effect), the edge (no effect), or another beam stone, in which case every
/// stone strictly between the two beams is hit.
pub fn beam_targets(board: &Board, origin: Point) -> Vec<Point> {
    let size = board.size();
    let mut targets = Vec::new();
    for dir in DIRECTIONS {
        let mut between = Vec::new();
        let mut cur = origin;
        let closed = loop {
            let Some(next) = step(cur, dir, size) else {
                break false;
            };
            let cell = board.get(next);
            if !cell.occupant.is_stone() {
                break false;
            }
            if cell.has(Ability::Beam) {
                break true;
            }
            between.push(next);
            cur = next;
        };
        if closed {
            targets.extend(between);
        }
    }
    targets
}

/// Fire the beam stone at `origin`. No-op unless it carries an unsuppressed beam.
///
/// All four directions are resolved against the board as it was before the
/// trigger.
pub fn trigger_beam(board: &mut Board, origin: Point) -> Vec<Destroyed> {
    if !is_active(board, origin, Ability::Beam) {
        return Vec::new();
    }
    let mut destroyed = Vec::new();
    for p in beam_targets(board, origin) {
        destroy(board, p, &mut destroyed);
    }
    if !destroyed.is_empty() {
        debug!("beam at {origin:?} destroyed {} stones", destroyed.len());
    }
    destroyed
}

/// Remove zero-liberty groups: first the opponent's, then `acting`'s own.
pub fn resolve_captures(board: &mut Board, acting: Side) -> Vec<Destroyed> {
    let mut destroyed = Vec::new();
    for side in [acting.opponent(), acting] {
        for group in groups(board) {
            if group.side == side && group.is_captured() {
                trace!("capturing {side} group of {}", group.size());
                for &p in &group.stones {
                    destroy(board, p, &mut destroyed);
                }
            }
        }
    }
    destroyed
}

/// Convert ability-free enemy stones next to `active`'s viral stones.
///
/// Conversions are computed against the board before the call and applied
/// together. Resistance stones are never converted. Returns converted points.
pub fn spread_viral(board: &mut Board, active: Side) -> Vec<Point> {
    let snapshot = board.clone();
    let mut converted: Vec<Point> = Vec::new();
    for p in snapshot.points() {
        if snapshot.get(p).allegiance() != Some(active)
            || !is_active(&snapshot, p, Ability::Viral)
        {
            continue;
        }
        for n in snapshot.neighbors(p) {
            let target = snapshot.get(n);
            let convertible = target.occupant.is_stone()
                && target.allegiance() != Some(active)
                && target.occupant != Occupant::Resistance
                && target.abilities.is_empty();
            if convertible && !converted.contains(&n) {
                converted.push(n);
            }
        }
    }
    for &p in &converted {
        let cell = board.get_mut(p);
        cell.occupant = active.stone();
        cell.abilities = AbilitySet::only(Ability::Viral);
    }
    if !converted.is_empty() {
        debug!("{active} viral spread converted {converted:?}");
    }
    converted
}

/// Defender stones that may join the resistance this turn.
pub fn reinforcement_candidates(board: &Board) -> Vec<Point> {
    board
        .points()
        .filter(|&p| {
            let cell = board.get(p);
            cell.occupant == Occupant::Defender
                && cell.abilities.is_empty()
                && !is_suppressed(board, p)
                && board
                    .neighbors(p)
                    .any(|n| board.get(n).occupant == Occupant::Resistance)
        })
        .collect()
}

/// Turn one random eligible defender stone into a resistance stone.
pub fn spread_reinforcement(board: &mut Board, rng: &mut impl RandomSource) -> Option<Point> {
    let candidates = reinforcement_candidates(board);
    let &p = rng.pick(&candidates)?;
    board.get_mut(p).occupant = Occupant::Resistance;
    debug!("resistance spread to {p:?}");
    Some(p)
}

/// Collapse duplicate destructions by coordinate, keeping the last record.
pub(crate) fn dedup_destroyed(destroyed: &[Destroyed]) -> Vec<Destroyed> {
    let mut unique: Vec<Destroyed> = Vec::with_capacity(destroyed.len());
    for d in destroyed {
        match unique.iter_mut().find(|u| u.point == d.point) {
            Some(slot) => *slot = *d,
            None => unique.push(*d),
        }
    }
    unique
}

/// Pick the destroyed cell nearest the centroid of all destroyed cells.
///
/// Distances are compared scaled by the count so the comparison stays in
/// integers. Ties go to the lowest column, then the lowest row.
fn centroid_cell(points: &[Point]) -> Option<Point> {
    let n = points.len();
    let sum_r: usize = points.iter().map(|p| p.0).sum();
    let sum_c: usize = points.iter().map(|p| p.1).sum();
    points
        .iter()
        .copied()
        .min_by_key(|&(r, c)| ((r * n).abs_diff(sum_r) + (c * n).abs_diff(sum_c), c, r))
}

/// Apply the aftermath of one commit's destruction.
///
/// With at least [`VOID_THRESHOLD`] destroyed cells the one nearest their
/// centroid becomes a permanent void. Every other destroyed cell gets residue
/// owned by the side that lost the stone. Returns the voided point, if any.
pub fn handle_resolution_event(
    board: &mut Board,
    destroyed: &[Destroyed],
    turn_count: u32,
) -> Option<Point> {
    let unique = dedup_destroyed(destroyed);
    let void = if unique.len() >= VOID_THRESHOLD {
        let points: Vec<Point> = unique.iter().map(|d| d.point).collect();
        centroid_cell(&points)
    } else {
        None
    };

    if let Some(v) = void {
        *board.get_mut(v) = Cell {
            occupant: Occupant::Void,
            ..Cell::default()
        };
        debug!("{} stones destroyed, {v:?} is now void", unique.len());
    }

    for d in unique.iter().filter(|d| Some(d.point) != void) {
        let Some(owner) = d.occupant.allegiance() else {
            continue;
        };
        let cell = board.get_mut(d.point);
        if cell.is_empty() {
            cell.residue = Some(Residue {
                owner,
                turn_created: turn_count,
            });
        }
    }
    void
}

/// Drop residue marks that have lived a full round-cycle.
pub fn expire_residue(board: &mut Board, turn_count: u32) {
    for p in board.points() {
        let cell = board.get_mut(p);
        let expired = cell
            .residue
            .is_some_and(|res| turn_count.saturating_sub(res.turn_created) >= RESIDUE_LIFETIME);
        if expired {
            cell.residue = None;
        }
    }
}

/// Whether residue on `cell` stops `side` from placing there at `turn_count`.
pub fn residue_blocks(cell: &Cell, side: Side, turn_count: u32) -> bool {
    cell.residue.is_some_and(|res| {
        res.owner == side && turn_count.saturating_sub(res.turn_created) < RESIDUE_LIFETIME
    })
}

/// Decide whether the game is over with `turn` to move at `turn_count`.
pub fn check_win(board: &Board, turn: Side, turn_count: u32) -> Option<Side> {
    if board.count(Occupant::Resistance) == 0 {
        return Some(Side::Attacker);
    }
    if turn == Side::Attacker && board.count(Occupant::Empty) == 0 {
        return Some(Side::Defender);
    }
    if turn_count > 1 {
        if board.count_side(Side::Attacker) == 0 {
            return Some(Side::Defender);
        }
        if board.count_side(Side::Defender) == 0 {
            return Some(Side::Attacker);
        }
    }
    None
}

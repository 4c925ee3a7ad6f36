//! Game state and the turn pipeline.
//!
//! A turn has three phases: a primary placement ([`apply_move`]), an optional
//! secondary action when a swap stone was placed ([`apply_swap`]), and the
//! commit ([`commit_turn`]) that resolves beams, captures, spreading,
//! escalation, and win conditions before handing the move to the other side.
//!
//! Every entry point takes the current state by reference and returns a new
//! one. Rejected moves return a [`MoveError`] and leave nothing changed.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::board::{Ability, AbilitySet, Board, Cell, Occupant, Point, Side, manhattan};
use crate::config::GameConfig;
use crate::constants::{MAX_UNDO_HISTORY, REPETITION_WINDOW};
use crate::error::MoveError;
use crate::rng::RandomSource;
use crate::rules::{
    check_win, expire_residue, handle_resolution_event, resolve_captures, residue_blocks,
    spread_reinforcement, spread_viral, trigger_beam,
};

/// Remaining special-stone uses for one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    counts: BTreeMap<Ability, u32>,
}

impl Inventory {
    pub fn new(counts: BTreeMap<Ability, u32>) -> Self {
        Self { counts }
    }

    pub fn remaining(&self, ability: Ability) -> u32 {
        self.counts.get(&ability).copied().unwrap_or(0)
    }

    pub fn has(&self, ability: Ability) -> bool {
        self.remaining(ability) > 0
    }

    /// Use one charge. Returns false, changing nothing, when none are left.
    pub fn consume(&mut self, ability: Ability) -> bool {
        match self.counts.get_mut(&ability) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    /// Abilities with at least one use left.
    pub fn available(&self) -> Vec<Ability> {
        Ability::ALL.into_iter().filter(|&a| self.has(a)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventories {
    pub attacker: Inventory,
    pub defender: Inventory,
}

impl Inventories {
    pub fn get(&self, side: Side) -> &Inventory {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut Inventory {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }
}

/// A placement, optionally with an ability and, for swap stones, the partner
/// the new stone trades places with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub point: Point,
    pub ability: Option<Ability>,
    pub swap_with: Option<Point>,
}

impl Move {
    pub fn plain(point: Point) -> Self {
        Self {
            point,
            ability: None,
            swap_with: None,
        }
    }

    pub fn with_ability(point: Point, ability: Ability) -> Self {
        Self {
            point,
            ability: Some(ability),
            swap_with: None,
        }
    }

    pub fn swap(point: Point, partner: Point) -> Self {
        Self {
            point,
            ability: Some(Ability::Swap),
            swap_with: Some(partner),
        }
    }
}

/// The unit of persistence and of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub turn: Side,
    pub inventories: Inventories,
    /// The primary placement for this turn is done.
    #[serde(default)]
    pub move_confirmed: bool,
    /// Swap stone waiting for its secondary action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_swap: Option<Point>,
    /// Cells moved by a swap this turn; their beams fire at commit whoever owns them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub swap_moved: Vec<Point>,
    /// In-turn undo stack. Snapshots carry no history of their own.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<GameState>,
    /// Boards after the most recent commits, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_boards: Vec<Board>,
    pub turn_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_limit: Option<u32>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
}

impl GameState {
    /// A state at turn zero around an existing board, with default inventories.
    pub fn with_board(board: Board, turn: Side) -> Self {
        let config = GameConfig::default();
        Self {
            recent_boards: vec![board.clone()],
            board,
            turn,
            inventories: Inventories {
                attacker: config.attacker_inventory,
                defender: config.defender_inventory,
            },
            move_confirmed: false,
            pending_swap: None,
            swap_moved: Vec::new(),
            history: Vec::new(),
            turn_count: 0,
            turn_limit: None,
            game_over: false,
            winner: None,
        }
    }

    fn snapshot(&self) -> GameState {
        GameState {
            history: Vec::new(),
            ..self.clone()
        }
    }

    fn push_history(&mut self, previous: &GameState) {
        self.history.push(previous.snapshot());
        if self.history.len() > MAX_UNDO_HISTORY {
            self.history.remove(0);
        }
    }

    /// The board after the previous commit, if remembered.
    pub fn previous_board(&self, back: usize) -> Option<&Board> {
        self.recent_boards
            .len()
            .checked_sub(back)
            .and_then(|i| self.recent_boards.get(i))
    }
}

/// Start a game: empty board seeded with reinforcement stones at random
/// distinct cells. The attacker moves first.
///
/// The config is expected to have passed [`GameConfig::validate`]. A maximum
/// below the minimum seeds exactly the minimum.
pub fn new_game(config: &GameConfig, rng: &mut impl RandomSource) -> GameState {
    let mut board = Board::new(config.board_size);
    let max = config.max_reinforcements.max(config.min_reinforcements);
    let count = config.min_reinforcements + rng.below(max - config.min_reinforcements + 1);
    let mut free: Vec<Point> = board.points().collect();
    for _ in 0..count.min(free.len()) {
        let p = free.swap_remove(rng.below(free.len()));
        board.place(p, Occupant::Resistance, AbilitySet::EMPTY);
    }
    info!(
        "new {0}x{0} game with {count} reinforcement stones",
        config.board_size
    );

    let mut state = GameState::with_board(board, Side::Attacker);
    state.inventories = Inventories {
        attacker: config.attacker_inventory.clone(),
        defender: config.defender_inventory.clone(),
    };
    state.turn_limit = config.turn_limit;
    state
}

/// Check that `side` may put a stone on `p`.
pub fn check_placement(state: &GameState, p: Point, side: Side) -> Result<(), MoveError> {
    if !state.board.in_bounds(p) {
        return Err(MoveError::OutOfBounds(p));
    }
    let cell = state.board.get(p);
    match cell.occupant {
        Occupant::Void => return Err(MoveError::Voided(p)),
        Occupant::Empty => {}
        _ => return Err(MoveError::Occupied(p)),
    }
    if residue_blocks(cell, side, state.turn_count) {
        return Err(MoveError::ResidueBlocked(p));
    }
    Ok(())
}

/// Cells the side to move may place on.
pub fn legal_placements(state: &GameState) -> Vec<Point> {
    state
        .board
        .points()
        .filter(|&p| check_placement(state, p, state.turn).is_ok())
        .collect()
}

/// Place a stone for the side to move. Captures and beams wait for the commit.
///
/// Placing a swap stone leaves the turn waiting for [`apply_swap`].
pub fn apply_move(state: &GameState, mv: &Move) -> Result<GameState, MoveError> {
    if state.game_over {
        return Err(MoveError::GameOver);
    }
    if state.move_confirmed {
        return Err(MoveError::AlreadyPlaced);
    }
    let side = state.turn;
    check_placement(state, mv.point, side)?;
    if let Some(a) = mv.ability {
        if !state.inventories.get(side).has(a) {
            return Err(MoveError::AbilityUnavailable(a));
        }
    }

    let mut next = state.clone();
    next.push_history(state);
    let mut abilities = AbilitySet::EMPTY;
    if let Some(a) = mv.ability {
        next.inventories.get_mut(side).consume(a);
        abilities.insert(a);
    }
    next.board.place(mv.point, side.stone(), abilities);
    next.move_confirmed = true;
    if mv.ability == Some(Ability::Swap) {
        next.pending_swap = Some(mv.point);
    }
    Ok(next)
}

/// Exchange the stones on `a` and `b`, both within one step of the pending
/// swap stone. Stones move together with their abilities; the swap ability
/// is spent.
pub fn apply_swap(state: &GameState, a: Point, b: Point) -> Result<GameState, MoveError> {
    if state.game_over {
        return Err(MoveError::GameOver);
    }
    let origin = state.pending_swap.ok_or(MoveError::NoPendingSwap)?;
    if a == b {
        return Err(MoveError::SwapSameCell);
    }
    for p in [a, b] {
        if !state.board.in_bounds(p) {
            return Err(MoveError::OutOfBounds(p));
        }
        if manhattan(origin, p) > 1 {
            return Err(MoveError::SwapOutOfReach(p));
        }
        if !state.board.get(p).occupant.is_stone() {
            return Err(MoveError::SwapTargetEmpty(p));
        }
    }

    let mut next = state.clone();
    next.push_history(state);
    let ca = *state.board.get(a);
    let cb = *state.board.get(b);
    *next.board.get_mut(a) = Cell { residue: None, ..cb };
    *next.board.get_mut(b) = Cell { residue: None, ..ca };
    for p in [a, b] {
        next.board.get_mut(p).abilities.remove(Ability::Swap);
        next.swap_moved.push(p);
    }
    next.pending_swap = None;
    Ok(next)
}

/// Step back to the state before the last placement or swap of this turn.
pub fn undo(state: &GameState) -> Result<GameState, MoveError> {
    let mut history = state.history.clone();
    let mut previous = history.pop().ok_or(MoveError::NothingToUndo)?;
    previous.history = history;
    Ok(previous)
}

/// Resolve the turn and hand the move to the other side.
///
/// Committing without a placement is a pass, allowed only when the side to
/// move has nowhere to play.
pub fn commit_turn(state: &GameState, rng: &mut impl RandomSource) -> Result<GameState, MoveError> {
    if state.game_over {
        return Err(MoveError::GameOver);
    }
    if !state.move_confirmed && !legal_placements(state).is_empty() {
        return Err(MoveError::NothingToCommit);
    }

    let side = state.turn;
    let next_side = side.opponent();
    let mut next = state.clone();
    let board = &mut next.board;
    let mut destroyed = Vec::new();

    let origins: Vec<Point> = board
        .points()
        .filter(|&p| {
            let cell = board.get(p);
            cell.has(Ability::Beam)
                && (cell.allegiance() == Some(side) || state.swap_moved.contains(&p))
        })
        .collect();
    for origin in origins {
        destroyed.extend(trigger_beam(board, origin));
    }

    destroyed.extend(resolve_captures(board, side));

    spread_viral(board, next_side);
    if next_side == Side::Defender {
        spread_reinforcement(board, rng);
    }

    destroyed.extend(resolve_captures(board, next_side));

    handle_resolution_event(board, &destroyed, state.turn_count);
    expire_residue(board, state.turn_count);

    let mut winner = check_win(board, next_side, state.turn_count + 1);
    if let (None, Side::Attacker, Some(limit)) = (winner, side, state.turn_limit) {
        // The attacker moves on even turn counts.
        let attacker_turns = state.turn_count / 2 + 1;
        if attacker_turns >= limit && board.count(Occupant::Resistance) > 0 {
            winner = Some(Side::Defender);
        }
    }

    debug!(
        "{side} committed turn {} ({} stones destroyed)",
        state.turn_count,
        destroyed.len()
    );

    next.turn = next_side;
    next.turn_count += 1;
    next.move_confirmed = false;
    next.pending_swap = None;
    next.swap_moved.clear();
    next.history.clear();
    next.recent_boards.push(next.board.clone());
    if next.recent_boards.len() > REPETITION_WINDOW {
        next.recent_boards.remove(0);
    }
    if let Some(w) = winner {
        info!("game over after turn {}: {w} wins", state.turn_count);
        next.game_over = true;
        next.winner = Some(w);
    }
    Ok(next)
}

/// Place, swap if the move asks for it, and commit, all in one step.
pub fn play_turn(
    state: &GameState,
    mv: &Move,
    rng: &mut impl RandomSource,
) -> Result<GameState, MoveError> {
    let mut next = apply_move(state, mv)?;
    if let Some(partner) = mv.swap_with {
        next = apply_swap(&next, mv.point, partner)?;
    }
    commit_turn(&next, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Residue;
    use crate::rng::Deterministic;

    fn state(diagram: &str, turn: Side) -> GameState {
        GameState::with_board(diagram.parse().unwrap(), turn)
    }

    #[test]
    fn test_new_game_seeds_reinforcements() {
        let config = GameConfig::default();
        for seed in 0..50 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let game = new_game(&config, &mut rng);
            let n = game.board.count(Occupant::Resistance);
            assert!((1..=3).contains(&n), "seed {seed} placed {n}");
            assert_eq!(game.turn, Side::Attacker);
            assert_eq!(game.turn_count, 0);
        }
    }

    #[test]
    fn test_new_game_with_inverted_range_seeds_minimum() {
        let config = GameConfig {
            min_reinforcements: 3,
            max_reinforcements: 1,
            ..GameConfig::default()
        };
        for seed in 0..10 {
            let game = new_game(&config, &mut fastrand::Rng::with_seed(seed));
            assert_eq!(game.board.count(Occupant::Resistance), 3);
        }
    }

    #[test]
    fn test_apply_move_consumes_inventory() {
        let s = state(". . .\n. R .\n. . .", Side::Attacker);
        let next = apply_move(&s, &Move::with_ability((0, 0), Ability::Beam)).unwrap();
        assert_eq!(next.inventories.attacker.remaining(Ability::Beam), 2);
        assert_eq!(s.inventories.attacker.remaining(Ability::Beam), 3);
        assert!(next.board.get((0, 0)).has(Ability::Beam));
        assert!(next.move_confirmed);
        assert!(s.board.get((0, 0)).is_empty(), "input state untouched");
    }

    #[test]
    fn test_apply_move_rejections() {
        let mut s = state("A . #\n. R .\n. . .", Side::Attacker);
        assert_eq!(
            apply_move(&s, &Move::plain((0, 0))),
            Err(MoveError::Occupied((0, 0)))
        );
        assert_eq!(
            apply_move(&s, &Move::plain((0, 2))),
            Err(MoveError::Voided((0, 2)))
        );
        assert_eq!(
            apply_move(&s, &Move::plain((3, 0))),
            Err(MoveError::OutOfBounds((3, 0)))
        );
        s.inventories.attacker = Inventory::default();
        assert_eq!(
            apply_move(&s, &Move::with_ability((0, 1), Ability::Viral)),
            Err(MoveError::AbilityUnavailable(Ability::Viral))
        );
        let placed = apply_move(&s, &Move::plain((0, 1))).unwrap();
        assert_eq!(
            apply_move(&placed, &Move::plain((2, 2))),
            Err(MoveError::AlreadyPlaced)
        );
    }

    #[test]
    fn test_swap_flow() {
        let s = state(". . .\n. Dv R\n. . .", Side::Attacker);
        let placed = apply_move(&s, &Move::with_ability((0, 1), Ability::Swap)).unwrap();
        assert_eq!(placed.pending_swap, Some((0, 1)));
        let swapped = apply_swap(&placed, (0, 1), (1, 1)).unwrap();
        assert_eq!(swapped.board.get((0, 1)).occupant, Occupant::Defender);
        assert!(swapped.board.get((0, 1)).has(Ability::Viral));
        assert_eq!(swapped.board.get((1, 1)).occupant, Occupant::Attacker);
        assert!(swapped.board.get((1, 1)).abilities.is_empty(), "swap is spent");
        assert_eq!(swapped.pending_swap, None);
        assert_eq!(swapped.swap_moved, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_swap_rejections() {
        let s = state(". . .\n. D R\nD . .", Side::Attacker);
        assert_eq!(
            apply_swap(&s, (1, 1), (1, 2)),
            Err(MoveError::NoPendingSwap)
        );
        let placed = apply_move(&s, &Move::with_ability((0, 1), Ability::Swap)).unwrap();
        assert_eq!(
            apply_swap(&placed, (0, 1), (2, 0)),
            Err(MoveError::SwapOutOfReach((2, 0)))
        );
        assert_eq!(
            apply_swap(&placed, (0, 1), (0, 0)),
            Err(MoveError::SwapTargetEmpty((0, 0)))
        );
        assert_eq!(
            apply_swap(&placed, (0, 1), (0, 1)),
            Err(MoveError::SwapSameCell)
        );
    }

    #[test]
    fn test_undo_restores_previous_phase() {
        let s = state(". . .\n. D R\n. . .", Side::Attacker);
        let placed = apply_move(&s, &Move::with_ability((0, 1), Ability::Swap)).unwrap();
        let swapped = apply_swap(&placed, (0, 1), (1, 1)).unwrap();
        let back = undo(&swapped).unwrap();
        assert_eq!(back, placed);
        let start = undo(&back).unwrap();
        assert_eq!(start, s);
        assert_eq!(undo(&start), Err(MoveError::NothingToUndo));
    }

    #[test]
    fn test_commit_requires_placement() {
        let s = state(". . .\n. R .\n. . .", Side::Attacker);
        assert_eq!(
            commit_turn(&s, &mut Deterministic),
            Err(MoveError::NothingToCommit)
        );
    }

    #[test]
    fn test_commit_advances_turn_and_clears_history() {
        let s = state(". . .\n. R .\n. . .", Side::Attacker);
        let next = play_turn(&s, &Move::plain((0, 0)), &mut Deterministic).unwrap();
        assert_eq!(next.turn, Side::Defender);
        assert_eq!(next.turn_count, 1);
        assert!(next.history.is_empty());
        assert!(!next.move_confirmed);
        assert_eq!(next.previous_board(1), Some(&next.board));
    }

    #[test]
    fn test_commit_fires_swap_moved_beam_for_either_owner() {
        // The attacker swaps a defender beam stone into line with another
        // defender beam; it fires at the attacker's commit anyway.
        let s = state(
            "Db . . .\n. A D Db\nR . . .\n. . . .",
            Side::Attacker,
        );
        let placed = apply_move(&s, &Move::with_ability((1, 0), Ability::Swap)).unwrap();
        let swapped = apply_swap(&placed, (1, 0), (0, 0)).unwrap();
        assert!(swapped.board.get((1, 0)).has(Ability::Beam));
        let next = commit_turn(&swapped, &mut Deterministic).unwrap();
        for (p, owner) in [((1, 1), Side::Attacker), ((1, 2), Side::Defender)] {
            let cell = next.board.get(p);
            assert!(cell.is_empty(), "{p:?} destroyed");
            assert_eq!(cell.residue.map(|r| r.owner), Some(owner));
        }
        assert_eq!(next.board.get((0, 0)).occupant, Occupant::Attacker);
    }

    #[test]
    fn test_round_limit_defender_wins() {
        let mut s = state(". . .\n. R .\n. . .", Side::Attacker);
        s.turn_limit = Some(1);
        let next = play_turn(&s, &Move::plain((0, 0)), &mut Deterministic).unwrap();
        assert!(next.game_over);
        assert_eq!(next.winner, Some(Side::Defender));
        assert_eq!(
            play_turn(&next, &Move::plain((2, 2)), &mut Deterministic),
            Err(MoveError::GameOver)
        );
    }

    #[test]
    fn test_forced_pass_when_board_full_for_side() {
        let mut s = state("A R\nD .", Side::Defender);
        s.board.get_mut((1, 1)).residue = Some(Residue {
            owner: Side::Defender,
            turn_created: 0,
        });
        let next = commit_turn(&s, &mut Deterministic).unwrap();
        assert_eq!(next.turn, Side::Attacker);
    }
}

//! Connectivity and liberty analysis.
//!
//! Groups are flood-filled over stones of the same allegiance, so defender and
//! resistance stones merge into one group while attacker stones only connect
//! to each other. Residue cells are empty for grouping purposes; voids are
//! never liberties.

use std::collections::VecDeque;

use crate::board::{Board, Occupant, Point, Side};

/// A connected group of stones and its distinct liberties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub side: Side,
    pub stones: Vec<Point>,
    pub liberties: Vec<Point>,
}

impl Group {
    pub fn size(&self) -> usize {
        self.stones.len()
    }

    pub fn liberty_count(&self) -> usize {
        self.liberties.len()
    }

    pub fn is_captured(&self) -> bool {
        self.liberties.is_empty()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.stones.contains(&p)
    }

    /// Number of member stones with the given occupant.
    pub fn count(&self, board: &Board, occupant: Occupant) -> usize {
        self.stones
            .iter()
            .filter(|&&p| board.get(p).occupant == occupant)
            .count()
    }
}

/// Collect the group containing `start` via breadth-first flood fill.
///
/// Panics if `start` is empty or voided; callers only ask about stones.
pub fn group_of(board: &Board, start: Point) -> Group {
    let side = board
        .get(start)
        .allegiance()
        .unwrap_or_else(|| panic!("group_of called on non-stone cell {start:?}"));
    let size = board.size();
    let mut visited = vec![false; size * size];
    let mut liberty_seen = vec![false; size * size];
    let mut queue = VecDeque::from([start]);
    let mut stones = Vec::new();
    let mut liberties = Vec::new();
    visited[start.0 * size + start.1] = true;

    while let Some(p) = queue.pop_front() {
        stones.push(p);
        for n in board.neighbors(p) {
            let i = n.0 * size + n.1;
            let cell = board.get(n);
            if cell.is_empty() {
                if !liberty_seen[i] {
                    liberty_seen[i] = true;
                    liberties.push(n);
                }
            } else if cell.allegiance() == Some(side) && !visited[i] {
                visited[i] = true;
                queue.push_back(n);
            }
        }
    }

    Group {
        side,
        stones,
        liberties,
    }
}

/// Sweep the whole board once, returning every group in row-major order of
/// first stone.
pub fn groups(board: &Board) -> Vec<Group> {
    let size = board.size();
    let mut seen = vec![false; size * size];
    let mut out = Vec::new();
    for p in board.points() {
        if seen[p.0 * size + p.1] || !board.get(p).occupant.is_stone() {
            continue;
        }
        let group = group_of(board, p);
        for &s in &group.stones {
            seen[s.0 * size + s.1] = true;
        }
        out.push(group);
    }
    out
}

/// Liberties of the group at `p`, or zero for a non-stone cell.
pub fn liberties_at(board: &Board, p: Point) -> usize {
    if board.get(p).occupant.is_stone() {
        group_of(board, p).liberty_count()
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_stone_liberties() {
        let board: Board = ". . .\n. A .\n. . .".parse().unwrap();
        let g = group_of(&board, (1, 1));
        assert_eq!(g.size(), 1);
        assert_eq!(g.liberty_count(), 4);
        assert_eq!(g.side, Side::Attacker);
    }

    #[test]
    fn test_defender_and_resistance_merge() {
        let board: Board = "D R A\n. . A\n. . .".parse().unwrap();
        let g = group_of(&board, (0, 0));
        assert_eq!(g.size(), 2, "defender and resistance connect");
        assert_eq!(g.count(&board, Occupant::Resistance), 1);
        assert_eq!(g.liberty_count(), 2);

        let a = group_of(&board, (0, 2));
        assert_eq!(a.size(), 2);
    }

    #[test]
    fn test_void_is_not_a_liberty() {
        let board: Board = "A #\n# .".parse().unwrap();
        let g = group_of(&board, (0, 0));
        assert!(g.is_captured());
    }

    #[test]
    fn test_residue_counts_as_liberty() {
        let mut board: Board = "A .\n. .".parse().unwrap();
        board.get_mut((0, 1)).residue = Some(crate::board::Residue {
            owner: Side::Attacker,
            turn_created: 0,
        });
        assert_eq!(group_of(&board, (0, 0)).liberty_count(), 2);
    }

    #[test]
    fn test_sweep_finds_every_group_once() {
        let board: Board = "A A D\n. D D\nR . A".parse().unwrap();
        let all = groups(&board);
        assert_eq!(all.len(), 4);
        let stones: usize = all.iter().map(Group::size).sum();
        assert_eq!(stones, 7);
    }

    #[test]
    #[should_panic]
    fn test_group_of_empty_panics() {
        let board = Board::new(3);
        group_of(&board, (0, 0));
    }
}

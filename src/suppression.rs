//! Suppression (neutralization) of stone abilities.
//!
//! A suppressor stone shuts down the abilities of adjacent opposing stones.
//! Two opposing suppressors that touch cancel each other outright, which keeps
//! the check non-recursive: a neighbor's suppressor is active exactly when it
//! has no opposing suppressor of its own next to it.

use crate::board::{Ability, Board, Point, Side};

/// Whether the suppressor at `p`, owned by `side`, touches an opposing suppressor.
fn cancelled(board: &Board, p: Point, side: Side) -> bool {
    board.neighbors(p).any(|n| {
        let cell = board.get(n);
        cell.allegiance() == Some(side.opponent()) && cell.has(Ability::Suppressor)
    })
}

/// Whether the abilities of the stone at `p` are neutralized.
///
/// Empty and voided cells are never suppressed.
pub fn is_suppressed(board: &Board, p: Point) -> bool {
    let cell = board.get(p);
    let Some(side) = cell.allegiance() else {
        return false;
    };

    if cell.has(Ability::Suppressor) {
        return cancelled(board, p, side);
    }

    let enemy = side.opponent();
    board.neighbors(p).any(|n| {
        let other = board.get(n);
        other.allegiance() == Some(enemy)
            && other.has(Ability::Suppressor)
            && !cancelled(board, n, enemy)
    })
}

/// Whether the stone at `p` carries `ability` and may use it.
pub fn is_active(board: &Board, p: Point, ability: Ability) -> bool {
    board.get(p).has(ability) && !is_suppressed(board, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposing_suppressors_cancel_both_ways() {
        let board: Board = "As Ds .\n. . .\n. . .".parse().unwrap();
        assert!(is_suppressed(&board, (0, 0)));
        assert!(is_suppressed(&board, (0, 1)));
    }

    #[test]
    fn test_active_suppressor_neutralizes_neighbor() {
        let board: Board = "As Dv .\n. . .\n. . .".parse().unwrap();
        assert!(is_suppressed(&board, (0, 1)));
        assert!(!is_suppressed(&board, (0, 0)));
        assert!(!is_active(&board, (0, 1), Ability::Viral));
    }

    #[test]
    fn test_cancelled_suppressor_does_not_neutralize() {
        // The attacker suppressor is cancelled by the defender suppressor below
        // it, so the viral stone to its right stays active.
        let board: Board = "As Dv .\nDs . .\n. . .".parse().unwrap();
        assert!(is_suppressed(&board, (0, 0)));
        assert!(!is_suppressed(&board, (0, 1)));
    }

    #[test]
    fn test_friendly_suppressor_is_harmless() {
        let board: Board = "Ds Rv .\n. . .\n. . .".parse().unwrap();
        assert!(!is_suppressed(&board, (0, 1)));
        assert!(!is_suppressed(&board, (0, 0)));
    }

    #[test]
    fn test_resistance_counts_as_defender() {
        let board: Board = "Rs Ab .\n. . .\n. . .".parse().unwrap();
        assert!(is_suppressed(&board, (0, 1)));
    }

    #[test]
    fn test_empty_is_never_suppressed() {
        let board: Board = ". As\n. .".parse().unwrap();
        assert!(!is_suppressed(&board, (0, 0)));
    }
}

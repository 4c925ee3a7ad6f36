//! Static evaluation of a board from the defender's point of view.
//!
//! Positive scores favor the defender. The evaluator is a pure function of
//! the board: no randomness, no turn information.

use crate::board::{Ability, Board, Occupant, Side, manhattan};
use crate::constants::*;
use crate::groups::{Group, groups};

fn defender_group_score(board: &Board, group: &Group) -> i32 {
    let mut score = DEF_STONE * group.size() as i32;
    score += match group.liberty_count() {
        0 => 0,
        1 => DEF_ATARI,
        2 => DEF_TWO_LIBS,
        _ => DEF_SAFE,
    };
    score += DEF_REINFORCEMENT * group.count(board, Occupant::Resistance) as i32;
    if group.stones.iter().any(|&p| board.get(p).has(Ability::Viral)) {
        score += DEF_VIRAL_GROUP;
    }
    score
}

fn attacker_group_score(group: &Group) -> i32 {
    let mut score = ATT_STONE * group.size() as i32;
    score += match group.liberty_count() {
        0 => ATT_CAPTURED,
        1 => ATT_ATARI,
        2 => 0,
        _ => ATT_SAFE,
    };
    score
}

/// Score `board`; higher is better for the defender.
pub fn evaluate(board: &Board) -> i32 {
    let mut score = 0;
    for group in groups(board) {
        score += match group.side {
            Side::Defender => defender_group_score(board, &group),
            Side::Attacker => attacker_group_score(&group),
        };
    }

    let mid = board.size() / 2;
    for p in board.points() {
        let cell = board.get(p);
        if cell.is_empty() {
            score += EMPTY_CENTER_DISTANCE * manhattan(p, (mid, mid)) as i32;
        }
        if cell.has(Ability::Suppressor) {
            score += match cell.allegiance() {
                Some(Side::Defender) => SUPPRESSOR_BONUS,
                Some(Side::Attacker) => -SUPPRESSOR_BONUS,
                None => 0,
            };
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_penalizes_distance() {
        let board = Board::new(3);
        // Center (1,1): four cells at distance 1, four at distance 2.
        assert_eq!(evaluate(&board), -3 * (4 + 8));
    }

    #[test]
    fn test_lone_resistance_stone() {
        let mut board: Board = "R . .\n. . .\n. . .".parse().unwrap();
        let empty_term: i32 = board
            .points()
            .filter(|&p| board.get(p).is_empty())
            .map(|p| -3 * manhattan(p, (1, 1)) as i32)
            .sum();
        // 15 for the stone, 40 for two liberties, 120 for the resistance member.
        assert_eq!(evaluate(&board), 15 + 40 + 120 + empty_term);

        board.get_mut((0, 0)).abilities.insert(Ability::Viral);
        assert_eq!(evaluate(&board), 15 + 40 + 120 + 60 + empty_term);
    }

    #[test]
    fn test_attacker_in_atari_scores_for_defender() {
        let safe: Board = ". . .\n. A .\n. . .".parse().unwrap();
        let atari: Board = "D . .\nA D .\nD . .".parse().unwrap();
        let group_only = |b: &Board| {
            groups(b)
                .iter()
                .filter(|g| g.side == Side::Attacker)
                .map(attacker_group_score)
                .sum::<i32>()
        };
        assert_eq!(group_only(&safe), -25 - 60);
        assert_eq!(group_only(&atari), -25 + 400);
        let atari_one: Board = "D . .\nA D .\n. D .".parse().unwrap();
        assert_eq!(group_only(&atari_one), -25 + 120);
    }

    #[test]
    fn test_suppressor_bonus_follows_owner() {
        let ours: Board = "Ds . .\n. . .\n. . .".parse().unwrap();
        let theirs: Board = "As . .\n. . .\n. . .".parse().unwrap();
        let plain_d: Board = "D . .\n. . .\n. . .".parse().unwrap();
        let plain_a: Board = "A . .\n. . .\n. . .".parse().unwrap();
        assert_eq!(evaluate(&ours) - evaluate(&plain_d), 20);
        assert_eq!(evaluate(&theirs) - evaluate(&plain_a), -20);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let board: Board = "A D R .\n. Dv As .\n. . Ab .\nR . . D".parse().unwrap();
        assert_eq!(evaluate(&board), evaluate(&board.clone()));
    }
}

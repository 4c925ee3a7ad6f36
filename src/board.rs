//! Grid primitives: cells, occupants, abilities, and the board itself.
//!
//! A [`Board`] is a square, row-major vector of [`Cell`]s. Boards are plain
//! values; the rules clone them before mutating so history snapshots never
//! alias live state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DIRECTIONS;

/// A board coordinate as `(row, column)`.
pub type Point = (usize, usize);

/// One of the two players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    /// The occupant a freshly placed stone of this side gets.
    pub fn stone(self) -> Occupant {
        match self {
            Side::Attacker => Occupant::Attacker,
            Side::Defender => Occupant::Defender,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Attacker => write!(f, "attacker"),
            Side::Defender => write!(f, "defender"),
        }
    }
}

/// What sits on a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupant {
    #[default]
    Empty,
    Attacker,
    Defender,
    /// Reinforcement faction, allied with the defender.
    Resistance,
    /// Permanently destroyed cell; never occupiable, never a liberty.
    Void,
}

impl Occupant {
    /// The side a stone fights for. Resistance merges with the defender.
    pub fn allegiance(self) -> Option<Side> {
        match self {
            Occupant::Attacker => Some(Side::Attacker),
            Occupant::Defender | Occupant::Resistance => Some(Side::Defender),
            Occupant::Empty | Occupant::Void => None,
        }
    }

    pub fn is_stone(self) -> bool {
        self.allegiance().is_some()
    }
}

/// Special stone abilities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Viral,
    Suppressor,
    Beam,
    Swap,
}

impl Ability {
    pub const ALL: [Ability; 4] = [
        Ability::Viral,
        Ability::Suppressor,
        Ability::Beam,
        Ability::Swap,
    ];

    fn bit(self) -> u8 {
        match self {
            Ability::Viral => 1,
            Ability::Suppressor => 2,
            Ability::Beam => 4,
            Ability::Swap => 8,
        }
    }

    /// Single-letter tag used by board diagrams and the text protocol.
    pub fn letter(self) -> char {
        match self {
            Ability::Viral => 'v',
            Ability::Suppressor => 's',
            Ability::Beam => 'b',
            Ability::Swap => 'w',
        }
    }

    pub fn from_letter(c: char) -> Option<Ability> {
        Ability::ALL
            .into_iter()
            .find(|a| a.letter() == c.to_ascii_lowercase())
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ability::Viral => "viral",
            Ability::Suppressor => "suppressor",
            Ability::Beam => "beam",
            Ability::Swap => "swap",
        };
        f.write_str(name)
    }
}

impl FromStr for Ability {
    type Err = BoardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Ability::ALL
            .into_iter()
            .find(|a| a.to_string() == lower)
            .or_else(|| {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ability::from_letter(c),
                    _ => None,
                }
            })
            .ok_or_else(|| BoardParseError::UnknownAbility(s.to_string()))
    }
}

/// A small set of abilities attached to one stone.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Ability>", into = "Vec<Ability>")]
pub struct AbilitySet(u8);

impl AbilitySet {
    pub const EMPTY: AbilitySet = AbilitySet(0);

    pub fn only(ability: Ability) -> Self {
        AbilitySet(ability.bit())
    }

    pub fn contains(self, ability: Ability) -> bool {
        self.0 & ability.bit() != 0
    }

    pub fn insert(&mut self, ability: Ability) {
        self.0 |= ability.bit();
    }

    pub fn remove(&mut self, ability: Ability) {
        self.0 &= !ability.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Ability> {
        Ability::ALL.into_iter().filter(move |a| self.contains(*a))
    }
}

impl From<Vec<Ability>> for AbilitySet {
    fn from(list: Vec<Ability>) -> Self {
        let mut set = AbilitySet::EMPTY;
        for a in list {
            set.insert(a);
        }
        set
    }
}

impl From<AbilitySet> for Vec<Ability> {
    fn from(set: AbilitySet) -> Self {
        set.iter().collect()
    }
}

/// Temporary placement restriction left behind by a destroyed stone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Residue {
    /// The side whose stone was destroyed here; only this side is blocked.
    pub owner: Side,
    pub turn_created: u32,
}

/// One grid position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub occupant: Occupant,
    #[serde(default, skip_serializing_if = "AbilitySet::is_empty")]
    pub abilities: AbilitySet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residue: Option<Residue>,
    /// Identity token of the stone instance (animation tracking only).
    #[serde(default)]
    pub id: u32,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.occupant == Occupant::Empty
    }

    pub fn has(&self, ability: Ability) -> bool {
        self.abilities.contains(ability)
    }

    pub fn allegiance(&self) -> Option<Side> {
        self.occupant.allegiance()
    }

    /// Empty the cell, dropping abilities and residue.
    pub fn clear(&mut self) {
        *self = Cell::default();
    }
}

/// A square grid of cells, fixed size for the whole game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    /// Next stone identity token to hand out.
    #[serde(default)]
    next_id: u32,
}

impl Board {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "board size must be positive");
        Self {
            size,
            cells: vec![Cell::default(); size * size],
            next_id: 1,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, (r, c): Point) -> usize {
        assert!(
            r < self.size && c < self.size,
            "point ({r},{c}) outside {0}x{0} board",
            self.size
        );
        r * self.size + c
    }

    pub fn in_bounds(&self, (r, c): Point) -> bool {
        r < self.size && c < self.size
    }

    /// Borrow a cell. Panics when `p` is off the board.
    pub fn get(&self, p: Point) -> &Cell {
        &self.cells[self.idx(p)]
    }

    pub fn get_mut(&mut self, p: Point) -> &mut Cell {
        let i = self.idx(p);
        &mut self.cells[i]
    }

    /// All coordinates in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let s = self.size;
        (0..s).flat_map(move |r| (0..s).map(move |c| (r, c)))
    }

    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + use<> {
        neighbors(p, self.size)
    }

    /// Put a new stone on `p`, replacing whatever was there.
    pub fn place(&mut self, p: Point, occupant: Occupant, abilities: AbilitySet) {
        let id = self.next_id;
        self.next_id += 1;
        *self.get_mut(p) = Cell {
            occupant,
            abilities,
            residue: None,
            id,
        };
    }

    pub fn count(&self, occupant: Occupant) -> usize {
        self.cells.iter().filter(|c| c.occupant == occupant).count()
    }

    pub fn count_side(&self, side: Side) -> usize {
        self.cells
            .iter()
            .filter(|c| c.allegiance() == Some(side))
            .count()
    }

    pub fn empty_points(&self) -> Vec<Point> {
        self.points().filter(|&p| self.get(p).is_empty()).collect()
    }

    /// Compare stones and abilities only, ignoring identity tokens and residue.
    pub fn same_layout(&self, other: &Board) -> bool {
        self.size == other.size
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.occupant == b.occupant && a.abilities == b.abilities)
    }
}

/// Up to four axis-adjacent in-bounds coordinates. No diagonals, no wraparound.
pub fn neighbors((r, c): Point, size: usize) -> impl Iterator<Item = Point> {
    DIRECTIONS.into_iter().filter_map(move |(dr, dc)| {
        let nr = r.checked_add_signed(dr)?;
        let nc = c.checked_add_signed(dc)?;
        (nr < size && nc < size).then_some((nr, nc))
    })
}

/// Manhattan distance between two points.
pub fn manhattan(a: Point, b: Point) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardParseError {
    #[error("board diagram is empty")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown cell token `{0}`")]
    UnknownCell(String),
    #[error("unknown ability `{0}`")]
    UnknownAbility(String),
}

/// Parse a diagram of whitespace-separated cell tokens, one row per line.
///
/// The first character of a token is the occupant (`.` empty, `A` attacker,
/// `D` defender, `R` resistance, `#` void); any following letters are
/// abilities (`v` viral, `s` suppressor, `b` beam, `w` swap).
impl FromStr for Board {
    type Err = BoardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<Vec<&str>> = s
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>())
            .filter(|r| !r.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(BoardParseError::Empty);
        }
        let size = rows.len();
        let mut board = Board::new(size);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(BoardParseError::Ragged {
                    row: r,
                    found: row.len(),
                    expected: size,
                });
            }
            for (c, token) in row.iter().enumerate() {
                let mut chars = token.chars();
                let occupant = match chars.next() {
                    Some('.') => Occupant::Empty,
                    Some('A') => Occupant::Attacker,
                    Some('D') => Occupant::Defender,
                    Some('R') => Occupant::Resistance,
                    Some('#') => Occupant::Void,
                    _ => return Err(BoardParseError::UnknownCell(token.to_string())),
                };
                let mut abilities = AbilitySet::EMPTY;
                for ch in chars {
                    let a = Ability::from_letter(ch)
                        .ok_or_else(|| BoardParseError::UnknownAbility(ch.to_string()))?;
                    abilities.insert(a);
                }
                if occupant.is_stone() {
                    board.place((r, c), occupant, abilities);
                } else if !abilities.is_empty() {
                    return Err(BoardParseError::UnknownCell(token.to_string()));
                } else {
                    board.get_mut((r, c)).occupant = occupant;
                }
            }
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for c in 0..self.size {
            write!(f, " {} ", (b'A' + c as u8) as char)?;
        }
        writeln!(f)?;
        for r in 0..self.size {
            write!(f, "{:>2}", r + 1)?;
            for c in 0..self.size {
                let cell = self.get((r, c));
                let ch = match cell.occupant {
                    Occupant::Empty if cell.residue.is_some() => '~',
                    Occupant::Empty => '.',
                    Occupant::Attacker => 'A',
                    Occupant::Defender => 'D',
                    Occupant::Resistance => 'R',
                    Occupant::Void => '#',
                };
                let tag = cell.abilities.iter().next().map_or(' ', Ability::letter);
                write!(f, " {ch}{tag}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_corner_and_center() {
        let corner: Vec<Point> = neighbors((0, 0), 5).collect();
        assert_eq!(corner, vec![(0, 1), (1, 0)]);

        let center: Vec<Point> = neighbors((2, 2), 5).collect();
        assert_eq!(center, vec![(1, 2), (2, 3), (3, 2), (2, 1)]);

        let edge: Vec<Point> = neighbors((4, 2), 5).collect();
        assert_eq!(edge.len(), 3, "no wraparound past the bottom edge");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut board = Board::new(4);
        board.place((1, 1), Occupant::Attacker, AbilitySet::only(Ability::Beam));
        let copy = board.clone();
        board.get_mut((1, 1)).abilities.remove(Ability::Beam);
        board.get_mut((1, 1)).residue = Some(Residue {
            owner: Side::Attacker,
            turn_created: 3,
        });
        assert!(copy.get((1, 1)).has(Ability::Beam));
        assert!(copy.get((1, 1)).residue.is_none());
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds_panics() {
        let board = Board::new(4);
        let _ = board.get((4, 0));
    }

    #[test]
    fn test_parse_diagram() {
        let board: Board = "A  .  Dv\n. # .\nR . Abs".parse().unwrap();
        assert_eq!(board.size(), 3);
        assert_eq!(board.get((0, 0)).occupant, Occupant::Attacker);
        assert!(board.get((0, 2)).has(Ability::Viral));
        assert_eq!(board.get((1, 1)).occupant, Occupant::Void);
        assert_eq!(board.get((2, 0)).occupant, Occupant::Resistance);
        let cell = board.get((2, 2));
        assert!(cell.has(Ability::Beam) && cell.has(Ability::Suppressor));
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = "A .\n. . .".parse::<Board>().unwrap_err();
        assert!(matches!(err, BoardParseError::Ragged { .. }));
    }

    #[test]
    fn test_same_layout_ignores_ids() {
        let a: Board = "A .\n. D".parse().unwrap();
        let mut b = Board::new(2);
        b.place((1, 1), Occupant::Defender, AbilitySet::EMPTY);
        b.place((0, 0), Occupant::Attacker, AbilitySet::EMPTY);
        assert_ne!(a, b);
        assert!(a.same_layout(&b));
    }

    #[test]
    fn test_ability_parse() {
        assert_eq!("beam".parse::<Ability>().unwrap(), Ability::Beam);
        assert_eq!("W".parse::<Ability>().unwrap(), Ability::Swap);
        assert!("laser".parse::<Ability>().is_err());
    }
}

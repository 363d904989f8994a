use crate::cube::*;
use crate::solver::SolveError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: Face,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Single,
    Reverse,
    Double,
}

impl Direction {
    fn index(self) -> usize {
        match self {
            Direction::Single => 0,
            Direction::Reverse => 1,
            Direction::Double => 2,
        }
    }

    /// Quarter turns applied by this direction.
    pub fn turns(self) -> usize {
        match self {
            Direction::Single => 1,
            Direction::Double => 2,
            Direction::Reverse => 3,
        }
    }
}

impl Move {
    /// All 18 face turns, in `index()` order.
    pub fn all() -> impl Iterator<Item = Move> {
        enum_iterator::all::<Face>().flat_map(|face| {
            [Direction::Single, Direction::Reverse, Direction::Double]
                .into_iter()
                .map(move |direction| Move { face, direction })
        })
    }

    /// Stable position in [0, 18), used as a table column.
    pub fn index(self) -> usize {
        self.face.index() * 3 + self.direction.index()
    }

    pub fn inverse(self) -> Move {
        let direction = match self.direction {
            Direction::Single => Direction::Reverse,
            Direction::Reverse => Direction::Single,
            Direction::Double => Direction::Double,
        };
        Move {
            face: self.face,
            direction,
        }
    }

    /// Whether this move is worth trying directly after `last`. Rules out a
    /// second turn of the same face and fixes one canonical order per
    /// opposite-face pair, since those commute.
    pub fn could_follow(self, last: &Move) -> bool {
        if self.face == last.face {
            return false;
        }
        !(Face::same_axis(self.face, last.face) && last.face.index() > self.face.index())
    }

    pub fn parse_sequence(s: &str) -> Result<Vec<Move>, SolveError> {
        s.split_whitespace().map(|s| s.parse()).collect()
    }

    pub fn inverse_seq(moves: &[Move]) -> Vec<Move> {
        moves.iter().rev().map(|m| m.inverse()).collect()
    }

    pub fn format_sequence(moves: &[Move]) -> String {
        moves
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl core::str::FromStr for Move {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Move, SolveError> {
        let mut chars = s.chars();
        let face_char = chars
            .next()
            .ok_or_else(|| SolveError::Configuration("empty move token".into()))?;

        let face = match face_char {
            'U' | 'u' => Face::Up,
            'D' | 'd' => Face::Down,
            'F' | 'f' => Face::Front,
            'B' | 'b' => Face::Back,
            'L' | 'l' => Face::Left,
            'R' | 'r' => Face::Right,
            _ => {
                return Err(SolveError::Configuration(format!(
                    "unrecognized face {:?}",
                    face_char
                )))
            }
        };

        let direction = match chars.next() {
            None => Direction::Single,
            Some('\'') => Direction::Reverse,
            Some('2') => Direction::Double,
            Some(c) => {
                return Err(SolveError::Configuration(format!(
                    "unrecognized direction {:?}",
                    c
                )))
            }
        };

        if chars.next().is_some() {
            return Err(SolveError::Configuration(format!(
                "trailing characters in move token {:?}",
                s
            )));
        }

        Ok(Move { face, direction })
    }
}

impl core::fmt::Display for Move {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.face.letter())?;
        match self.direction {
            Direction::Single => Ok(()),
            Direction::Reverse => write!(f, "'"),
            Direction::Double => write!(f, "2"),
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Move {
    fn arbitrary<G: quickcheck::Gen>(g: &mut G) -> Move {
        use rand::Rng;
        let all = Move::all().collect::<Vec<_>>();
        all[g.gen_range(0, all.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single() {
        let m: Move = "R".parse().unwrap();
        assert_eq!(m.face, Face::Right);
        assert_eq!(m.direction, Direction::Single);
    }

    #[test]
    fn parses_reverse_and_double() {
        assert_eq!("F'".parse::<Move>().unwrap().direction, Direction::Reverse);
        assert_eq!("U2".parse::<Move>().unwrap().direction, Direction::Double);
    }

    #[test]
    fn rejects_garbage() {
        assert!("X".parse::<Move>().is_err());
        assert!("R3".parse::<Move>().is_err());
        assert!("R2'".parse::<Move>().is_err());
    }

    #[test]
    fn eighteen_moves_with_distinct_indices() {
        let indices = Move::all().map(|m| m.index()).collect::<Vec<_>>();
        assert_eq!(indices, (0..18).collect::<Vec<_>>());
    }

    #[test]
    fn same_face_cannot_follow() {
        let r: Move = "R".parse().unwrap();
        let r2: Move = "R2".parse().unwrap();
        assert!(!r2.could_follow(&r));
    }

    #[test]
    fn opposite_faces_follow_in_one_order_only() {
        let u: Move = "U".parse().unwrap();
        let d: Move = "D".parse().unwrap();
        assert!(d.could_follow(&u) != u.could_follow(&d));
    }

    #[quickcheck]
    fn display_parse_round_trip(m: Move) -> bool {
        m.to_string().parse::<Move>().unwrap() == m
    }

    #[quickcheck]
    fn inverse_is_involution(m: Move) -> bool {
        m.inverse().inverse() == m
    }
}

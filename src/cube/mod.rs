mod cubie;

pub use cubie::CubieCube as Cube;
pub use cubie::{permutation_parity, MOVE_CUBES};

use enum_iterator::Sequence;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence)]
pub enum Face {
    Up,
    Down,
    Front,
    Back,
    Left,
    Right,
}

impl Face {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Opposite faces share an axis and commute.
    pub fn same_axis(a: Face, b: Face) -> bool {
        a.index() / 2 == b.index() / 2
    }

    pub fn letter(self) -> char {
        match self {
            Face::Up => 'U',
            Face::Down => 'D',
            Face::Front => 'F',
            Face::Back => 'B',
            Face::Left => 'L',
            Face::Right => 'R',
        }
    }
}

use crate::prelude::*;

use lazy_static::lazy_static;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Cube state at the cubie level. Corner positions are numbered URF, UFL,
/// ULB, UBR, DFR, DLF, DBL, DRB; edge positions UR, UF, UL, UB, DR, DF, DL,
/// DB, FR, FL, BL, BR. `corner_perm[i]` is the piece sitting at position `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubieCube {
    pub corner_perm: [u8; 8],
    pub corner_orient: [u8; 8],
    pub edge_perm: [u8; 12],
    pub edge_orient: [u8; 12],
}

impl CubieCube {
    pub fn solved() -> CubieCube {
        CubieCube {
            corner_perm: [0, 1, 2, 3, 4, 5, 6, 7],
            corner_orient: [0; 8],
            edge_perm: [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            edge_orient: [0; 12],
        }
    }

    /// Group composition: the state reached by performing `other` after
    /// `self`. Orientations add along the permutation (mod 3 for corners,
    /// mod 2 for edges).
    pub fn multiply(&self, other: &CubieCube) -> CubieCube {
        let mut result = CubieCube::solved();
        for i in 0..8 {
            let from = other.corner_perm[i] as usize;
            result.corner_perm[i] = self.corner_perm[from];
            result.corner_orient[i] = (self.corner_orient[from] + other.corner_orient[i]) % 3;
        }
        for i in 0..12 {
            let from = other.edge_perm[i] as usize;
            result.edge_perm[i] = self.edge_perm[from];
            result.edge_orient[i] = (self.edge_orient[from] + other.edge_orient[i]) % 2;
        }
        result
    }

    pub fn apply(self, m: Move) -> CubieCube {
        self.multiply(&MOVE_CUBES[m.index()])
    }

    pub fn apply_all(self, moves: impl IntoIterator<Item = Move>) -> CubieCube {
        moves.into_iter().fold(self, CubieCube::apply)
    }

    pub fn is_solved(&self) -> bool {
        *self == CubieCube::solved()
    }

    /// Deterministic scramble. Consecutive turns of the same face are
    /// rejected so the scramble length is not trivially compressible.
    pub fn scramble(n_moves: usize, seed: u64) -> (CubieCube, Vec<Move>) {
        let all = Move::all().collect::<Vec<_>>();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut moves = Vec::with_capacity(n_moves);
        while moves.len() < n_moves {
            let candidate = all[rng.gen_range(0, all.len())];
            if moves.last().map_or(false, |last: &Move| last.face == candidate.face) {
                continue;
            }
            moves.push(candidate);
        }
        (CubieCube::solved().apply_all(moves.iter().cloned()), moves)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks that this state is reachable from solved: both arrays are
    /// permutations, orientations are in range and sum to zero, and the
    /// corner and edge permutations have equal parity.
    pub fn validate(&self) -> Result<(), SolveError> {
        let mut seen_corners = [false; 8];
        for &c in &self.corner_perm {
            if c >= 8 || seen_corners[c as usize] {
                return Err(SolveError::Configuration(format!(
                    "corner permutation is not a permutation: {:?}",
                    self.corner_perm
                )));
            }
            seen_corners[c as usize] = true;
        }

        let mut seen_edges = [false; 12];
        for &e in &self.edge_perm {
            if e >= 12 || seen_edges[e as usize] {
                return Err(SolveError::Configuration(format!(
                    "edge permutation is not a permutation: {:?}",
                    self.edge_perm
                )));
            }
            seen_edges[e as usize] = true;
        }

        if self.corner_orient.iter().any(|&o| o >= 3) {
            return Err(SolveError::Configuration(format!(
                "corner orientation out of range: {:?}",
                self.corner_orient
            )));
        }
        if self.edge_orient.iter().any(|&o| o >= 2) {
            return Err(SolveError::Configuration(format!(
                "edge orientation out of range: {:?}",
                self.edge_orient
            )));
        }

        let twist: u32 = self.corner_orient.iter().map(|&o| o as u32).sum();
        if twist % 3 != 0 {
            return Err(SolveError::Configuration(format!(
                "corner twist sum {} is not divisible by 3",
                twist
            )));
        }
        let flip: u32 = self.edge_orient.iter().map(|&o| o as u32).sum();
        if flip % 2 != 0 {
            return Err(SolveError::Configuration(format!(
                "edge flip sum {} is odd",
                flip
            )));
        }

        if permutation_parity(&self.corner_perm) != permutation_parity(&self.edge_perm) {
            return Err(SolveError::Configuration(
                "corner and edge permutation parities differ".to_string(),
            ));
        }

        Ok(())
    }
}

/// 0 for even permutations, 1 for odd.
pub fn permutation_parity(perm: &[u8]) -> u8 {
    let mut inversions = 0;
    for i in 0..perm.len() {
        for j in (i + 1)..perm.len() {
            if perm[i] > perm[j] {
                inversions += 1;
            }
        }
    }
    inversions % 2
}

// Quarter clockwise turns of each face. `perm[i]` is the position the piece
// now at `i` came from; orientation deltas are picked up by the arriving
// piece.
const BASE_U: CubieCube = CubieCube {
    corner_perm: [3, 0, 1, 2, 4, 5, 6, 7],
    corner_orient: [0; 8],
    edge_perm: [3, 0, 1, 2, 4, 5, 6, 7, 8, 9, 10, 11],
    edge_orient: [0; 12],
};

const BASE_D: CubieCube = CubieCube {
    corner_perm: [0, 1, 2, 3, 5, 6, 7, 4],
    corner_orient: [0; 8],
    edge_perm: [0, 1, 2, 3, 5, 6, 7, 4, 8, 9, 10, 11],
    edge_orient: [0; 12],
};

const BASE_F: CubieCube = CubieCube {
    corner_perm: [1, 5, 2, 3, 0, 4, 6, 7],
    corner_orient: [1, 2, 0, 0, 2, 1, 0, 0],
    edge_perm: [0, 9, 2, 3, 4, 8, 6, 7, 1, 5, 10, 11],
    edge_orient: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
};

const BASE_B: CubieCube = CubieCube {
    corner_perm: [0, 1, 3, 7, 4, 5, 2, 6],
    corner_orient: [0, 0, 1, 2, 0, 0, 2, 1],
    edge_perm: [0, 1, 2, 11, 4, 5, 6, 10, 8, 9, 3, 7],
    edge_orient: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
};

const BASE_L: CubieCube = CubieCube {
    corner_perm: [0, 2, 6, 3, 4, 1, 5, 7],
    corner_orient: [0, 1, 2, 0, 0, 2, 1, 0],
    edge_perm: [0, 1, 10, 3, 4, 5, 9, 7, 8, 2, 6, 11],
    edge_orient: [0; 12],
};

const BASE_R: CubieCube = CubieCube {
    corner_perm: [4, 1, 2, 0, 7, 5, 6, 3],
    corner_orient: [2, 0, 0, 1, 1, 0, 0, 2],
    edge_perm: [8, 1, 2, 3, 11, 5, 6, 7, 4, 9, 10, 0],
    edge_orient: [0; 12],
};

lazy_static! {
    /// The 18 face-turn transformations, indexed by `Move::index()`.
    pub static ref MOVE_CUBES: [CubieCube; 18] = {
        let bases = [BASE_U, BASE_D, BASE_F, BASE_B, BASE_L, BASE_R];
        let mut cubes = [CubieCube::solved(); 18];
        for m in Move::all() {
            let base = &bases[m.face.index()];
            let mut cube = CubieCube::solved();
            for _ in 0..m.direction.turns() {
                cube = cube.multiply(base);
            }
            cubes[m.index()] = cube;
        }
        cubes
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_is_solved() {
        assert!(CubieCube::solved().is_solved());
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        for face in enum_iterator::all::<Face>() {
            let m = Move {
                face,
                direction: Direction::Single,
            };
            let cube = CubieCube::solved().apply_all([m; 4]);
            assert!(cube.is_solved(), "{} repeated four times", m);
        }
    }

    #[test]
    fn double_turn_is_two_singles() {
        for face in enum_iterator::all::<Face>() {
            let single = Move {
                face,
                direction: Direction::Single,
            };
            let double = Move {
                face,
                direction: Direction::Double,
            };
            assert_eq!(
                CubieCube::solved().apply_all([single, single]),
                CubieCube::solved().apply(double),
            );
        }
    }

    #[test]
    fn sexy_move_has_order_six() {
        let seq = Move::parse_sequence("R U R' U'").unwrap();
        let mut cube = CubieCube::solved();
        for _ in 0..6 {
            cube = cube.apply_all(seq.iter().cloned());
        }
        assert!(cube.is_solved());
    }

    #[test]
    fn scramble_is_deterministic() {
        let (a, moves_a) = CubieCube::scramble(25, 7);
        let (b, moves_b) = CubieCube::scramble(25, 7);
        assert_eq!(a, b);
        assert_eq!(moves_a, moves_b);
        let (c, _) = CubieCube::scramble(25, 8);
        assert_ne!(a, c);
    }

    #[test]
    fn scramble_never_repeats_a_face() {
        let (_, moves) = CubieCube::scramble(200, 42);
        for pair in moves.windows(2) {
            assert_ne!(pair[0].face, pair[1].face);
        }
    }

    #[test]
    fn rejects_single_twisted_corner() {
        let mut cube = CubieCube::solved();
        cube.corner_orient[0] = 1;
        assert!(cube.validate().is_err());
    }

    #[test]
    fn rejects_single_flipped_edge() {
        let mut cube = CubieCube::solved();
        cube.edge_orient[0] = 1;
        assert!(cube.validate().is_err());
    }

    #[test]
    fn rejects_lone_swap() {
        let mut cube = CubieCube::solved();
        cube.edge_perm.swap(0, 1);
        assert!(cube.validate().is_err());
    }

    #[quickcheck]
    fn moves_preserve_validity(moves: Vec<Move>) -> bool {
        CubieCube::solved().apply_all(moves).is_valid()
    }

    #[quickcheck]
    fn move_then_inverse_is_identity(moves: Vec<Move>) -> bool {
        let scrambled = CubieCube::solved().apply_all(moves.iter().cloned());
        scrambled.apply_all(Move::inverse_seq(&moves)).is_solved()
    }

    #[quickcheck]
    fn multiplication_is_associative(a: Vec<Move>, b: Vec<Move>, c: Vec<Move>) -> bool {
        let solved = CubieCube::solved();
        let (a, b, c) = (
            solved.apply_all(a),
            solved.apply_all(b),
            solved.apply_all(c),
        );
        a.multiply(&b).multiply(&c) == a.multiply(&b.multiply(&c))
    }
}

//! Integer projections of cube states and their representative injections.
//!
//! Each coordinate maps a `Cube` into a dense range so table generation can
//! enumerate it; each `set_*` builds a representative cube for a coordinate
//! value, filling the pieces the coordinate does not constrain.

use crate::prelude::*;

pub fn factorial(n: usize) -> usize {
    (1..=n).product()
}

pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}

/// Lexicographic rank of a permutation of 0..n.
pub fn permutation_rank(perm: &[u8]) -> usize {
    let n = perm.len();
    let mut rank = 0;
    for i in 0..n {
        rank *= n - i;
        rank += perm[i + 1..].iter().filter(|&&x| x < perm[i]).count();
    }
    rank
}

pub fn permutation_unrank(mut rank: usize, n: usize) -> Vec<u8> {
    let mut remaining: Vec<u8> = (0..n as u8).collect();
    let mut perm = Vec::with_capacity(n);
    for i in 0..n {
        let f = factorial(n - 1 - i);
        perm.push(remaining.remove(rank / f));
        rank %= f;
    }
    perm
}

/// Rank of a k-subset given as a mark per position, in the combinatorial
/// number system (descending binomials).
pub fn combination_rank(marked: &[bool], k: usize) -> usize {
    let mut rank = 0;
    let mut count = k;
    for i in (0..marked.len()).rev() {
        if marked[i] {
            rank += binomial(i, count);
            count -= 1;
            if count == 0 {
                break;
            }
        }
    }
    rank
}

pub fn combination_unrank(mut rank: usize, n: usize, k: usize) -> Vec<bool> {
    let mut marked = vec![false; n];
    let mut count = k;
    for i in (0..n).rev() {
        let b = binomial(i, count);
        if rank >= b {
            marked[i] = true;
            rank -= b;
            count -= 1;
            if count == 0 {
                break;
            }
        }
    }
    marked
}

// --- orientation coordinates ---

/// Base-3 fold of the first seven corner twists; the eighth is parity.
/// Range [0, 2187).
pub fn corner_orientation(cube: &Cube) -> u16 {
    cube.corner_orient[..7]
        .iter()
        .fold(0, |acc, &o| acc * 3 + o as u16)
}

pub fn set_corner_orientation(cube: &mut Cube, mut coord: u16) {
    let mut total = 0;
    for i in (0..7).rev() {
        cube.corner_orient[i] = (coord % 3) as u8;
        total += cube.corner_orient[i];
        coord /= 3;
    }
    cube.corner_orient[7] = (3 - total % 3) % 3;
}

/// Base-2 fold of the first eleven edge flips; the twelfth is parity.
/// Range [0, 2048).
pub fn edge_orientation(cube: &Cube) -> u16 {
    cube.edge_orient[..11]
        .iter()
        .fold(0, |acc, &o| acc * 2 + o as u16)
}

pub fn set_edge_orientation(cube: &mut Cube, mut coord: u16) {
    let mut total = 0;
    for i in (0..11).rev() {
        cube.edge_orient[i] = (coord % 2) as u8;
        total += cube.edge_orient[i];
        coord /= 2;
    }
    cube.edge_orient[11] = total % 2;
}

// --- combination coordinates ---

/// Which four positions hold the FR/FL/BL/BR edges, ignoring their order.
/// Range [0, 495), with the solved state at 0.
pub fn ud_slice(cube: &Cube) -> u16 {
    let mut marked = [false; 12];
    for i in 0..12 {
        marked[i] = cube.edge_perm[i] >= 8;
    }
    (494 - combination_rank(&marked, 4)) as u16
}

pub fn set_ud_slice(cube: &mut Cube, coord: u16) {
    let marked = combination_unrank(494 - coord as usize, 12, 4);
    let mut slice_piece = 8;
    let mut other_piece = 0;
    for i in 0..12 {
        if marked[i] {
            cube.edge_perm[i] = slice_piece;
            slice_piece += 1;
        } else {
            cube.edge_perm[i] = other_piece;
            other_piece += 1;
        }
    }
}

/// Thistlethwaite tetrad coordinate: which four corner positions hold the
/// URF/ULB/DLF/DRB tetrad. Range [0, 70). The goal value is
/// `corner_tetrad(&Cube::solved())`, not zero.
pub fn corner_tetrad(cube: &Cube) -> u16 {
    let mut marked = [false; 8];
    for i in 0..8 {
        marked[i] = matches!(cube.corner_perm[i], 0 | 2 | 5 | 7);
    }
    combination_rank(&marked, 4) as u16
}

pub fn set_corner_tetrad(cube: &mut Cube, coord: u16) {
    let marked = combination_unrank(coord as usize, 8, 4);
    let tetrad = [0, 2, 5, 7];
    let others = [1, 3, 4, 6];
    let mut t = 0;
    let mut o = 0;
    for i in 0..8 {
        if marked[i] {
            cube.corner_perm[i] = tetrad[t];
            t += 1;
        } else {
            cube.corner_perm[i] = others[o];
            o += 1;
        }
    }
}

/// Which of the eight non-slice positions hold the UF/UB/DF/DB edges.
/// Defined once the FR/FL/BL/BR edges are home (positions 8..12).
/// Range [0, 70); goal value is `mslice_combination(&Cube::solved())`.
pub fn mslice_combination(cube: &Cube) -> u16 {
    let mut marked = [false; 8];
    for i in 0..8 {
        marked[i] = matches!(cube.edge_perm[i], 1 | 3 | 5 | 7);
    }
    combination_rank(&marked, 4) as u16
}

pub fn set_mslice_combination(cube: &mut Cube, coord: u16) {
    let marked = combination_unrank(coord as usize, 8, 4);
    let mslice = [1, 3, 5, 7];
    let others = [0, 2, 4, 6];
    let mut m = 0;
    let mut o = 0;
    for i in 0..8 {
        if marked[i] {
            cube.edge_perm[i] = mslice[m];
            m += 1;
        } else {
            cube.edge_perm[i] = others[o];
            o += 1;
        }
    }
}

// --- permutation coordinates ---

/// Rank of the full corner permutation. Range [0, 40320).
pub fn corner_permutation(cube: &Cube) -> u16 {
    permutation_rank(&cube.corner_perm) as u16
}

pub fn set_corner_permutation(cube: &mut Cube, coord: u16) {
    cube.corner_perm
        .copy_from_slice(&permutation_unrank(coord as usize, 8));
}

/// Rank of the eight U/D-face edges' permutation. Meaningful once the
/// FR/FL/BL/BR edges are home. Range [0, 40320).
pub fn ud_edge_permutation(cube: &Cube) -> u16 {
    permutation_rank(&cube.edge_perm[..8]) as u16
}

pub fn set_ud_edge_permutation(cube: &mut Cube, coord: u16) {
    cube.edge_perm[..8].copy_from_slice(&permutation_unrank(coord as usize, 8));
}

/// Rank of the slice edges' order within their home positions. Range [0, 24).
pub fn slice_permutation(cube: &Cube) -> u16 {
    let normalized: Vec<u8> = cube.edge_perm[8..].iter().map(|&e| e - 8).collect();
    permutation_rank(&normalized) as u16
}

pub fn set_slice_permutation(cube: &mut Cube, coord: u16) {
    for (i, piece) in permutation_unrank(coord as usize, 4).into_iter().enumerate() {
        cube.edge_perm[8 + i] = piece + 8;
    }
}

pub fn corner_parity(cube: &Cube) -> u8 {
    permutation_parity(&cube.corner_perm)
}

/// Rank of the full edge permutation; 12! fits in a `u32`.
pub fn edge_permutation_rank(cube: &Cube) -> u32 {
    permutation_rank(&cube.edge_perm) as u32
}

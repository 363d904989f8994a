//! Korf-style pattern databases: exact distances for a projection of the
//! cube onto a subset of its pieces, packed two states per byte.

mod disk;

use crate::coord;
use crate::prelude::*;

use std::path::Path;

/// Which pieces a database tracks. Corner databases cover all eight
/// corners; edge databases track an explicit subset of at most six edges
/// so their index fits comfortably in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PieceSet {
    Corners,
    Edges(Vec<u8>),
}

impl PieceSet {
    pub fn edges(pieces: Vec<u8>) -> Result<PieceSet, SolveError> {
        if pieces.is_empty() || pieces.len() > 6 {
            return Err(SolveError::Configuration(format!(
                "edge pattern databases track between 1 and 6 edges, got {}",
                pieces.len()
            )));
        }
        for (i, &p) in pieces.iter().enumerate() {
            if p >= 12 || pieces[..i].contains(&p) {
                return Err(SolveError::Configuration(format!(
                    "bad edge subset {:?}",
                    pieces
                )));
            }
        }
        Ok(PieceSet::Edges(pieces))
    }

    pub fn states(&self) -> usize {
        match self {
            PieceSet::Corners => 40320 * 2187,
            PieceSet::Edges(pieces) => {
                let k = pieces.len();
                let placements: usize = (0..k).map(|i| 12 - i).product();
                placements << k
            }
        }
    }

    pub fn file_stem(&self) -> String {
        match self {
            PieceSet::Corners => "corners".to_string(),
            PieceSet::Edges(pieces) => {
                let digits: String = pieces.iter().map(|p| format!("{:x}", p)).collect();
                format!("edges_{}", digits)
            }
        }
    }
}

const UNREACHED: u8 = 0xF;

pub struct PatternDb {
    piece_set: PieceSet,
    states: usize,
    max_depth: u8,
    data: Vec<u8>,
}

impl PatternDb {
    pub fn build(piece_set: PieceSet, budget: &mut TableBudget) -> Result<PatternDb, SolveError> {
        let start = std::time::Instant::now();
        let states = piece_set.states();
        log::info!(
            "Populating pattern database {} ({} states)",
            piece_set.file_stem(),
            states
        );
        budget.charge((states + 1) / 2, &piece_set.file_stem())?;

        let mut db = PatternDb {
            states,
            max_depth: 0,
            data: vec![0xFF; (states + 1) / 2],
            piece_set,
        };
        match db.piece_set.clone() {
            PieceSet::Corners => db.fill_corners(budget)?,
            PieceSet::Edges(pieces) => db.fill_edges(&pieces),
        }

        log::info!(
            "Finished populating pattern database {} (max depth {}), took {:?}",
            db.piece_set.file_stem(),
            db.max_depth,
            start.elapsed()
        );
        Ok(db)
    }

    pub fn piece_set(&self) -> &PieceSet {
        &self.piece_set
    }

    pub fn states(&self) -> usize {
        self.states
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Exact distance to solve the tracked pieces; a lower bound on the
    /// distance to solve the whole cube.
    pub fn estimate(&self, cube: &Cube) -> u8 {
        let index = match &self.piece_set {
            PieceSet::Corners => corner_index(cube),
            PieceSet::Edges(pieces) => edge_index(cube, pieces),
        };
        let depth = get_nibble(&self.data, index);
        debug_assert_ne!(depth, UNREACHED, "lookup of state missing from database");
        depth
    }

    /// BFS over the corner projection, driven by coordinate move tables
    /// instead of full cube states.
    fn fill_corners(&mut self, budget: &mut TableBudget) -> Result<(), SolveError> {
        let moves = Move::all().collect::<Vec<_>>();
        let perm = MoveTable::build(
            "corner_permutation",
            40320,
            &moves,
            coord::corner_permutation,
            coord::set_corner_permutation,
            budget,
        )?;
        let orient = MoveTable::build(
            "corner_orientation",
            2187,
            &moves,
            coord::corner_orientation,
            coord::set_corner_orientation,
            budget,
        )?;

        set_nibble(&mut self.data, 0, 0);
        let mut frontier: Vec<u32> = vec![0];
        let mut depth = 0u8;
        while !frontier.is_empty() {
            depth += 1;
            assert!(depth < UNREACHED, "distance does not fit in a nibble");
            let mut next = Vec::new();
            for &index in &frontier {
                let (p, o) = ((index / 2187) as u16, (index % 2187) as u16);
                for col in 0..moves.len() {
                    let succ = perm.get_col(p, col) as u32 * 2187 + orient.get_col(o, col) as u32;
                    if get_nibble(&self.data, succ as usize) == UNREACHED {
                        set_nibble(&mut self.data, succ as usize, depth);
                        next.push(succ);
                    }
                }
            }
            frontier = next;
            if !frontier.is_empty() {
                self.max_depth = depth;
            }
        }
        Ok(())
    }

    /// BFS over the tracked-edge projection. Transitions use per-move
    /// destination and flip maps; frontier states are index-encoded and
    /// unranked on expansion.
    fn fill_edges(&mut self, pieces: &[u8]) {
        let k = pieces.len();
        let mut dest = [[0u8; 12]; 18];
        let mut flip = [[0u8; 12]; 18];
        for m in Move::all() {
            let cube = &MOVE_CUBES[m.index()];
            for i in 0..12 {
                // The piece at position `ep[i]` arrives at `i` and picks up
                // the move's orientation delta there.
                dest[m.index()][cube.edge_perm[i] as usize] = i as u8;
                flip[m.index()][i] = cube.edge_orient[i];
            }
        }

        let solved_positions: Vec<u8> = pieces.to_vec();
        let solved = edge_pack(&solved_positions, 0, k);
        set_nibble(&mut self.data, solved as usize, 0);
        let mut frontier: Vec<u32> = vec![solved];
        let mut depth = 0u8;
        while !frontier.is_empty() {
            depth += 1;
            assert!(depth < UNREACHED, "distance does not fit in a nibble");
            let mut next = Vec::new();
            for &index in &frontier {
                let (positions, orientations) = edge_unpack(index, k);
                for m in 0..18 {
                    let mut new_positions = [0u8; 6];
                    let mut new_orientations = 0u32;
                    for slot in 0..k {
                        let to = dest[m][positions[slot] as usize];
                        new_positions[slot] = to;
                        let o = (orientations >> slot) & 1;
                        new_orientations |= (o ^ flip[m][to as usize] as u32) << slot;
                    }
                    let succ = edge_pack(&new_positions[..k], new_orientations, k);
                    if get_nibble(&self.data, succ as usize) == UNREACHED {
                        set_nibble(&mut self.data, succ as usize, depth);
                        next.push(succ);
                    }
                }
            }
            frontier = next;
            if !frontier.is_empty() {
                self.max_depth = depth;
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SolveError> {
        disk::save(self, path)
    }

    pub fn load(path: &Path, expected: &PieceSet) -> Result<PatternDb, SolveError> {
        disk::load(path, expected)
    }

    pub(crate) fn from_parts(piece_set: PieceSet, max_depth: u8, data: Vec<u8>) -> PatternDb {
        PatternDb {
            states: piece_set.states(),
            piece_set,
            max_depth,
            data,
        }
    }

    pub(crate) fn raw_data(&self) -> &[u8] {
        &self.data
    }
}

/// A family of databases consulted together. Their tracked pieces overlap
/// in move cost, so estimates combine by max, which stays admissible.
pub struct PatternSet {
    databases: Vec<PatternDb>,
}

impl PatternSet {
    pub fn new(databases: Vec<PatternDb>) -> PatternSet {
        PatternSet { databases }
    }

    /// The classic Korf configuration: all corners plus two six-edge groups.
    pub fn korf_piece_sets() -> Vec<PieceSet> {
        vec![
            PieceSet::Corners,
            PieceSet::Edges(vec![0, 1, 2, 3, 4, 5]),
            PieceSet::Edges(vec![6, 7, 8, 9, 10, 11]),
        ]
    }

    pub fn build(piece_sets: Vec<PieceSet>, budget: &mut TableBudget) -> Result<PatternSet, SolveError> {
        let databases = piece_sets
            .into_iter()
            .map(|ps| PatternDb::build(ps, budget))
            .collect::<Result<_, _>>()?;
        Ok(PatternSet::new(databases))
    }

    /// Loads each database from `dir`, building and caching any that are
    /// missing or unreadable.
    pub fn load_or_build(
        dir: &Path,
        piece_sets: Vec<PieceSet>,
        budget: &mut TableBudget,
    ) -> Result<PatternSet, SolveError> {
        std::fs::create_dir_all(dir)?;
        let mut databases = Vec::with_capacity(piece_sets.len());
        for piece_set in piece_sets {
            let path = dir.join(format!("{}.pdb", piece_set.file_stem()));
            match PatternDb::load(&path, &piece_set) {
                Ok(db) => {
                    log::info!("Loaded pattern database {}", path.display());
                    databases.push(db);
                }
                Err(SolveError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    let db = PatternDb::build(piece_set, budget)?;
                    db.save(&path)?;
                    databases.push(db);
                }
                Err(e) => {
                    log::warn!("Rebuilding {}: {}", path.display(), e);
                    let db = PatternDb::build(piece_set, budget)?;
                    db.save(&path)?;
                    databases.push(db);
                }
            }
        }
        Ok(PatternSet::new(databases))
    }

    pub fn estimate(&self, cube: &Cube) -> u8 {
        self.databases
            .iter()
            .map(|db| db.estimate(cube))
            .max()
            .unwrap_or(0)
    }

    pub fn databases(&self) -> &[PatternDb] {
        &self.databases
    }
}

fn get_nibble(data: &[u8], i: usize) -> u8 {
    (data[i / 2] >> ((i % 2) * 4)) & 0xF
}

fn set_nibble(data: &mut [u8], i: usize, value: u8) {
    let shift = (i % 2) * 4;
    data[i / 2] = (data[i / 2] & !(0xF << shift)) | (value << shift);
}

fn corner_index(cube: &Cube) -> usize {
    coord::corner_permutation(cube) as usize * 2187 + coord::corner_orientation(cube) as usize
}

/// Rank of the tracked pieces' ordered positions in falling bases 12, 11,
/// ..., then the tracked orientation bits.
fn edge_index(cube: &Cube, pieces: &[u8]) -> usize {
    let k = pieces.len();
    let mut positions = [0u8; 6];
    let mut orientations = 0u32;
    for (slot, &piece) in pieces.iter().enumerate() {
        let p = cube
            .edge_perm
            .iter()
            .position(|&e| e == piece)
            .expect("edge pieces are a permutation");
        positions[slot] = p as u8;
        orientations |= (cube.edge_orient[p] as u32) << slot;
    }
    edge_pack(&positions[..k], orientations, k) as usize
}

fn edge_pack(positions: &[u8], orientations: u32, k: usize) -> u32 {
    let mut rank = 0u32;
    for i in 0..k {
        let smaller = positions[..i].iter().filter(|&&q| q < positions[i]).count();
        rank = rank * (12 - i) as u32 + positions[i] as u32 - smaller as u32;
    }
    (rank << k) | orientations
}

fn edge_unpack(index: u32, k: usize) -> ([u8; 6], u32) {
    let orientations = index & ((1 << k) - 1);
    let mut rank = (index >> k) as usize;
    let mut digits = [0usize; 6];
    for i in (0..k).rev() {
        digits[i] = rank % (12 - i);
        rank /= 12 - i;
    }
    let mut positions = [0u8; 6];
    for i in 0..k {
        let mut nth = digits[i];
        for p in 0u8..12 {
            if positions[..i].contains(&p) {
                continue;
            }
            if nth == 0 {
                positions[i] = p;
                break;
            }
            nth -= 1;
        }
    }
    (positions, orientations)
}

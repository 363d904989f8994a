//! Coordinate move tables and BFS pruning tables.
//!
//! A `MoveTable` precomputes a coordinate's successor under each move by
//! injecting a representative cube and pushing it through the cube model. A
//! `PruningTable` holds exact BFS distances-to-goal in coordinate space and
//! is an admissible heuristic for any search over the same move set.

use crate::prelude::*;

use std::collections::VecDeque;

/// Byte budget shared by all table allocations. Charged before allocating;
/// going over is a hard error rather than a silently smaller table.
#[derive(Debug)]
pub struct TableBudget {
    remaining: usize,
}

impl TableBudget {
    pub fn new(bytes: usize) -> TableBudget {
        TableBudget { remaining: bytes }
    }

    pub fn unlimited() -> TableBudget {
        TableBudget {
            remaining: usize::MAX,
        }
    }

    pub fn charge(&mut self, bytes: usize, what: &str) -> Result<(), SolveError> {
        if bytes > self.remaining {
            return Err(SolveError::ResourceExhausted(format!(
                "{} needs {} bytes but only {} remain in the table budget",
                what, bytes, self.remaining
            )));
        }
        self.remaining -= bytes;
        Ok(())
    }
}

impl Default for TableBudget {
    fn default() -> TableBudget {
        // 256 MiB covers every table this crate builds outside the Korf
        // pattern databases, which carry their own budget.
        TableBudget::new(256 * 1024 * 1024)
    }
}

pub struct MoveTable {
    pub name: String,
    moves: Vec<Move>,
    size: usize,
    columns: [u8; 18],
    data: Vec<u16>,
}

impl MoveTable {
    pub fn build(
        name: &str,
        size: usize,
        moves: &[Move],
        extract: impl Fn(&Cube) -> u16,
        inject: impl Fn(&mut Cube, u16),
        budget: &mut TableBudget,
    ) -> Result<MoveTable, SolveError> {
        let start = std::time::Instant::now();
        log::info!("Populating move table {} ({} states)", name, size);
        budget.charge(size * moves.len() * 2, name)?;

        let mut columns = [u8::MAX; 18];
        for (col, m) in moves.iter().enumerate() {
            columns[m.index()] = col as u8;
        }

        let mut data = vec![0u16; size * moves.len()];
        for coord in 0..size {
            let mut cube = Cube::solved();
            inject(&mut cube, coord as u16);
            for (col, &m) in moves.iter().enumerate() {
                data[coord * moves.len() + col] = extract(&cube.apply(m));
            }
        }

        log::info!(
            "Finished populating move table {}, took {:?}",
            name,
            start.elapsed()
        );
        Ok(MoveTable {
            name: name.to_string(),
            moves: moves.to_vec(),
            size,
            columns,
            data,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn get(&self, coord: u16, m: Move) -> u16 {
        let col = self.columns[m.index()];
        debug_assert_ne!(col, u8::MAX, "{} not built for {}", self.name, m);
        self.get_col(coord, col as usize)
    }

    pub fn get_col(&self, coord: u16, col: usize) -> u16 {
        self.data[coord as usize * self.moves.len() + col]
    }
}

pub struct PruningTable {
    pub name: String,
    b_size: usize,
    data: Vec<u8>,
}

impl PruningTable {
    pub const UNREACHED: u8 = u8::MAX;

    /// Exact distances to `goal` in a single coordinate's move graph.
    pub fn build_single(
        name: &str,
        table: &MoveTable,
        goal: u16,
        budget: &mut TableBudget,
    ) -> Result<PruningTable, SolveError> {
        let start = std::time::Instant::now();
        log::info!("Populating pruning table {} ({} states)", name, table.size());
        budget.charge(table.size(), name)?;

        let mut data = vec![Self::UNREACHED; table.size()];
        data[goal as usize] = 0;
        let mut frontier = VecDeque::new();
        frontier.push_back(goal);
        while let Some(coord) = frontier.pop_front() {
            let depth = data[coord as usize];
            for col in 0..table.moves().len() {
                let next = table.get_col(coord, col);
                if data[next as usize] == Self::UNREACHED {
                    data[next as usize] = depth + 1;
                    frontier.push_back(next);
                }
            }
        }

        log::info!(
            "Finished populating pruning table {}, took {:?}",
            name,
            start.elapsed()
        );
        Ok(PruningTable {
            name: name.to_string(),
            b_size: 1,
            data,
        })
    }

    /// Exact distances to `goal` in the product graph of two coordinates
    /// moved in lockstep. Both move tables must cover the same move list.
    pub fn build_pair(
        name: &str,
        a: &MoveTable,
        b: &MoveTable,
        goal: (u16, u16),
        budget: &mut TableBudget,
    ) -> Result<PruningTable, SolveError> {
        assert_eq!(a.moves(), b.moves(), "pair tables need matching move sets");
        let start = std::time::Instant::now();
        let size = a.size() * b.size();
        log::info!("Populating pruning table {} ({} states)", name, size);
        budget.charge(size, name)?;

        let b_size = b.size();
        let mut data = vec![Self::UNREACHED; size];
        let goal_index = goal.0 as usize * b_size + goal.1 as usize;
        data[goal_index] = 0;
        let mut frontier = VecDeque::new();
        frontier.push_back(goal_index as u32);
        while let Some(index) = frontier.pop_front() {
            let depth = data[index as usize];
            let (ca, cb) = (
                (index as usize / b_size) as u16,
                (index as usize % b_size) as u16,
            );
            for col in 0..a.moves().len() {
                let next = a.get_col(ca, col) as usize * b_size + b.get_col(cb, col) as usize;
                if data[next] == Self::UNREACHED {
                    data[next] = depth + 1;
                    frontier.push_back(next as u32);
                }
            }
        }

        log::info!(
            "Finished populating pruning table {}, took {:?}",
            name,
            start.elapsed()
        );
        Ok(PruningTable {
            name: name.to_string(),
            b_size,
            data,
        })
    }

    pub fn single(&self, a: u16) -> u8 {
        debug_assert_eq!(self.b_size, 1);
        self.data[a as usize]
    }

    pub fn pair(&self, a: u16, b: u16) -> u8 {
        self.data[a as usize * self.b_size + b as usize]
    }

    pub fn max_depth(&self) -> u8 {
        self.data
            .iter()
            .filter(|&&d| d != Self::UNREACHED)
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord;

    use std::collections::HashMap;

    fn corner_orientation_table() -> MoveTable {
        MoveTable::build(
            "corner_orientation",
            2187,
            &Move::all().collect::<Vec<_>>(),
            coord::corner_orientation,
            coord::set_corner_orientation,
            &mut TableBudget::unlimited(),
        )
        .unwrap()
    }

    #[test]
    fn move_table_matches_cube_model() {
        let table = corner_orientation_table();
        let cube = cube_with_moves("R U2 F' L D");
        for m in Move::all() {
            assert_eq!(
                table.get(coord::corner_orientation(&cube), m),
                coord::corner_orientation(&cube.apply(m)),
            );
        }
    }

    #[test]
    fn slice_permutation_table_over_subgroup_moves() {
        let moves = Move::parse_sequence("U U' U2 D D' D2 F2 B2 L2 R2").unwrap();
        let table = MoveTable::build(
            "slice_permutation",
            24,
            &moves,
            coord::slice_permutation,
            coord::set_slice_permutation,
            &mut TableBudget::unlimited(),
        )
        .unwrap();
        let cube = cube_with_moves("F2 R2 U D' L2");
        assert_eq!(
            table.get(coord::slice_permutation(&cube), "F2".parse().unwrap()),
            coord::slice_permutation(&cube.apply("F2".parse().unwrap())),
        );
    }

    #[test]
    fn pruning_distances_match_direct_search() {
        let table = corner_orientation_table();
        let pruning =
            PruningTable::build_single("co", &table, 0, &mut TableBudget::unlimited()).unwrap();

        // Independent BFS over raw cubes, keyed by the coordinate.
        let mut distances = HashMap::new();
        distances.insert(0u16, 0u8);
        let mut frontier = VecDeque::new();
        frontier.push_back(Cube::solved());
        while let Some(cube) = frontier.pop_front() {
            let depth = distances[&coord::corner_orientation(&cube)];
            for m in Move::all() {
                let next = cube.apply(m);
                let c = coord::corner_orientation(&next);
                if let std::collections::hash_map::Entry::Vacant(v) = distances.entry(c) {
                    v.insert(depth + 1);
                    frontier.push_back(next);
                }
            }
        }

        for (c, d) in distances {
            assert_eq!(pruning.single(c), d, "coordinate {}", c);
        }
    }

    #[test]
    fn pruning_zero_exactly_at_goal() {
        let table = corner_orientation_table();
        let pruning =
            PruningTable::build_single("co", &table, 0, &mut TableBudget::unlimited()).unwrap();
        assert_eq!(pruning.single(0), 0);
        assert!((1..2187).all(|c| pruning.single(c) > 0));
    }

    #[test]
    fn budget_overrun_is_an_error() {
        let mut budget = TableBudget::new(16);
        let result = MoveTable::build(
            "corner_orientation",
            2187,
            &Move::all().collect::<Vec<_>>(),
            coord::corner_orientation,
            coord::set_corner_orientation,
            &mut budget,
        );
        assert!(matches!(result, Err(SolveError::ResourceExhausted(_))));
    }
}

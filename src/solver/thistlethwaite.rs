//! Four-phase subgroup reduction: orient edges, then orient corners and
//! home the UD slice, then reach the half-turn group, then finish with half
//! turns only. Each phase shrinks the move set; totals are longer than the
//! two-phase or optimal solvers but every phase search is shallow.

use crate::coord;
use crate::prelude::*;

use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};

/// Worst-case phase depths, with a little slack on the later phases.
pub const DEFAULT_DEPTH_BOUNDS: [usize; 4] = [7, 10, 14, 16];

const HALF_TURN_GROUP_SIZE: usize = 663_552;

pub struct Thistlethwaite {
    depth_bounds: [usize; 4],
    phase_moves: [Vec<Move>; 4],

    // Exact edge-orientation distances over all 18 moves.
    eo_prune: PruningTable,
    // Corner orientation x UD slice over the phase-1 move set.
    co_slice_prune: PruningTable,
    // Tetrad x middle-slice x corner parity over the phase-2 move set.
    tetrad_prune: Vec<u8>,
    // Exact distances within the half-turn group, keyed by permutation.
    half_turn: HashMap<u64, u8>,
}

fn half_turn_key(cube: &Cube) -> u64 {
    (coord::corner_permutation(cube) as u64) << 32 | coord::edge_permutation_rank(cube) as u64
}

fn tetrad_index(tetrad: u16, mslice: u16, parity: u8) -> usize {
    (tetrad as usize * 70 + mslice as usize) * 2 + parity as usize
}

impl Thistlethwaite {
    pub fn new(budget: &mut TableBudget) -> Result<Thistlethwaite, SolveError> {
        let all = Move::all().collect::<Vec<_>>();
        let phase1: Vec<Move> = all
            .iter()
            .copied()
            .filter(|m| {
                !matches!(m.face, Face::Front | Face::Back) || m.direction == Direction::Double
            })
            .collect();
        let phase2: Vec<Move> = phase1
            .iter()
            .copied()
            .filter(|m| {
                !matches!(m.face, Face::Left | Face::Right) || m.direction == Direction::Double
            })
            .collect();
        let phase3: Vec<Move> = phase2
            .iter()
            .copied()
            .filter(|m| m.direction == Direction::Double)
            .collect();

        let eo = MoveTable::build(
            "edge_orientation",
            2048,
            &all,
            coord::edge_orientation,
            coord::set_edge_orientation,
            budget,
        )?;
        let eo_prune = PruningTable::build_single("eo", &eo, 0, budget)?;

        let co = MoveTable::build(
            "corner_orientation",
            2187,
            &phase1,
            coord::corner_orientation,
            coord::set_corner_orientation,
            budget,
        )?;
        let slice = MoveTable::build(
            "ud_slice",
            495,
            &phase1,
            coord::ud_slice,
            coord::set_ud_slice,
            budget,
        )?;
        let co_slice_prune = PruningTable::build_pair("co_slice", &co, &slice, (0, 0), budget)?;

        let tetrad_prune = Self::build_tetrad_table(&phase2, budget)?;
        let half_turn = Self::build_half_turn_map(&phase3, budget)?;

        Ok(Thistlethwaite {
            depth_bounds: DEFAULT_DEPTH_BOUNDS,
            phase_moves: [all, phase1, phase2, phase3],
            eo_prune,
            co_slice_prune,
            tetrad_prune,
            half_turn,
        })
    }

    pub fn with_depth_bounds(mut self, bounds: [usize; 4]) -> Thistlethwaite {
        self.depth_bounds = bounds;
        self
    }

    /// BFS distances over tetrad x middle-slice x parity, a lower bound on
    /// reaching the half-turn group: every member projects to the goal
    /// triple.
    fn build_tetrad_table(
        moves: &[Move],
        budget: &mut TableBudget,
    ) -> Result<Vec<u8>, SolveError> {
        let start = std::time::Instant::now();
        log::info!("Populating pruning table tetrad_mslice_parity (9800 states)");
        budget.charge(70 * 70 * 2, "tetrad_mslice_parity")?;

        let tetrad = MoveTable::build(
            "corner_tetrad",
            70,
            moves,
            coord::corner_tetrad,
            coord::set_corner_tetrad,
            budget,
        )?;
        let mslice = MoveTable::build(
            "mslice_combination",
            70,
            moves,
            coord::mslice_combination,
            coord::set_mslice_combination,
            budget,
        )?;

        let solved = Cube::solved();
        let goal = tetrad_index(
            coord::corner_tetrad(&solved),
            coord::mslice_combination(&solved),
            0,
        );
        let mut data = vec![PruningTable::UNREACHED; 70 * 70 * 2];
        data[goal] = 0;
        let mut frontier = VecDeque::new();
        frontier.push_back(goal);
        while let Some(index) = frontier.pop_front() {
            let depth = data[index];
            let parity = (index % 2) as u8;
            let m = ((index / 2) % 70) as u16;
            let t = (index / 140) as u16;
            for (col, mv) in moves.iter().enumerate() {
                // Quarter turns are 4-cycles on the corners and flip parity.
                let flip = (mv.direction != Direction::Double) as u8;
                let next = tetrad_index(
                    tetrad.get_col(t, col),
                    mslice.get_col(m, col),
                    parity ^ flip,
                );
                if data[next] == PruningTable::UNREACHED {
                    data[next] = depth + 1;
                    frontier.push_back(next);
                }
            }
        }

        log::info!(
            "Finished populating pruning table tetrad_mslice_parity, took {:?}",
            start.elapsed()
        );
        Ok(data)
    }

    /// Every state reachable by half turns, with its exact distance. Doubles
    /// leave all orientations alone, so the permutation pair is a complete
    /// key.
    fn build_half_turn_map(
        moves: &[Move],
        budget: &mut TableBudget,
    ) -> Result<HashMap<u64, u8>, SolveError> {
        let start = std::time::Instant::now();
        log::info!(
            "Populating half-turn group map ({} states)",
            HALF_TURN_GROUP_SIZE
        );
        budget.charge(HALF_TURN_GROUP_SIZE * 16, "half_turn_group")?;

        let mut map = HashMap::with_capacity(HALF_TURN_GROUP_SIZE);
        map.insert(half_turn_key(&Cube::solved()), 0u8);
        let mut frontier = VecDeque::new();
        frontier.push_back(Cube::solved());
        while let Some(cube) = frontier.pop_front() {
            let depth = map[&half_turn_key(&cube)];
            for &m in moves {
                let next = cube.apply(m);
                if let std::collections::hash_map::Entry::Vacant(v) =
                    map.entry(half_turn_key(&next))
                {
                    v.insert(depth + 1);
                    frontier.push_back(next);
                }
            }
        }
        debug_assert_eq!(map.len(), HALF_TURN_GROUP_SIZE);

        log::info!(
            "Finished populating half-turn group map, took {:?}",
            start.elapsed()
        );
        Ok(map)
    }

    fn phase_goal(&self, phase: usize, cube: &Cube) -> bool {
        match phase {
            0 => coord::edge_orientation(cube) == 0,
            1 => coord::corner_orientation(cube) == 0 && coord::ud_slice(cube) == 0,
            2 => {
                coord::edge_orientation(cube) == 0
                    && coord::corner_orientation(cube) == 0
                    && self.half_turn.contains_key(&half_turn_key(cube))
            }
            _ => cube.is_solved(),
        }
    }

    fn phase_heuristic(&self, phase: usize, cube: &Cube) -> usize {
        let h = match phase {
            0 => self.eo_prune.single(coord::edge_orientation(cube)),
            1 => self
                .co_slice_prune
                .pair(coord::corner_orientation(cube), coord::ud_slice(cube)),
            2 => {
                self.tetrad_prune[tetrad_index(
                    coord::corner_tetrad(cube),
                    coord::mslice_combination(cube),
                    coord::corner_parity(cube),
                )]
            }
            _ => self
                .half_turn
                .get(&half_turn_key(cube))
                .copied()
                .unwrap_or(PruningTable::UNREACHED),
        };
        h as usize
    }

    fn search_phase(
        &self,
        phase: usize,
        start: &Cube,
        junction: Option<Move>,
        budget: &mut Budget,
    ) -> Result<Vec<Move>, SolveError> {
        let moves = &self.phase_moves[phase];
        for bound in self.phase_heuristic(phase, start).max(1)..=self.depth_bounds[phase] {
            if let Some(solution) = self.bounded_phase(phase, start, bound, moves, junction, budget)?
            {
                return Ok(solution);
            }
        }
        Err(SolveError::SearchExhausted(format!(
            "phase {} found nothing within {} moves",
            phase + 1,
            self.depth_bounds[phase]
        )))
    }

    fn bounded_phase(
        &self,
        phase: usize,
        start: &Cube,
        bound: usize,
        moves: &[Move],
        junction: Option<Move>,
        budget: &mut Budget,
    ) -> Result<Option<Vec<Move>>, SolveError> {
        struct Frame {
            cube: Cube,
            next_move: usize,
        }

        let mut stack = vec![Frame {
            cube: *start,
            next_move: 0,
        }];
        let mut path: SmallVec<[Move; 16]> = SmallVec::new();
        while let Some(top) = stack.last_mut() {
            if top.next_move >= moves.len() {
                stack.pop();
                if !stack.is_empty() {
                    path.pop();
                }
                continue;
            }
            let m = moves[top.next_move];
            top.next_move += 1;

            if let Some(last) = path.last().or(junction.as_ref()) {
                if !m.could_follow(last) {
                    continue;
                }
            }

            budget.tick()?;
            let next = top.cube.apply(m);
            if self.phase_goal(phase, &next) {
                path.push(m);
                return Ok(Some(path.to_vec()));
            }
            let g = path.len() + 1;
            // The projections can estimate zero off-goal, so cap the depth
            // explicitly as well.
            if g == bound || g + self.phase_heuristic(phase, &next) > bound {
                continue;
            }
            path.push(m);
            stack.push(Frame {
                cube: next,
                next_move: 0,
            });
        }
        Ok(None)
    }
}

impl Solver for Thistlethwaite {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Thistlethwaite
    }

    fn solve(&self, cube: &Cube, config: &SolveConfig) -> Result<SolverResult, SolveError> {
        let mut budget = Budget::new(config);
        if let Some(result) = super::presolve(self.algorithm(), cube, &budget)? {
            return Ok(result);
        }

        let mut solution: Vec<Move> = Vec::new();
        let mut current = *cube;
        for phase in 0..4 {
            if self.phase_goal(phase, &current) {
                continue;
            }
            let part = self.search_phase(phase, &current, solution.last().copied(), &mut budget)?;
            log::info!(
                "Phase {} done in {} moves: {}",
                phase + 1,
                part.len(),
                Move::format_sequence(&part)
            );
            current = current.apply_all(part.iter().cloned());
            solution.extend(part);
        }

        if solution.len() > config.max_depth {
            return Err(SolveError::SearchExhausted(format!(
                "solution takes {} moves, over the {} cap",
                solution.len(),
                config.max_depth
            )));
        }
        Ok(SolverResult {
            algorithm: self.algorithm(),
            solution,
            nodes_expanded: budget.nodes(),
            elapsed: budget.elapsed(),
            // Subgroup reduction seldom finds shortest solutions and never
            // proves them.
            optimal: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lazy_static::lazy_static;

    lazy_static! {
        static ref SOLVER: Thistlethwaite =
            Thistlethwaite::new(&mut TableBudget::default()).unwrap();
    }

    #[test]
    fn solved_input_is_trivial() {
        let result = SOLVER.solve(&Cube::solved(), &SolveConfig::default()).unwrap();
        assert!(result.solution.is_empty());
        assert!(result.optimal);
    }

    #[test]
    fn half_turn_group_has_known_order() {
        assert_eq!(SOLVER.half_turn.len(), HALF_TURN_GROUP_SIZE);
    }

    #[test]
    fn undoes_a_single_move() {
        let cube = cube_with_moves("B2");
        let result = SOLVER.solve(&cube, &SolveConfig::default()).unwrap();
        assert_solves(&cube, &result.solution);
        assert!(!result.optimal);
    }

    #[test]
    fn half_turn_scrambles_skip_to_the_last_phase() {
        let cube = cube_with_moves("U2 R2 F2 D2 L2 B2 U2 R2");
        assert!(SOLVER.phase_goal(2, &cube));
        let result = SOLVER.solve(&cube, &SolveConfig::default()).unwrap();
        assert_solves(&cube, &result.solution);
        assert!(result.solution.iter().all(|m| m.direction == Direction::Double));
    }

    #[test]
    fn solves_seeded_scrambles() {
        for seed in 0..3 {
            let (cube, _) = Cube::scramble(20, seed);
            let result = SOLVER.solve(&cube, &SolveConfig::default()).unwrap();
            assert_solves(&cube, &result.solution);
            let cap: usize = DEFAULT_DEPTH_BOUNDS.iter().sum();
            assert!(result.solution.len() <= cap);
        }
    }

    #[test]
    fn phase_goals_nest() {
        let (cube, _) = Cube::scramble(25, 11);
        let result = SOLVER.solve(&cube, &SolveConfig::default()).unwrap();

        // Replay the solution and confirm each subgroup, once entered, is
        // never left.
        let mut current = cube;
        let mut reached = [false; 3];
        for m in &result.solution {
            current = current.apply(*m);
            for phase in 0..3 {
                if reached[phase] {
                    assert!(SOLVER.phase_goal(phase, &current));
                } else {
                    reached[phase] = SOLVER.phase_goal(phase, &current);
                }
            }
        }
        assert!(current.is_solved());
    }

    #[test]
    fn depth_cap_fails_instead_of_lying() {
        let (cube, _) = Cube::scramble(20, 3);
        let config = SolveConfig {
            max_depth: 5,
            ..SolveConfig::default()
        };
        assert!(matches!(
            SOLVER.solve(&cube, &config),
            Err(SolveError::SearchExhausted(_))
        ));
    }

    #[test]
    fn tight_phase_bounds_fail_cleanly() {
        let restricted = Thistlethwaite::new(&mut TableBudget::default())
            .unwrap()
            .with_depth_bounds([1, 1, 1, 1]);
        let (cube, _) = Cube::scramble(20, 5);
        assert!(matches!(
            restricted.solve(&cube, &SolveConfig::default()),
            Err(SolveError::SearchExhausted(_))
        ));
    }
}

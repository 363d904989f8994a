//! Two-phase solving: reduce to the <U, D, F2, B2, L2, R2> subgroup, then
//! finish inside it. Retrying phase 1 at increasing exact lengths trades
//! time for shorter totals, and proves optimality once the phase-1 length
//! catches up with the best total found.

use crate::coord;
use crate::prelude::*;

use smallvec::SmallVec;

// Worst-case phase distances; deeper bounds cannot help.
const MAX_PHASE1: usize = 12;
const MAX_PHASE2: usize = 18;

pub struct Kociemba {
    all_moves: Vec<Move>,
    phase2_moves: Vec<Move>,

    co: MoveTable,
    eo: MoveTable,
    slice: MoveTable,
    cp: MoveTable,
    ep: MoveTable,
    sp: MoveTable,

    co_slice: PruningTable,
    eo_slice: PruningTable,
    cp_sp: PruningTable,
    ep_sp: PruningTable,
}

struct Frame {
    a: u16,
    b: u16,
    c: u16,
    next_move: usize,
}

impl Frame {
    fn at(a: u16, b: u16, c: u16) -> Frame {
        Frame {
            a,
            b,
            c,
            next_move: 0,
        }
    }
}

/// The ten moves that keep a cube inside G1.
fn phase2_moves() -> Vec<Move> {
    Move::all()
        .filter(|m| matches!(m.face, Face::Up | Face::Down) || m.direction == Direction::Double)
        .collect()
}

impl Kociemba {
    pub fn new(budget: &mut TableBudget) -> Result<Kociemba, SolveError> {
        let all_moves = Move::all().collect::<Vec<_>>();
        let p2_moves = phase2_moves();

        let co = MoveTable::build(
            "corner_orientation",
            2187,
            &all_moves,
            coord::corner_orientation,
            coord::set_corner_orientation,
            budget,
        )?;
        let eo = MoveTable::build(
            "edge_orientation",
            2048,
            &all_moves,
            coord::edge_orientation,
            coord::set_edge_orientation,
            budget,
        )?;
        let slice = MoveTable::build(
            "ud_slice",
            495,
            &all_moves,
            coord::ud_slice,
            coord::set_ud_slice,
            budget,
        )?;
        let cp = MoveTable::build(
            "corner_permutation",
            40320,
            &p2_moves,
            coord::corner_permutation,
            coord::set_corner_permutation,
            budget,
        )?;
        let ep = MoveTable::build(
            "ud_edge_permutation",
            40320,
            &p2_moves,
            coord::ud_edge_permutation,
            coord::set_ud_edge_permutation,
            budget,
        )?;
        let sp = MoveTable::build(
            "slice_permutation",
            24,
            &p2_moves,
            coord::slice_permutation,
            coord::set_slice_permutation,
            budget,
        )?;

        let co_slice = PruningTable::build_pair("co_slice", &co, &slice, (0, 0), budget)?;
        let eo_slice = PruningTable::build_pair("eo_slice", &eo, &slice, (0, 0), budget)?;
        let cp_sp = PruningTable::build_pair("cp_sp", &cp, &sp, (0, 0), budget)?;
        let ep_sp = PruningTable::build_pair("ep_sp", &ep, &sp, (0, 0), budget)?;

        Ok(Kociemba {
            all_moves,
            phase2_moves: p2_moves,
            co,
            eo,
            slice,
            cp,
            ep,
            sp,
            co_slice,
            eo_slice,
            cp_sp,
            ep_sp,
        })
    }

    fn h1(&self, co: u16, eo: u16, slice: u16) -> usize {
        self.co_slice
            .pair(co, slice)
            .max(self.eo_slice.pair(eo, slice)) as usize
    }

    fn h2(&self, cp: u16, ep: u16, sp: u16) -> usize {
        self.cp_sp.pair(cp, sp).max(self.ep_sp.pair(ep, sp)) as usize
    }

    /// Visits every sequence of exactly `bound` moves that puts `cube` into
    /// G1, handing each to a phase-2 completion. Sequences passing through
    /// G1 early are expanded further; only exact-length arrivals count, so
    /// successive bounds never revisit a sequence.
    fn enumerate_phase1(
        &self,
        cube: &Cube,
        bound: usize,
        best: &mut Option<Vec<Move>>,
        budget: &mut Budget,
        config: &SolveConfig,
    ) -> Result<(), SolveError> {
        let start = (
            coord::corner_orientation(cube),
            coord::edge_orientation(cube),
            coord::ud_slice(cube),
        );
        if bound == 0 {
            if start == (0, 0, 0) {
                self.complete_phase2(cube, &[], best, budget, config)?;
            }
            return Ok(());
        }

        let mut stack = vec![Frame::at(start.0, start.1, start.2)];
        let mut path: SmallVec<[Move; 12]> = SmallVec::new();
        while let Some(top) = stack.last_mut() {
            if top.next_move >= self.all_moves.len() {
                stack.pop();
                if !stack.is_empty() {
                    path.pop();
                }
                continue;
            }
            let col = top.next_move;
            let m = self.all_moves[col];
            top.next_move += 1;

            if let Some(last) = path.last() {
                if !m.could_follow(last) {
                    continue;
                }
            }

            budget.tick()?;
            let co = self.co.get_col(top.a, col);
            let eo = self.eo.get_col(top.b, col);
            let slice = self.slice.get_col(top.c, col);
            let g = path.len() + 1;
            if g + self.h1(co, eo, slice) > bound {
                continue;
            }
            if g == bound {
                // The heuristic is zero exactly on G1, so surviving the
                // prune at full depth means this is a phase-1 solution.
                path.push(m);
                self.complete_phase2(cube, &path, best, budget, config)?;
                path.pop();
                continue;
            }
            path.push(m);
            stack.push(Frame::at(co, eo, slice));
        }
        Ok(())
    }

    fn complete_phase2(
        &self,
        cube: &Cube,
        prefix: &[Move],
        best: &mut Option<Vec<Move>>,
        budget: &mut Budget,
        config: &SolveConfig,
    ) -> Result<(), SolveError> {
        let at_g1 = cube.apply_all(prefix.iter().cloned());
        let cp = coord::corner_permutation(&at_g1);
        let ep = coord::ud_edge_permutation(&at_g1);
        let sp = coord::slice_permutation(&at_g1);

        // Only totals that beat the current best are worth finding.
        let best_len = best.as_ref().map(|b| b.len()).unwrap_or(usize::MAX);
        let cap_total = best_len.saturating_sub(1).min(config.max_depth);
        if cap_total < prefix.len() {
            return Ok(());
        }

        if (cp, ep, sp) == (0, 0, 0) {
            *best = Some(prefix.to_vec());
            return Ok(());
        }

        let cap = (cap_total - prefix.len()).min(MAX_PHASE2);
        for bound in self.h2(cp, ep, sp).max(1)..=cap {
            if let Some(completion) =
                self.phase2_search(cp, ep, sp, bound, prefix.last().copied(), budget)?
            {
                let mut solution = prefix.to_vec();
                solution.extend(completion);
                log::info!(
                    "Improved to {} moves ({} phase 1)",
                    solution.len(),
                    prefix.len()
                );
                *best = Some(solution);
                return Ok(());
            }
        }
        Ok(())
    }

    fn phase2_search(
        &self,
        cp: u16,
        ep: u16,
        sp: u16,
        bound: usize,
        junction: Option<Move>,
        budget: &mut Budget,
    ) -> Result<Option<SmallVec<[Move; 18]>>, SolveError> {
        let mut stack = vec![Frame::at(cp, ep, sp)];
        let mut path: SmallVec<[Move; 18]> = SmallVec::new();
        while let Some(top) = stack.last_mut() {
            if top.next_move >= self.phase2_moves.len() {
                stack.pop();
                if !stack.is_empty() {
                    path.pop();
                }
                continue;
            }
            let col = top.next_move;
            let m = self.phase2_moves[col];
            top.next_move += 1;

            // The phase-1 tail is the previous move at the first ply.
            if let Some(last) = path.last().or(junction.as_ref()) {
                if !m.could_follow(last) {
                    continue;
                }
            }

            budget.tick()?;
            let cp = self.cp.get_col(top.a, col);
            let ep = self.ep.get_col(top.b, col);
            let sp = self.sp.get_col(top.c, col);
            if (cp, ep, sp) == (0, 0, 0) {
                path.push(m);
                return Ok(Some(path));
            }
            let g = path.len() + 1;
            if g + self.h2(cp, ep, sp) > bound {
                continue;
            }
            path.push(m);
            stack.push(Frame::at(cp, ep, sp));
        }
        Ok(None)
    }
}

impl Solver for Kociemba {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Kociemba
    }

    fn solve(&self, cube: &Cube, config: &SolveConfig) -> Result<SolverResult, SolveError> {
        let mut budget = Budget::new(config);
        if let Some(result) = super::presolve(self.algorithm(), cube, &budget)? {
            return Ok(result);
        }

        let mut best: Option<Vec<Move>> = None;
        let mut proven = false;
        let h1 = self.h1(
            coord::corner_orientation(cube),
            coord::edge_orientation(cube),
            coord::ud_slice(cube),
        );

        let mut p1_bound = h1;
        loop {
            if let Some(b) = &best {
                if p1_bound >= b.len() {
                    // Every shorter total would have shown up at a shorter
                    // phase-1 length, so the best is optimal.
                    proven = true;
                    break;
                }
            }
            if p1_bound > MAX_PHASE1.min(config.max_depth) {
                break;
            }
            if budget.expired() {
                break;
            }
            log::info!("Enumerating phase-1 solutions of length {}", p1_bound);
            match self.enumerate_phase1(cube, p1_bound, &mut best, &mut budget, config) {
                Ok(()) => {}
                Err(SolveError::SearchExhausted(_)) if best.is_some() => break,
                Err(e) => return Err(e),
            }
            p1_bound += 1;
        }

        if config.optimal_only && !proven {
            return Err(SolveError::SearchExhausted(
                "could not prove optimality within the configured budget".to_string(),
            ));
        }
        let solution = best.ok_or_else(|| {
            SolveError::SearchExhausted(format!(
                "no solution within {} moves",
                config.max_depth
            ))
        })?;
        Ok(SolverResult {
            algorithm: self.algorithm(),
            solution,
            nodes_expanded: budget.nodes(),
            elapsed: budget.elapsed(),
            optimal: proven,
        })
    }
}

mod kociemba;
mod korf;
mod thistlethwaite;

pub use kociemba::Kociemba;
pub use korf::Korf;
pub use thistlethwaite::Thistlethwaite;

use crate::prelude::*;

use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("search exhausted: {0}")]
    SearchExhausted(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("bad table file: {0}")]
    PersistenceFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Algorithm {
    Thistlethwaite,
    Kociemba,
    Korf,
}

impl core::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug)]
pub struct SolveConfig {
    /// Longest acceptable solution, in moves.
    pub max_depth: usize,
    pub time_limit: Option<Duration>,
    pub node_limit: Option<u64>,
    /// Fail with `SearchExhausted` instead of returning a solution the
    /// solver cannot prove optimal.
    pub optimal_only: bool,
}

impl Default for SolveConfig {
    fn default() -> SolveConfig {
        SolveConfig {
            max_depth: 40,
            time_limit: None,
            node_limit: None,
            optimal_only: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub algorithm: Algorithm,
    pub solution: Vec<Move>,
    pub nodes_expanded: u64,
    pub elapsed: Duration,
    /// Whether the solver proved this solution is the shortest possible.
    pub optimal: bool,
}

pub trait Solver {
    fn algorithm(&self) -> Algorithm;
    fn solve(&self, cube: &Cube, config: &SolveConfig) -> Result<SolverResult, SolveError>;
}

/// Cooperative node/time budget ticked once per expansion. The clock is
/// only consulted every few thousand nodes.
pub struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    nodes: u64,
}

impl Budget {
    const CLOCK_CHECK_INTERVAL: u64 = 4096;

    pub fn new(config: &SolveConfig) -> Budget {
        let started = Instant::now();
        Budget {
            started,
            deadline: config.time_limit.map(|limit| started + limit),
            node_limit: config.node_limit,
            nodes: 0,
        }
    }

    pub fn tick(&mut self) -> Result<(), SolveError> {
        self.nodes += 1;
        if let Some(limit) = self.node_limit {
            if self.nodes > limit {
                return Err(SolveError::SearchExhausted(format!(
                    "node budget of {} expended",
                    limit
                )));
            }
        }
        if self.nodes % Self::CLOCK_CHECK_INTERVAL == 0 && self.expired() {
            return Err(SolveError::SearchExhausted(format!(
                "time budget expended after {} nodes",
                self.nodes
            )));
        }
        Ok(())
    }

    pub fn expired(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Shared front door: reject invalid states before any search and short
/// circuit states that are already solved.
pub(crate) fn presolve_checks(
    algorithm: Algorithm,
    cube: &Cube,
    budget: &Budget,
) -> Result<Option<SolverResult>, SolveError> {
    cube.validate()?;
    if cube.is_solved() {
        return Ok(Some(SolverResult {
            algorithm,
            solution: Vec::new(),
            nodes_expanded: 0,
            elapsed: budget.elapsed(),
            optimal: true,
        }));
    }
    Ok(None)
}

pub(crate) use presolve_checks as presolve;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_budget_trips() {
        let config = SolveConfig {
            node_limit: Some(10),
            ..SolveConfig::default()
        };
        let mut budget = Budget::new(&config);
        for _ in 0..10 {
            budget.tick().unwrap();
        }
        assert!(matches!(
            budget.tick(),
            Err(SolveError::SearchExhausted(_))
        ));
    }

    #[test]
    fn zero_time_budget_expires() {
        let config = SolveConfig {
            time_limit: Some(Duration::from_secs(0)),
            ..SolveConfig::default()
        };
        let budget = Budget::new(&config);
        assert!(budget.expired());
    }

    #[test]
    fn invalid_cube_is_rejected_before_search() {
        let mut cube = Cube::solved();
        cube.corner_orient[0] = 1;
        let budget = Budget::new(&SolveConfig::default());
        assert!(matches!(
            presolve(Algorithm::Korf, &cube, &budget),
            Err(SolveError::Configuration(_))
        ));
    }

    #[test]
    fn solved_cube_short_circuits() {
        let budget = Budget::new(&SolveConfig::default());
        let result = presolve(Algorithm::Korf, &Cube::solved(), &budget)
            .unwrap()
            .unwrap();
        assert!(result.solution.is_empty());
        assert!(result.optimal);
    }
}

//! Side-by-side runs of the registered solvers over scramble cases.
//!
//! Cases come in as TOML (`[[cases]]` entries); every solver gets every
//! case, and a solver error becomes a failed record rather than aborting
//! the rest of the run.

use crate::prelude::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

#[derive(Clone, Debug, Deserialize)]
pub struct ScrambleCase {
    pub id: String,
    /// Scramble in Singmaster tokens, one move per entry.
    pub moves: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub expected_optimal_length: Option<usize>,
}

impl ScrambleCase {
    pub fn parse_moves(&self) -> Result<Vec<Move>, SolveError> {
        self.moves.iter().map(|token| token.parse()).collect()
    }

    pub fn cube(&self) -> Result<Cube, SolveError> {
        Ok(Cube::solved().apply_all(self.parse_moves()?))
    }
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    cases: Vec<ScrambleCase>,
}

pub fn load_cases(path: &Path) -> Result<Vec<ScrambleCase>, SolveError> {
    let text = std::fs::read_to_string(path)?;
    let file: CaseFile = toml::from_str(&text)
        .map_err(|e| SolveError::Configuration(format!("bad case file {}: {}", path.display(), e)))?;
    Ok(file.cases)
}

/// One solver's outcome on one case, shaped for external reporting.
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub algorithm: Algorithm,
    pub test_id: String,
    pub solved: bool,
    pub solution_length: Option<usize>,
    pub expected: Option<usize>,
    pub is_optimal: bool,
    pub elapsed_seconds: f64,
    pub failure: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub records: Vec<RunRecord>,
}

impl Report {
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Default)]
pub struct Comparison<'a> {
    solvers: Vec<&'a dyn Solver>,
}

impl<'a> Comparison<'a> {
    pub fn new() -> Comparison<'a> {
        Comparison::default()
    }

    pub fn register(&mut self, solver: &'a dyn Solver) {
        self.solvers.push(solver);
    }

    /// Runs every registered solver on `case`. A malformed case is an error;
    /// a solver failure is a record.
    pub fn run(&self, case: &ScrambleCase, config: &SolveConfig) -> Result<Vec<RunRecord>, SolveError> {
        let cube = case.cube()?;
        Ok(self
            .solvers
            .iter()
            .map(|solver| {
                let start = Instant::now();
                match solver.solve(&cube, config) {
                    Ok(result) => RunRecord {
                        algorithm: result.algorithm,
                        test_id: case.id.clone(),
                        solved: true,
                        solution_length: Some(result.solution.len()),
                        expected: case.expected_optimal_length,
                        is_optimal: result.optimal,
                        // The harness clock, not the solver's own, so the
                        // field means the same thing in failed records.
                        elapsed_seconds: start.elapsed().as_secs_f64(),
                        failure: None,
                    },
                    Err(e) => {
                        log::warn!("{} failed on {}: {}", solver.algorithm(), case.id, e);
                        RunRecord {
                            algorithm: solver.algorithm(),
                            test_id: case.id.clone(),
                            solved: false,
                            solution_length: None,
                            expected: case.expected_optimal_length,
                            is_optimal: false,
                            elapsed_seconds: start.elapsed().as_secs_f64(),
                            failure: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect())
    }

    pub fn run_all(
        &self,
        cases: &[ScrambleCase],
        config: &SolveConfig,
    ) -> Result<Report, SolveError> {
        let mut records = Vec::with_capacity(cases.len() * self.solvers.len());
        for case in cases {
            records.extend(self.run(case, config)?);
        }
        Ok(Report { records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    impl Solver for AlwaysFails {
        fn algorithm(&self) -> Algorithm {
            Algorithm::Thistlethwaite
        }

        fn solve(&self, _: &Cube, _: &SolveConfig) -> Result<SolverResult, SolveError> {
            Err(SolveError::SearchExhausted("nothing to see here".to_string()))
        }
    }

    struct SlowButQuiet;

    impl Solver for SlowButQuiet {
        fn algorithm(&self) -> Algorithm {
            Algorithm::Kociemba
        }

        /// Takes real time but reports none of it in `elapsed`.
        fn solve(&self, _: &Cube, _: &SolveConfig) -> Result<SolverResult, SolveError> {
            std::thread::sleep(Duration::from_millis(25));
            Ok(SolverResult {
                algorithm: Algorithm::Kociemba,
                solution: Vec::new(),
                nodes_expanded: 0,
                elapsed: Duration::from_secs(0),
                optimal: true,
            })
        }
    }

    fn tiny_korf() -> Korf {
        Korf::new(
            PatternSet::build(
                vec![PieceSet::edges(vec![0, 1]).unwrap()],
                &mut TableBudget::unlimited(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let cases: CaseFile = toml::from_str(
            r#"
            [[cases]]
            id = "bare"
            moves = ["R", "U'"]

            [[cases]]
            id = "full"
            moves = ["F2"]
            difficulty = "easy"
            expected_optimal_length = 1
            "#,
        )
        .unwrap();
        assert_eq!(cases.cases.len(), 2);
        assert_eq!(cases.cases[0].difficulty, None);
        assert_eq!(cases.cases[1].expected_optimal_length, Some(1));
    }

    #[test]
    fn bad_move_token_is_a_configuration_error() {
        let case = ScrambleCase {
            id: "bad".to_string(),
            moves: vec!["R".to_string(), "Q2".to_string()],
            difficulty: None,
            expected_optimal_length: None,
        };
        let comparison = Comparison::new();
        assert!(matches!(
            comparison.run(&case, &SolveConfig::default()),
            Err(SolveError::Configuration(_))
        ));
    }

    #[test]
    fn one_failure_does_not_abort_the_others() {
        let korf = tiny_korf();
        let failing = AlwaysFails;
        let mut comparison = Comparison::new();
        comparison.register(&failing);
        comparison.register(&korf);

        let case = ScrambleCase {
            id: "two-mover".to_string(),
            moves: vec!["R".to_string(), "U".to_string()],
            difficulty: None,
            expected_optimal_length: Some(2),
        };
        let records = comparison.run(&case, &SolveConfig::default()).unwrap();
        assert_eq!(records.len(), 2);

        assert!(!records[0].solved);
        assert_eq!(records[0].failure.as_deref(), Some("search exhausted: nothing to see here"));
        assert_eq!(records[0].solution_length, None);

        assert!(records[1].solved);
        assert_eq!(records[1].solution_length, Some(2));
        assert!(records[1].is_optimal);
        assert_eq!(records[1].failure, None);
    }

    #[test]
    fn elapsed_comes_from_the_harness_clock() {
        let slow = SlowButQuiet;
        let mut comparison = Comparison::new();
        comparison.register(&slow);

        let case = ScrambleCase {
            id: "timed".to_string(),
            moves: vec!["R2".to_string()],
            difficulty: None,
            expected_optimal_length: None,
        };
        let records = comparison.run(&case, &SolveConfig::default()).unwrap();
        assert!(records[0].elapsed_seconds >= 0.02);
    }

    #[test]
    fn report_serializes() {
        let record = RunRecord {
            algorithm: Algorithm::Korf,
            test_id: "t1".to_string(),
            solved: true,
            solution_length: Some(4),
            expected: None,
            is_optimal: true,
            elapsed_seconds: 0.25,
            failure: None,
        };
        let toml = Report {
            records: vec![record],
        }
        .to_toml();
        assert!(toml.contains("algorithm = \"Korf\""));
        assert!(toml.contains("solution_length = 4"));
        // Absent optionals are omitted, not null.
        assert!(!toml.contains("expected"));
    }
}

use cubesearch::prelude::*;

use anyhow::Context;
use std::path::Path;

fn scramble_case(seed: u64, length: usize) -> ScrambleCase {
    let (_, moves) = Cube::scramble(length, seed);
    ScrambleCase {
        id: format!("scramble-{}x{}", seed, length),
        moves: moves.iter().map(|m| m.to_string()).collect(),
        difficulty: None,
        expected_optimal_length: None,
    }
}

/// `cubesearch [CASES.toml]` or `cubesearch [SEED [LENGTH]]`.
fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cases = match args.first() {
        Some(arg) => match arg.parse::<u64>() {
            Ok(seed) => {
                let length = args
                    .get(1)
                    .map(|s| s.parse())
                    .transpose()
                    .context("scramble length must be a number")?
                    .unwrap_or(25);
                vec![scramble_case(seed, length)]
            }
            Err(_) => load_cases(Path::new(arg)).context("loading scramble cases")?,
        },
        None => vec![scramble_case(42, 25)],
    };

    let mut budget = TableBudget::default();
    let thistlethwaite = Thistlethwaite::new(&mut budget)?;
    let kociemba = Kociemba::new(&mut budget)?;
    let mut korf_budget = TableBudget::new(512 * 1024 * 1024);
    let korf = Korf::with_cached_databases(Path::new("data/pattern_dbs"), &mut korf_budget)
        .context("preparing pattern databases")?;

    let mut comparison = Comparison::new();
    comparison.register(&thistlethwaite);
    comparison.register(&kociemba);
    comparison.register(&korf);

    let config = SolveConfig {
        time_limit: Some(Duration::from_secs(60)),
        ..SolveConfig::default()
    };
    let report = comparison.run_all(&cases, &config)?;

    for record in &report.records {
        match &record.failure {
            None => println!(
                "{:<16} {:<20} {:>3} moves{} in {:.2}s",
                record.algorithm.to_string(),
                record.test_id,
                record.solution_length.unwrap_or(0),
                if record.is_optimal { " (optimal)" } else { "" },
                record.elapsed_seconds,
            ),
            Some(failure) => println!(
                "{:<16} {:<20} failed: {}",
                record.algorithm.to_string(),
                record.test_id,
                failure,
            ),
        }
    }
    println!("\n{}", report.to_toml());

    Ok(())
}

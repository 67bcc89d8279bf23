use std::path::PathBuf;

use anyhow::Context;
use chopsticks_engine::engine::GameRng;
use chopsticks_engine::{evaluator, persistence};
use clap::Parser;
use rand::SeedableRng;

/// Benchmarks a trained Q-table against a random opponent or another table.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
struct Args {
    /// Q-table CSV to evaluate
    q_table: PathBuf,
    /// Play against this table's greedy policy instead of a random opponent
    #[arg(long)]
    snapshot: Option<PathBuf>,
    #[arg(long, default_value_t = 1000)]
    games: u64,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let q_table = persistence::load(&args.q_table)
        .with_context(|| format!("loading {}", args.q_table.display()))?;
    let mut rng = GameRng::seed_from_u64(args.seed.unwrap_or_else(rand::random));

    let record = match &args.snapshot {
        Some(path) => {
            let snapshot = persistence::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            evaluator::simulate_vs_snapshot(&q_table, &snapshot, args.games, &mut rng)?
        }
        None => evaluator::simulate_vs_random(&q_table, args.games, &mut rng)?,
    };
    println!("{}", record);
    Ok(())
}

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chopsticks_engine::engine::GameRng;
use chopsticks_engine::players::QLearningPlayer;
use chopsticks_engine::play::{self, Winner};
use chopsticks_engine::{evaluator, persistence};
use clap::Parser;
use rand::SeedableRng;

/// Plays chopsticks against a trained agent in the terminal.
#[derive(Parser, Debug)]
#[command(name = "play")]
struct Args {
    /// Q-table CSV written by `train`
    q_table: PathBuf,
    /// Take the first move instead of the bot
    #[arg(long)]
    human_first: bool,
    /// Games to benchmark the bot against a random opponent before playing
    #[arg(long, default_value_t = 0)]
    benchmark: u64,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let q_table = persistence::load(&args.q_table)
        .with_context(|| format!("loading {}", args.q_table.display()))?;
    let mut rng = GameRng::seed_from_u64(args.seed.unwrap_or_else(rand::random));

    if args.benchmark > 0 {
        let record = evaluator::simulate_vs_random(&q_table, args.benchmark, &mut rng)?;
        println!("Bot vs random: {}", record);
    }

    let bot = QLearningPlayer::greedy(q_table);
    let winner = play::run_session(
        &bot,
        args.human_first,
        io::stdin().lock(),
        io::stdout().lock(),
        &mut rng,
    )?;
    log::info!(
        "game over, {} won",
        match winner {
            Winner::Human => "human",
            Winner::Bot => "bot",
        }
    );
    Ok(())
}

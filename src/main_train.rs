use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use chopsticks_engine::persistence;
use chopsticks_engine::trainer::{Trainer, TrainerConfig};
use clap::Parser;

/// Trains a chopsticks agent by self-play Q-learning and writes its Q-table.
#[derive(Parser, Debug)]
#[command(name = "train")]
struct Args {
    /// Number of self-play episodes
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    episodes: u64,
    /// Where to write the Q-table CSV
    output: PathBuf,
    /// Seed for the random source, random if omitted
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    alpha: Option<f64>,
    #[arg(long)]
    gamma: Option<f64>,
    #[arg(long)]
    epsilon_start: Option<f64>,
    #[arg(long)]
    epsilon_min: Option<f64>,
    #[arg(long)]
    epsilon_decay: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    step_penalty: Option<f64>,
    #[arg(long)]
    speed_bonus: Option<f64>,
    /// Chance of forcing a random move during self-play
    #[arg(long)]
    random_move_prob: Option<f64>,
    /// Convergence measurements over the run
    #[arg(long)]
    checkpoints: Option<u64>,
    /// Games against a random opponent at each checkpoint
    #[arg(long)]
    eval_games: Option<u64>,
    /// Continue from an existing Q-table instead of an empty one
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Write the convergence series as CSV
    #[arg(long)]
    convergence: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> TrainerConfig {
        let defaults = TrainerConfig::default();
        TrainerConfig {
            episodes: self.episodes,
            alpha: self.alpha.unwrap_or(defaults.alpha),
            gamma: self.gamma.unwrap_or(defaults.gamma),
            epsilon_start: self.epsilon_start.unwrap_or(defaults.epsilon_start),
            epsilon_min: self.epsilon_min.unwrap_or(defaults.epsilon_min),
            epsilon_decay: self.epsilon_decay.unwrap_or(defaults.epsilon_decay),
            step_penalty: self.step_penalty.unwrap_or(defaults.step_penalty),
            speed_bonus: self.speed_bonus.unwrap_or(defaults.speed_bonus),
            random_move_prob: self.random_move_prob.unwrap_or(defaults.random_move_prob),
            checkpoints: self.checkpoints.unwrap_or(defaults.checkpoints),
            eval_games: self.eval_games.unwrap_or(defaults.eval_games),
            seed: self.seed.unwrap_or_else(rand::random),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.config();

    let mut trainer = match &args.resume {
        Some(path) => {
            let q_table = persistence::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            Trainer::with_table(config, q_table)
        }
        None => Trainer::new(config),
    };

    let report = trainer.train()?;
    log::info!(
        "trained {} episodes in {:.3}s, final epsilon {:.4}",
        report.episodes,
        report.elapsed.as_secs_f64(),
        trainer.epsilon()
    );

    if let Some(path) = &args.convergence {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        persistence::write_convergence(&report.checkpoints, BufWriter::new(file))?;
        log::info!("convergence series written to {}", path.display());
    }

    let q_table = trainer.into_q_table();
    persistence::save(&q_table, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};

use crate::engine::{self, Action, EngineError, GameRng, GameState, MAX_TURNS};
use crate::evaluator::{self, MatchRecord};
use crate::players::{epsilon_greedy, Player, RandomPlayer};
use crate::qtable::QTable;

/// Knobs for a self-play training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub episodes: u64,
    /// Learning rate.
    pub alpha: f64,
    /// Discount applied to the opponent's best reply.
    pub gamma: f64,
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    /// Multiplied into epsilon after every episode.
    pub epsilon_decay: f64,
    /// Reward for a move that neither wins nor hits the turn cap.
    pub step_penalty: f64,
    /// Extra reward for a win on the first turn, shrinking linearly to 0 at `MAX_TURNS`.
    pub speed_bonus: f64,
    /// Chance of a uniform random move regardless of epsilon.
    pub random_move_prob: f64,
    /// Number of convergence measurements over the run, 0 to disable.
    pub checkpoints: u64,
    /// Games against a random opponent at each checkpoint, 0 to disable.
    pub eval_games: u64,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            episodes: 1_000_000,
            alpha: 0.1,
            gamma: 1.0,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.999,
            step_penalty: -0.01,
            speed_bonus: 0.5,
            random_move_prob: 0.0,
            checkpoints: 100,
            eval_games: 0,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub action: Action,
    pub reward: f64,
    pub next_state: GameState,
}

/// Moves of one self-play game in the order they were played.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    transitions: Vec<Transition>,
}

impl Trajectory {
    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Latest move first.
    pub fn iter_rev(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().rev()
    }

    /// Whether the game ended by elimination rather than the turn cap.
    pub fn is_terminal(&self) -> bool {
        self.transitions
            .last()
            .is_some_and(|t| t.next_state.is_game_over())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub episode: u64,
    pub epsilon: f64,
    /// Euclidean distance between the table now and at the previous checkpoint.
    pub distance: f64,
    pub record: Option<MatchRecord>,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub episodes: u64,
    pub checkpoints: Vec<Checkpoint>,
    pub elapsed: Duration,
}

/// Self-play Q-learning. Both sides share one table: every state is seen
/// from the player to move, so a move's value is its reward minus the best
/// value the opponent can reach from the resulting state.
pub struct Trainer {
    config: TrainerConfig,
    q_table: QTable,
    epsilon: f64,
    speed_bonus: Vec<f64>,
    rng: GameRng,
    episodes_run: u64,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self::with_table(config, QTable::new())
    }

    /// Continues training from an existing table.
    pub fn with_table(config: TrainerConfig, q_table: QTable) -> Self {
        let speed_bonus = (0..=MAX_TURNS)
            .map(|turn| config.speed_bonus * (1.0 - turn as f64 / MAX_TURNS as f64))
            .collect();
        Trainer {
            epsilon: config.epsilon_start,
            rng: GameRng::seed_from_u64(config.seed),
            config,
            q_table,
            speed_bonus,
            episodes_run: 0,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn episodes_run(&self) -> u64 {
        self.episodes_run
    }

    pub fn speed_bonus(&self, turn: usize) -> f64 {
        self.speed_bonus[turn.min(MAX_TURNS)]
    }

    /// Reward for the player who just moved into `next_state` on move `turn` (1-based).
    pub fn reward(&self, next_state: &GameState, turn: usize) -> f64 {
        if next_state.is_game_over() {
            1.0 + self.speed_bonus(turn)
        } else if turn >= MAX_TURNS {
            0.0
        } else {
            self.config.step_penalty
        }
    }

    pub fn choose_action(&mut self, state: &GameState) -> Result<Action, EngineError> {
        if self.config.random_move_prob > 0.0 && self.rng.gen::<f64>() < self.config.random_move_prob
        {
            return RandomPlayer.choose_action(state, &mut self.rng);
        }
        epsilon_greedy(&self.q_table, state, self.epsilon, &mut self.rng)
    }

    /// Plays one self-play game from the opening position with the current epsilon.
    pub fn run_episode(&mut self) -> Result<Trajectory, EngineError> {
        let mut state = GameState::initial();
        let mut trajectory = Trajectory::default();
        for turn in 1..=MAX_TURNS {
            if state.is_game_over() {
                break;
            }
            let action = self.choose_action(&state)?;
            let next_state = engine::step(&state, action)?;
            let reward = self.reward(&next_state, turn);
            trajectory.push(Transition {
                state,
                action,
                reward,
                next_state,
            });
            state = next_state;
        }
        log::trace!(
            "episode of {} moves, terminal: {}",
            trajectory.len(),
            trajectory.is_terminal()
        );
        Ok(trajectory)
    }

    /// Backward zero-sum update: walks the game from the last move to the first.
    pub fn update_from_trajectory(&mut self, trajectory: &Trajectory) -> Result<(), EngineError> {
        for transition in trajectory.iter_rev() {
            let target = if transition.next_state.is_game_over() {
                transition.reward
            } else {
                let replies = engine::legal_actions(&transition.next_state)?;
                let best_reply = self
                    .q_table
                    .max_value(&transition.next_state, &replies)
                    .unwrap_or(0.0);
                transition.reward - self.config.gamma * best_reply
            };
            let old = self.q_table.get(&transition.state, transition.action);
            self.q_table.update(
                &transition.state,
                transition.action,
                old + self.config.alpha * (target - old),
            );
        }
        Ok(())
    }

    /// Runs, learns from and decays epsilon after a single episode.
    pub fn train_episode(&mut self) -> Result<Trajectory, EngineError> {
        let trajectory = self.run_episode()?;
        self.update_from_trajectory(&trajectory)?;
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        self.episodes_run += 1;
        Ok(trajectory)
    }

    pub fn train(&mut self) -> Result<TrainingReport, EngineError> {
        self.train_until(|| false)
    }

    /// Trains for `config.episodes`, checking `stop` before each episode.
    pub fn train_until(
        &mut self,
        mut stop: impl FnMut() -> bool,
    ) -> Result<TrainingReport, EngineError> {
        let start = Instant::now();
        let total = self.config.episodes;
        let interval = match self.config.checkpoints {
            0 => None,
            n => Some((total / n).max(1)),
        };
        log::info!(
            "training for {} episodes (alpha {}, gamma {}, seed {})",
            total,
            self.config.alpha,
            self.config.gamma,
            self.config.seed
        );

        let mut snapshot = self.q_table.clone();
        let mut checkpoints = Vec::new();
        let mut completed = 0;
        for episode in 1..=total {
            if stop() {
                log::info!("stopping after {} episodes", completed);
                break;
            }
            self.train_episode()?;
            completed = episode;

            if interval.is_some_and(|interval| episode % interval == 0) {
                let checkpoint = self.checkpoint(episode, &snapshot)?;
                log::info!(
                    "{} runs completed. epsilon {:.4}, q change {:.6}, time elapsed: {:.3}s",
                    episode,
                    checkpoint.epsilon,
                    checkpoint.distance,
                    start.elapsed().as_secs_f64()
                );
                if let Some(record) = &checkpoint.record {
                    log::info!("greedy policy vs random: {}", record);
                }
                snapshot = self.q_table.clone();
                checkpoints.push(checkpoint);
            }
        }

        Ok(TrainingReport {
            episodes: completed,
            checkpoints,
            elapsed: start.elapsed(),
        })
    }

    fn checkpoint(&mut self, episode: u64, snapshot: &QTable) -> Result<Checkpoint, EngineError> {
        let record = match self.config.eval_games {
            0 => None,
            games => Some(evaluator::simulate_vs_random(
                &self.q_table,
                games,
                &mut self.rng,
            )?),
        };
        Ok(Checkpoint {
            episode,
            epsilon: self.epsilon,
            distance: self.q_table.distance(snapshot),
            record,
        })
    }
}

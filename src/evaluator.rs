use std::fmt;

use crate::engine::{self, EngineError, GameRng, GameState, MAX_TURNS};
use crate::players::{Player, QLearningPlayer, RandomPlayer};
use crate::qtable::QTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AgentWin,
    Draw,
    AgentLoss,
}

/// Win/draw/loss tally from the agent's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
}

impl MatchRecord {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::AgentWin => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::AgentLoss => self.losses += 1,
        }
    }

    pub fn games(&self) -> u64 {
        self.wins + self.draws + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            games => self.wins as f64 / games as f64,
        }
    }
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} won, {} drawn, {} lost ({:.1}% wins)",
            self.wins,
            self.draws,
            self.losses,
            100.0 * self.win_rate()
        )
    }
}

/// Plays one game from the opening position. A win on the last allowed
/// move still counts; a game that reaches `MAX_TURNS` moves otherwise is a draw.
pub fn play_game(
    agent: &dyn Player,
    opponent: &dyn Player,
    agent_first: bool,
    rng: &mut GameRng,
) -> Result<Outcome, EngineError> {
    let mut state = GameState::initial();
    let mut agent_to_move = agent_first;
    for _ in 0..MAX_TURNS {
        let mover = if agent_to_move { agent } else { opponent };
        let action = mover.choose_action(&state, rng)?;
        state = engine::step(&state, action)?;
        if state.is_game_over() {
            return Ok(if agent_to_move {
                Outcome::AgentWin
            } else {
                Outcome::AgentLoss
            });
        }
        agent_to_move = !agent_to_move;
    }
    Ok(Outcome::Draw)
}

/// Plays `num_games` games, the opponent moving first in even-numbered ones.
pub fn play_match(
    agent: &dyn Player,
    opponent: &dyn Player,
    num_games: u64,
    rng: &mut GameRng,
) -> Result<MatchRecord, EngineError> {
    let mut record = MatchRecord::default();
    for game in 0..num_games {
        record.record(play_game(agent, opponent, game % 2 == 1, rng)?);
    }
    log::debug!("match over {} games: {}", num_games, record);
    Ok(record)
}

/// Greedy policy from `q_table` against a uniformly random opponent.
pub fn simulate_vs_random(
    q_table: &QTable,
    num_games: u64,
    rng: &mut GameRng,
) -> Result<MatchRecord, EngineError> {
    let agent = QLearningPlayer::greedy(q_table.clone());
    play_match(&agent, &RandomPlayer, num_games, rng)
}

/// Greedy policy from `q_table` against the greedy policy of `snapshot`.
pub fn simulate_vs_snapshot(
    q_table: &QTable,
    snapshot: &QTable,
    num_games: u64,
    rng: &mut GameRng,
) -> Result<MatchRecord, EngineError> {
    let agent = QLearningPlayer::greedy(q_table.clone());
    let opponent = QLearningPlayer::greedy(snapshot.clone());
    play_match(&agent, &opponent, num_games, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Action;
    use crate::trainer::{Trainer, TrainerConfig};
    use rand::SeedableRng;

    /// Always plays the first legal action.
    struct FirstLegal;

    impl Player for FirstLegal {
        fn choose_action(
            &self,
            state: &GameState,
            _rng: &mut GameRng,
        ) -> Result<Action, EngineError> {
            Ok(engine::legal_actions(state)?[0])
        }
    }

    #[test]
    fn test_record() {
        let mut record = MatchRecord::default();
        assert_eq!(0.0, record.win_rate());
        record.record(Outcome::AgentWin);
        record.record(Outcome::AgentWin);
        record.record(Outcome::Draw);
        record.record(Outcome::AgentLoss);
        assert_eq!(4, record.games());
        assert_eq!(0.5, record.win_rate());
        assert_eq!("2 won, 1 drawn, 1 lost (50.0% wins)", record.to_string());
    }

    #[test]
    fn test_first_mover_alternates() {
        let mut rng = GameRng::seed_from_u64(0);
        // both sides deterministic, so only the seat decides the result
        let first = play_game(&FirstLegal, &FirstLegal, true, &mut rng).unwrap();
        let second = play_game(&FirstLegal, &FirstLegal, false, &mut rng).unwrap();
        match first {
            Outcome::AgentWin => assert_eq!(Outcome::AgentLoss, second),
            Outcome::AgentLoss => assert_eq!(Outcome::AgentWin, second),
            Outcome::Draw => assert_eq!(Outcome::Draw, second),
        }

        let record = play_match(&FirstLegal, &FirstLegal, 10, &mut rng).unwrap();
        assert_eq!(10, record.games());
        assert_eq!(record.wins, record.losses);
    }

    #[test]
    fn test_random_vs_random() {
        let mut rng = GameRng::seed_from_u64(11);
        let record = simulate_vs_random(&QTable::new(), 200, &mut rng).unwrap();
        assert_eq!(200, record.games());
    }

    #[test]
    fn test_snapshot_match() {
        let mut trainer = Trainer::new(TrainerConfig {
            episodes: 20_000,
            checkpoints: 0,
            seed: 2024,
            ..TrainerConfig::default()
        });
        trainer.train().unwrap();
        let mut rng = GameRng::seed_from_u64(5);

        // an empty snapshot has no preferences, so it plays like a random opponent
        let record =
            simulate_vs_snapshot(trainer.q_table(), &QTable::new(), 1000, &mut rng).unwrap();
        assert_eq!(1000, record.games());
        assert!(record.win_rate() > 0.5, "trained table only managed {}", record);

        let record =
            simulate_vs_snapshot(&QTable::new(), trainer.q_table(), 1000, &mut rng).unwrap();
        assert!(record.win_rate() < 0.5, "empty table managed {}", record);

        // same policy on both sides, seats alternate, so results balance out
        let record =
            simulate_vs_snapshot(trainer.q_table(), trainer.q_table(), 1000, &mut rng).unwrap();
        assert_eq!(1000, record.games());
        assert!(
            (record.wins as i64 - record.losses as i64).abs() <= 100,
            "self play was lopsided: {}",
            record
        );
    }

    #[test]
    fn test_trained_agent_beats_random() {
        let mut trainer = Trainer::new(TrainerConfig {
            episodes: 20_000,
            checkpoints: 0,
            seed: 2024,
            ..TrainerConfig::default()
        });
        trainer.train().unwrap();

        let mut rng = GameRng::seed_from_u64(99);
        let record = simulate_vs_random(trainer.q_table(), 1000, &mut rng).unwrap();
        assert_eq!(1000, record.games());
        assert!(
            record.win_rate() > 0.5,
            "trained agent only managed {}",
            record
        );
        assert!(record.wins > record.losses);
    }
}

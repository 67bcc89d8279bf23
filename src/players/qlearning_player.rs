use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{self, GameRng};
use crate::players::player::Player;
use crate::qtable::QTable;

/// With probability `epsilon` explores uniformly over the legal actions,
/// otherwise picks uniformly among the actions with the highest value.
pub fn epsilon_greedy(
    q_table: &QTable,
    state: &engine::GameState,
    epsilon: f64,
    rng: &mut GameRng,
) -> Result<engine::Action, engine::EngineError> {
    let legal_actions = engine::legal_actions(state)?;
    let candidates = if rng.gen::<f64>() < epsilon {
        legal_actions
    } else {
        q_table.best_actions(state, &legal_actions)
    };
    candidates
        .choose(rng)
        .copied()
        .ok_or(engine::EngineError::NoLegalActions(*state))
}

/// A policy read from a frozen table.
#[derive(Debug, Clone)]
pub struct QLearningPlayer {
    q_table: QTable,
    exploration_rate: f64,
}

impl Player for QLearningPlayer {
    fn choose_action(
        &self,
        state: &engine::GameState,
        rng: &mut GameRng,
    ) -> Result<engine::Action, engine::EngineError> {
        epsilon_greedy(&self.q_table, state, self.exploration_rate, rng)
    }
}

impl QLearningPlayer {
    pub fn new(q_table: QTable, exploration_rate: f64) -> Self {
        QLearningPlayer {
            q_table,
            exploration_rate,
        }
    }

    /// Always plays a best-valued action.
    pub fn greedy(q_table: QTable) -> Self {
        Self::new(q_table, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Action, GameState, Hand};
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_greedy_picks_best() {
        let mut rng = GameRng::seed_from_u64(1);
        let mut q_table = QTable::new();
        let state = GameState::initial();
        q_table.update(&state, Action::AttackRL, 0.3);
        q_table.update(&state, Action::SwapL1R, 0.1);
        let player = QLearningPlayer::greedy(q_table);
        for _ in 0..50 {
            assert_eq!(
                Action::AttackRL,
                player.choose_action(&state, &mut rng).unwrap()
            );
        }
    }

    #[test]
    fn test_greedy_breaks_ties_randomly() {
        let mut rng = GameRng::seed_from_u64(2);
        let mut q_table = QTable::new();
        let state = GameState::initial();
        q_table.update(&state, Action::AttackLL, 0.5);
        q_table.update(&state, Action::AttackRR, 0.5);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(epsilon_greedy(&q_table, &state, 0.0, &mut rng).unwrap());
        }
        assert_eq!(HashSet::from([Action::AttackLL, Action::AttackRR]), seen);
    }

    #[test]
    fn test_unseen_values_count_as_zero() {
        let mut rng = GameRng::seed_from_u64(3);
        let mut q_table = QTable::new();
        let state = GameState::initial();
        // every stored action is worse than the unseen ones
        for action in [Action::AttackLL, Action::AttackLR, Action::AttackRL] {
            q_table.update(&state, action, -0.2);
        }
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(epsilon_greedy(&q_table, &state, 0.0, &mut rng).unwrap());
        }
        assert_eq!(HashSet::from([Action::AttackRR, Action::SwapL1R]), seen);
    }

    #[test]
    fn test_full_exploration_stays_legal() {
        let mut rng = GameRng::seed_from_u64(4);
        let mut q_table = QTable::new();
        let state = GameState::new(Hand::new(0, 4), Hand::new(0, 2));
        q_table.update(&state, Action::SwapR2L, 1.0);
        let legal = engine::legal_actions(&state).unwrap();
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let action = epsilon_greedy(&q_table, &state, 1.0, &mut rng).unwrap();
            assert!(legal.contains(&action));
            seen.insert(action);
        }
        assert_eq!(legal.len(), seen.len());
    }

    #[test]
    fn test_terminal_state() {
        let mut rng = GameRng::seed_from_u64(5);
        let state = GameState::new(Hand::ELIMINATED, Hand::new(2, 3));
        assert_eq!(
            Err(engine::EngineError::NoLegalActions(state)),
            epsilon_greedy(&QTable::new(), &state, 0.0, &mut rng)
        );
    }
}

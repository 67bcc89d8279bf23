use rand::seq::SliceRandom;

use crate::engine::{self, GameRng};
use crate::players::player::Player;

/// Plays uniformly at random among the legal actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlayer;

impl Player for RandomPlayer {
    fn choose_action(
        &self,
        state: &engine::GameState,
        rng: &mut GameRng,
    ) -> Result<engine::Action, engine::EngineError> {
        let actions = engine::legal_actions(state)?;
        actions
            .choose(rng)
            .copied()
            .ok_or(engine::EngineError::NoLegalActions(*state))
    }
}

use crate::engine::{self, GameRng};

pub trait Player {
    /// Picks a legal action for the side to move in `state`.
    fn choose_action(
        &self,
        state: &engine::GameState,
        rng: &mut GameRng,
    ) -> Result<engine::Action, engine::EngineError>;
}

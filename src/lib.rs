pub mod engine;
pub mod evaluator;
pub mod persistence;
pub mod play;
pub mod players;
pub mod qtable;
pub mod trainer;

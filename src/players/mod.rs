pub mod player;
pub mod qlearning_player;
pub mod random_player;

pub use player::Player;
pub use qlearning_player::{epsilon_greedy, QLearningPlayer};
pub use random_player::RandomPlayer;

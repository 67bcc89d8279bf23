use std::io::{self, BufRead, Write};

use itertools::Itertools;
use thiserror::Error;

use crate::engine::{self, Action, EngineError, GameRng, GameState};
use crate::players::Player;

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("input closed before the game finished")]
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Human,
    Bot,
}

/// Draws the board with `state.current` as the human's hands.
pub fn render_board<W: Write>(output: &mut W, state: &GameState) -> io::Result<()> {
    writeln!(
        output,
        "----------\nBOT: {} {}\n\nYOU: {} {}\n----------",
        state.opponent.low(),
        state.opponent.high(),
        state.current.low(),
        state.current.high()
    )
}

/// Prompts until the human names a legal action.
fn read_move<R: BufRead, W: Write>(
    state: &GameState,
    input: &mut R,
    output: &mut W,
) -> Result<Action, PlayError> {
    let legal = engine::legal_actions(state)?;
    let mut first_prompt = true;
    loop {
        if !first_prompt {
            writeln!(output, "Invalid move!")?;
        }
        first_prompt = false;
        writeln!(output, "Valid actions: {}", legal.iter().join(", "))?;
        write!(output, "Your move: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(PlayError::InputClosed);
        }
        match line.parse::<Action>() {
            Ok(action) if legal.contains(&action) => return Ok(action),
            _ => log::debug!("rejected move {:?}", line.trim()),
        }
    }
}

/// Plays one game between a human on `input`/`output` and `bot`, until
/// either side is out of fingers.
pub fn run_session<R: BufRead, W: Write>(
    bot: &dyn Player,
    human_first: bool,
    mut input: R,
    mut output: W,
    rng: &mut GameRng,
) -> Result<Winner, PlayError> {
    let mut state = GameState::initial();
    let mut human_to_move = human_first;
    loop {
        if human_to_move {
            render_board(&mut output, &state)?;
            if state.is_game_over() {
                writeln!(output, "Bot wins!")?;
                return Ok(Winner::Bot);
            }
            let action = read_move(&state, &mut input, &mut output)?;
            state = engine::step(&state, action)?;
        } else {
            render_board(&mut output, &state.flipped())?;
            if state.is_game_over() {
                writeln!(output, "You win!")?;
                return Ok(Winner::Human);
            }
            writeln!(output, "Bot is thinking...")?;
            let action = bot.choose_action(&state, rng)?;
            writeln!(output, "Bot's move: {}", action)?;
            state = engine::step(&state, action)?;
        }
        human_to_move = !human_to_move;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

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

    fn session(human_first: bool, script: &str) -> (Result<Winner, PlayError>, String) {
        let mut rng = GameRng::seed_from_u64(0);
        let mut output = Vec::new();
        let result = run_session(&FirstLegal, human_first, script.as_bytes(), &mut output, &mut rng);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_render_board() {
        let mut output = Vec::new();
        let state = GameState::new(engine::Hand::new(0, 3), engine::Hand::new(2, 4));
        render_board(&mut output, &state).unwrap();
        assert_eq!(
            "----------\nBOT: 2 4\n\nYOU: 0 3\n----------\n",
            String::from_utf8(output).unwrap()
        );
    }

    #[test]
    fn test_human_wins() {
        let script = "ATTACK_LL\nattack_rr\nATTACK_LR\nSWAP_L1R\nATTACK_RR\n";
        let (result, output) = session(true, script);
        assert_eq!(Winner::Human, result.unwrap());
        assert!(output.ends_with("You win!\n"));
        assert_eq!(5, output.matches("Your move: ").count());
        assert!(output.contains("Bot's move: ATTACK_RL"));
    }

    #[test]
    fn test_bot_wins() {
        let script = "ATTACK_LL\nATTACK_RR\nATTACK_LL\nATTACK_RL\n";
        let (result, output) = session(true, script);
        assert_eq!(Winner::Bot, result.unwrap());
        assert!(output.ends_with("Bot wins!\n"));
        assert!(output.contains("BOT: 0 4\n\nYOU: 0 2"));
    }

    #[test]
    fn test_invalid_moves_reprompt() {
        // SWAP_L2R is a real action but illegal from the opening position
        let (result, output) = session(true, "weewoo\nSWAP_L2R\n");
        assert!(matches!(result, Err(PlayError::InputClosed)));
        assert_eq!(2, output.matches("Invalid move!").count());
        assert_eq!(3, output.matches("Your move: ").count());
        assert!(output.contains("Valid actions: ATTACK_LL, ATTACK_LR, ATTACK_RL, ATTACK_RR, SWAP_L1R"));
    }

    #[test]
    fn test_bot_moves_first() {
        let (result, output) = session(false, "");
        assert!(matches!(result, Err(PlayError::InputClosed)));
        assert!(output.contains("Bot's move: ATTACK_LL"));
        // the human now faces a bot that hit their low hand
        assert!(output.contains("BOT: 1 1\n\nYOU: 1 2"));
    }
}

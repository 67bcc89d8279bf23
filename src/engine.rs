use std::fmt;
use std::str::FromStr;

use itertools::iproduct;
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;

/// Hard cap on the number of moves in a single game.
pub const MAX_TURNS: usize = 100;

/// Seedable generator used everywhere randomness is needed, so runs are reproducible.
pub type GameRng = Xoshiro256PlusPlus;

/// One player's two hands. Always stored with `low <= high`, each in `[0, 4]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hand {
    low: u8,
    high: u8,
}

/// Canonical enumeration of every normalized hand, indexed by `Hand::index`.
pub const HANDS: [Hand; 15] = [
    Hand::raw(0, 0),
    Hand::raw(0, 1),
    Hand::raw(0, 2),
    Hand::raw(0, 3),
    Hand::raw(0, 4),
    Hand::raw(1, 1),
    Hand::raw(1, 2),
    Hand::raw(1, 3),
    Hand::raw(1, 4),
    Hand::raw(2, 2),
    Hand::raw(2, 3),
    Hand::raw(2, 4),
    Hand::raw(3, 3),
    Hand::raw(3, 4),
    Hand::raw(4, 4),
];

/// Wraps any count of 5 or more to 0, then orders the pair ascending.
pub fn normalize(a: u8, b: u8) -> Hand {
    let wrap = |n: u8| if n >= 5 { 0 } else { n };
    let (a, b) = (wrap(a), wrap(b));
    if a <= b {
        Hand::raw(a, b)
    } else {
        Hand::raw(b, a)
    }
}

impl Hand {
    pub const ELIMINATED: Hand = Hand::raw(0, 0);

    const fn raw(low: u8, high: u8) -> Self {
        Hand { low, high }
    }

    pub fn new(a: u8, b: u8) -> Self {
        normalize(a, b)
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn is_eliminated(&self) -> bool {
        *self == Hand::ELIMINATED
    }

    /// Position of this hand in `HANDS`.
    pub fn index(&self) -> usize {
        let (low, high) = (self.low as usize, self.high as usize);
        // rows of the triangle before `low` hold 5, 4, 3, ... hands
        let index = low * 5 - low * low.saturating_sub(1) / 2 + (high - low);
        debug_assert_eq!(HANDS[index], *self);
        index
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.low, self.high)
    }
}

/// A position seen from the side of the player about to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    pub current: Hand,
    pub opponent: Hand,
}

impl GameState {
    /// Number of canonical state ids, `HANDS.len()` squared.
    pub const COUNT: usize = HANDS.len() * HANDS.len();

    pub fn new(current: Hand, opponent: Hand) -> Self {
        GameState { current, opponent }
    }

    pub fn initial() -> Self {
        GameState::new(Hand::raw(1, 1), Hand::raw(1, 1))
    }

    /// Canonical id in `[0, 225)`: `current + 15 * opponent`.
    pub fn id(&self) -> usize {
        self.current.index() + HANDS.len() * self.opponent.index()
    }

    pub fn from_id(id: usize) -> Option<Self> {
        if id >= Self::COUNT {
            return None;
        }
        Some(GameState::new(
            HANDS[id % HANDS.len()],
            HANDS[id / HANDS.len()],
        ))
    }

    /// Every canonical state in id order.
    pub fn all() -> impl Iterator<Item = GameState> {
        iproduct!(HANDS, HANDS).map(|(opponent, current)| GameState::new(current, opponent))
    }

    /// Same position viewed from the other player's side.
    pub fn flipped(&self) -> Self {
        GameState::new(self.opponent, self.current)
    }

    /// The player to move has no fingers left.
    pub fn is_game_over(&self) -> bool {
        self.current.is_eliminated()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.current, self.opponent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    // my low hand strikes their low hand, and so on
    AttackLL,
    AttackLR,
    AttackRL,
    AttackRR,
    // move fingers between my own hands, low -> high or high -> low
    SwapL2R,
    SwapL1R,
    SwapR1L,
    SwapR2L,
}

impl Action {
    pub const COUNT: usize = 8;

    /// Canonical order, shared by the table file columns.
    pub const ALL: [Action; Action::COUNT] = [
        Action::AttackLL,
        Action::AttackLR,
        Action::AttackRL,
        Action::AttackRR,
        Action::SwapL2R,
        Action::SwapL1R,
        Action::SwapR1L,
        Action::SwapR2L,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::AttackLL => "ATTACK_LL",
            Action::AttackLR => "ATTACK_LR",
            Action::AttackRL => "ATTACK_RL",
            Action::AttackRR => "ATTACK_RR",
            Action::SwapL2R => "SWAP_L2R",
            Action::SwapL1R => "SWAP_L1R",
            Action::SwapR1L => "SWAP_R1L",
            Action::SwapR2L => "SWAP_R2L",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Action::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EngineError::UnknownAction(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IllegalMoveReason {
    GameComplete,
    AttackerEmpty,
    TargetEmpty,
    // not enough fingers in the giving hand
    SwapUnaffordable,
    // result would break low <= high
    SwapUnordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("illegal action {action} in state {state}: {reason:?}")]
    IllegalAction {
        state: GameState,
        action: Action,
        reason: IllegalMoveReason,
    },
    #[error("no legal actions in state {0}")]
    NoLegalActions(GameState),
    #[error("unrecognized action {0:?}")]
    UnknownAction(String),
}

fn check_attack(attacker: u8, target: u8) -> Option<IllegalMoveReason> {
    if attacker == 0 {
        Some(IllegalMoveReason::AttackerEmpty)
    } else if target == 0 {
        Some(IllegalMoveReason::TargetEmpty)
    } else {
        None
    }
}

fn check_swap(affordable: bool, ordered: bool) -> Option<IllegalMoveReason> {
    if !affordable {
        Some(IllegalMoveReason::SwapUnaffordable)
    } else if !ordered {
        Some(IllegalMoveReason::SwapUnordered)
    } else {
        None
    }
}

/// Returns why `action` cannot be played from `state`, or `None` if it can.
pub fn check_action(state: &GameState, action: Action) -> Option<IllegalMoveReason> {
    if state.is_game_over() {
        return Some(IllegalMoveReason::GameComplete);
    }
    let (a, b) = (state.current.low, state.current.high);
    let (c, d) = (state.opponent.low, state.opponent.high);
    match action {
        Action::AttackLL => check_attack(a, c),
        Action::AttackLR => check_attack(a, d),
        Action::AttackRL => check_attack(b, c),
        Action::AttackRR => check_attack(b, d),
        Action::SwapL2R => check_swap(a >= 2, b <= 2),
        Action::SwapL1R => check_swap(a >= 1, b <= 3),
        Action::SwapR1L => check_swap(b >= 1, a + 2 <= b),
        Action::SwapR2L => check_swap(b >= 2, a + 4 <= b),
    }
}

pub fn is_legal(state: &GameState, action: Action) -> bool {
    check_action(state, action).is_none()
}

/// Legal actions in canonical order. Errors if there are none, which
/// happens for finished games: check `is_game_over` first.
pub fn legal_actions(state: &GameState) -> Result<Vec<Action>, EngineError> {
    let actions: Vec<Action> = Action::ALL
        .into_iter()
        .filter(|&action| is_legal(state, action))
        .collect();
    if actions.is_empty() {
        return Err(EngineError::NoLegalActions(*state));
    }
    Ok(actions)
}

/// Applies `action` and hands the turn over: the result is seen from the
/// opponent's side.
pub fn step(state: &GameState, action: Action) -> Result<GameState, EngineError> {
    if let Some(reason) = check_action(state, action) {
        return Err(EngineError::IllegalAction {
            state: *state,
            action,
            reason,
        });
    }

    let (a, b) = (state.current.low, state.current.high);
    let (c, d) = (state.opponent.low, state.opponent.high);
    let mut mover = state.current;
    let mut target = state.opponent;
    match action {
        Action::AttackLL => target = normalize(a + c, d),
        Action::AttackLR => target = normalize(c, a + d),
        Action::AttackRL => target = normalize(b + c, d),
        Action::AttackRR => target = normalize(c, b + d),
        Action::SwapL2R => mover = normalize(a - 2, b + 2),
        Action::SwapL1R => mover = normalize(a - 1, b + 1),
        Action::SwapR1L => mover = normalize(a + 1, b - 1),
        Action::SwapR2L => mover = normalize(a + 2, b - 2),
    }

    Ok(GameState::new(target, mover))
}

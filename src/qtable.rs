use std::cmp::Ordering;
use std::collections::HashMap;

use itertools::Itertools;

use crate::engine::{Action, GameState};

/// Action values per state. Rows are created the first time a state is
/// written; anything never written reads as `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    values: HashMap<GameState, [f64; Action::COUNT]>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &GameState, action: Action) -> f64 {
        self.values
            .get(state)
            .map_or(0.0, |row| row[action.index()])
    }

    pub fn update(&mut self, state: &GameState, action: Action, value: f64) {
        self.values.entry(*state).or_insert([0.0; Action::COUNT])[action.index()] = value;
    }

    /// All eight values for `state` in canonical action order.
    pub fn row(&self, state: &GameState) -> [f64; Action::COUNT] {
        self.values
            .get(state)
            .copied()
            .unwrap_or([0.0; Action::COUNT])
    }

    pub fn set_row(&mut self, state: &GameState, row: [f64; Action::COUNT]) {
        self.values.insert(*state, row);
    }

    /// Number of states with a stored row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, state: &GameState) -> bool {
        self.values.contains_key(state)
    }

    /// Highest value among `actions`, `None` when `actions` is empty.
    pub fn max_value(&self, state: &GameState, actions: &[Action]) -> Option<f64> {
        actions
            .iter()
            .map(|&action| self.get(state, action))
            .max_by(compare_values)
    }

    /// Every action in `actions` that attains the maximum value.
    pub fn best_actions(&self, state: &GameState, actions: &[Action]) -> Vec<Action> {
        actions
            .iter()
            .copied()
            .max_set_by(|&x, &y| compare_values(&self.get(state, x), &self.get(state, y)))
    }

    /// Euclidean distance to `other` over every stored entry of either table.
    pub fn distance(&self, other: &QTable) -> f64 {
        let states = self
            .values
            .keys()
            .chain(other.values.keys().filter(|s| !self.values.contains_key(*s)));
        states
            .flat_map(|state| {
                let (mine, theirs) = (self.row(state), other.row(state));
                (0..Action::COUNT).map(move |i| (mine[i] - theirs[i]).powi(2))
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Dense view indexed by canonical state id.
    pub fn to_dense(&self) -> Vec<[f64; Action::COUNT]> {
        GameState::all().map(|state| self.row(&state)).collect()
    }
}

fn compare_values(x: &f64, y: &f64) -> Ordering {
    x.partial_cmp(y).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Hand;

    #[test]
    fn test_default_zero() {
        let table = QTable::new();
        let state = GameState::initial();
        for action in Action::ALL {
            assert_eq!(0.0, table.get(&state, action));
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_update_is_lazy() {
        let mut table = QTable::new();
        let state = GameState::initial();
        table.update(&state, Action::AttackRR, 0.25);
        assert_eq!(1, table.len());
        assert!(table.contains(&state));
        assert_eq!(0.25, table.get(&state, Action::AttackRR));
        assert_eq!(0.0, table.get(&state, Action::AttackLL));
        assert!(!table.contains(&GameState::new(Hand::new(0, 1), Hand::new(1, 1))));
    }

    #[test]
    fn test_best_actions_ties() {
        let mut table = QTable::new();
        let state = GameState::initial();
        let actions = [Action::AttackLL, Action::AttackLR, Action::SwapL1R];
        assert_eq!(actions.to_vec(), table.best_actions(&state, &actions));

        table.update(&state, Action::AttackLR, 0.5);
        table.update(&state, Action::SwapL1R, 0.5);
        table.update(&state, Action::AttackLL, -0.1);
        assert_eq!(
            vec![Action::AttackLR, Action::SwapL1R],
            table.best_actions(&state, &actions)
        );
        assert_eq!(Some(0.5), table.max_value(&state, &actions));
        assert_eq!(None, table.max_value(&state, &[]));
    }

    #[test]
    fn test_distance() {
        let mut a = QTable::new();
        let mut b = QTable::new();
        assert_eq!(0.0, a.distance(&b));

        let s1 = GameState::initial();
        let s2 = GameState::new(Hand::new(1, 2), Hand::new(1, 1));
        a.update(&s1, Action::AttackLL, 3.0);
        b.update(&s2, Action::SwapL1R, 4.0);
        assert_eq!(5.0, a.distance(&b));
        assert_eq!(5.0, b.distance(&a));
    }

    #[test]
    fn test_dense() {
        let mut table = QTable::new();
        let state = GameState::new(Hand::new(0, 4), Hand::new(2, 3));
        table.update(&state, Action::SwapR2L, -0.75);
        let dense = table.to_dense();
        assert_eq!(GameState::COUNT, dense.len());
        assert_eq!(-0.75, dense[state.id()][Action::SwapR2L.index()]);
        assert_eq!(-0.75, dense.iter().flatten().sum::<f64>());
    }
}

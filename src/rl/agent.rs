// src/rl/agent.rs
//
// Tabular Q-learning agent for spectrum allocation decisions.
//
// The agent keeps a sparse table from quantized network-state keys to
// dense per-action value rows and selects actions epsilon-greedily,
// masked to whatever the spectrum search currently reports as feasible.
// Exploration draws come from an owned seeded RNG so a training run can
// be replayed bit-for-bit from its seed.

use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::RlConfig;
use crate::types::Action;

use super::action_space::{CodecError, RequestActions};

/// Quantized state key.
///
/// Raw state features are continuous, so the table is keyed on a
/// fixed-point rendering: each feature rounded to two decimals and
/// stored in integer hundredths. This bounds table cardinality at the
/// cost of state-space resolution, and keeps `Eq`/`Hash` exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(Vec<i64>);

impl StateKey {
    pub fn from_features(features: &[f64]) -> Self {
        Self(features.iter().map(|&v| (v * 100.0).round() as i64).collect())
    }
}

/// Epsilon-greedy tabular Q-learning agent.
pub struct QLearningAgent {
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_min: f64,
    action_size: usize,
    q_table: HashMap<StateKey, Vec<f64>>,
    rng: ChaCha8Rng,
}

impl QLearningAgent {
    /// Build an agent for an action space of the given size, seeded from
    /// the config. The config must have been validated.
    pub fn new(rl: &RlConfig, action_size: usize) -> Self {
        debug_assert!(rl.validate().is_ok());
        debug_assert!(action_size > 0);
        Self {
            learning_rate: rl.learning_rate,
            discount_factor: rl.discount_factor,
            epsilon: rl.epsilon,
            epsilon_decay: rl.epsilon_decay,
            epsilon_min: rl.epsilon_min,
            action_size,
            q_table: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(rl.seed),
        }
    }

    /// Reseed the exploration RNG (e.g. between evaluation episodes).
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Current exploration probability.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of distinct quantized states in the table.
    pub fn q_table_states(&self) -> usize {
        self.q_table.len()
    }

    /// Value row for a state, if the state has ever been learned on.
    pub fn q_row(&self, state: &[f64]) -> Option<&[f64]> {
        self.q_table
            .get(&StateKey::from_features(state))
            .map(Vec::as_slice)
    }

    /// Choose an action for the current state, epsilon-greedily, from
    /// the externally computed set of feasible actions.
    ///
    /// Returns `None` only when `available` is empty; the caller decides
    /// what blocking a request means. Policy lookups are read-only: a
    /// state first seen here leaves the table untouched.
    pub fn act(
        &mut self,
        actions: &RequestActions<'_>,
        state: &[f64],
        available: &[Action],
    ) -> Option<Action> {
        if available.is_empty() {
            return None;
        }

        // Explore.
        if self.rng.gen::<f64>() < self.epsilon {
            return Some(self.pick_uniform(available));
        }

        // Exploit. An unseen state has no row and falls back to a
        // uniform draw.
        let mut best: Option<usize> = None;
        if let Some(row) = self.q_table.get(&StateKey::from_features(state)) {
            // Mask the row to the feasible set. Entries of `available`
            // the codec cannot resolve (stale paths and the like) never
            // match an index and are skipped, exactly as if their value
            // were unknown.
            let available_indices: HashSet<usize> = available
                .iter()
                .filter_map(|a| actions.encode(a).ok())
                .collect();

            let mut best_q = f64::NEG_INFINITY;
            for (index, &q) in row.iter().enumerate() {
                if available_indices.contains(&index) && (best.is_none() || q > best_q) {
                    best = Some(index);
                    best_q = q;
                }
            }
        }

        match best {
            Some(index) => Some(actions.decode(index)),
            None => Some(self.pick_uniform(available)),
        }
    }

    /// One-step Q-learning update:
    /// `Q[s][a] += alpha * (reward + gamma * max(Q[s']) - Q[s][a])`,
    /// followed by the epsilon decay, clamped to the floor.
    ///
    /// Rows for both quantized states are materialized lazily here;
    /// this is the only place the table grows.
    pub fn learn(
        &mut self,
        actions: &RequestActions<'_>,
        state: &[f64],
        action: &Action,
        reward: f64,
        next_state: &[f64],
    ) -> Result<(), CodecError> {
        let key = StateKey::from_features(state);
        let next_key = StateKey::from_features(next_state);

        let action_size = self.action_size;
        self.q_table
            .entry(key.clone())
            .or_insert_with(|| vec![0.0; action_size]);
        self.q_table
            .entry(next_key.clone())
            .or_insert_with(|| vec![0.0; action_size]);

        let index = actions.encode(action)?;

        let next_max = self
            .q_table
            .get(&next_key)
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .unwrap_or(0.0);

        if let Some(row) = self.q_table.get_mut(&key) {
            let current = row[index];
            row[index] =
                current + self.learning_rate * (reward + self.discount_factor * next_max - current);
        }

        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
        Ok(())
    }

    fn pick_uniform(&mut self, available: &[Action]) -> Action {
        available[self.rng.gen_range(0..available.len())].clone()
    }
}

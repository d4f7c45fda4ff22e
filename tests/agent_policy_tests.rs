//! Policy behaviour tests for the tabular agent.
//!
//! Pins the epsilon-greedy contract: pure exploitation at epsilon 0
//! (argmax with stable tie-breaking), pure exploration at epsilon 1
//! (membership plus rough uniformity under a fixed seed), the one-step
//! update arithmetic, and the epsilon schedule.

use std::collections::HashMap;

use flexgrid::{Action, ActionSpace, Config, KPaths, ModulationFormat, Path, QLearningAgent};

fn fixture(epsilon: f64) -> (Config, ActionSpace) {
    let mut cfg = Config::default();
    cfg.num_channels = 8;
    cfg.max_required_slots = 2;
    cfg.path_count = 2;
    cfg.modulations = vec![ModulationFormat::new("QPSK", 6.5)];
    cfg.rl.epsilon = epsilon;
    cfg.rl.epsilon_min = 0.0;

    let mut k_paths = KPaths::new();
    k_paths.insert(
        (0, 3),
        vec![Path::new(vec![0, 1, 3]), Path::new(vec![0, 2, 3])],
    );
    let space = ActionSpace::new(&cfg, k_paths).unwrap();
    (cfg, space)
}

fn action(start: usize) -> Action {
    Action {
        path: Path::new(vec![0, 1, 3]),
        modulation: "QPSK".to_string(),
        start_slot: start,
        required_slots: 1,
    }
}

/// With epsilon 0 and a populated row, act returns the available action
/// with strictly maximal value.
#[test]
fn test_greedy_act_returns_argmax() {
    let (cfg, space) = fixture(0.0);
    let req = space.request(0, 3).unwrap();
    let mut agent = QLearningAgent::new(&cfg.rl, space.action_size());

    let state = [0.4, 0.7];
    agent.learn(&req, &state, &action(5), 10.0, &[9.9]).unwrap();
    agent.learn(&req, &state, &action(1), 1.0, &[9.9]).unwrap();

    let available = vec![action(0), action(1), action(5)];
    let chosen = agent.act(&req, &state, &available).unwrap();
    assert_eq!(chosen, action(5));
}

/// Ties resolve to the lowest action index among the tied entries,
/// regardless of the order of the available list.
#[test]
fn test_greedy_tie_breaks_to_lowest_index() {
    let (cfg, space) = fixture(0.0);
    let req = space.request(0, 3).unwrap();
    let mut agent = QLearningAgent::new(&cfg.rl, space.action_size());

    // Materialize an all-zero row: a zero-reward transition into a
    // zero-valued state leaves every cell at 0.
    let state = [0.4, 0.7];
    agent.learn(&req, &state, &action(0), 0.0, &[9.9]).unwrap();

    let available = vec![action(5), action(2), action(6)];
    let chosen = agent.act(&req, &state, &available).unwrap();
    assert_eq!(chosen, action(2), "lowest encoded index wins the tie");
}

/// With epsilon 1, act returns only members of the available set, and
/// over many trials every member shows up.
#[test]
fn test_exploration_is_uniform_over_available() {
    let (mut cfg, space) = fixture(1.0);
    cfg.rl.epsilon_decay = 1.0;
    let req = space.request(0, 3).unwrap();
    let mut agent = QLearningAgent::new(&cfg.rl, space.action_size());

    let available = vec![action(0), action(3), action(6)];
    let mut counts: HashMap<usize, u32> = HashMap::new();
    for _ in 0..300 {
        let chosen = agent.act(&req, &[0.1], &available).unwrap();
        assert!(available.contains(&chosen));
        *counts.entry(chosen.start_slot).or_insert(0) += 1;
    }

    // Expected ~100 per action; the seed is fixed, so this is a
    // deterministic check that no option is starved.
    for start in [0, 3, 6] {
        assert!(
            counts[&start] >= 50,
            "start {} drawn only {} times",
            start,
            counts[&start]
        );
    }
}

/// learn updates exactly one cell, to
/// old + alpha * (reward + gamma * max(next_row) - old).
#[test]
fn test_learn_update_arithmetic() {
    let (cfg, space) = fixture(0.0);
    let req = space.request(0, 3).unwrap();
    let mut agent = QLearningAgent::new(&cfg.rl, space.action_size());

    let s_a = [1.0];
    let s_b = [2.0];
    let s_c = [3.0];
    let a = action(4);
    let index = req.encode(&a).unwrap();

    // Q[s_b][a] = 0 + 0.1 * (3.0 + 0.95 * 0 - 0) = 0.3
    agent.learn(&req, &s_b, &a, 3.0, &s_c).unwrap();
    assert!((agent.q_row(&s_b).unwrap()[index] - 0.3).abs() < 1e-9);

    // Q[s_a][a] = 0 + 0.1 * (1.0 + 0.95 * 0.3 - 0) = 0.1285
    agent.learn(&req, &s_a, &a, 1.0, &s_b).unwrap();
    let row = agent.q_row(&s_a).unwrap();
    assert!((row[index] - 0.1285).abs() < 1e-9);

    // Every other cell of the row is untouched.
    for (i, &q) in row.iter().enumerate() {
        if i != index {
            assert_eq!(q, 0.0, "cell {} was touched", i);
        }
    }
}

/// Epsilon is non-increasing across learn calls and never drops below
/// the configured floor.
#[test]
fn test_epsilon_schedule() {
    let (mut cfg, space) = fixture(0.5);
    cfg.rl.epsilon_decay = 0.5;
    cfg.rl.epsilon_min = 0.2;
    let req = space.request(0, 3).unwrap();
    let mut agent = QLearningAgent::new(&cfg.rl, space.action_size());

    assert_eq!(agent.epsilon(), 0.5);
    agent.learn(&req, &[0.0], &action(0), 0.0, &[1.0]).unwrap();
    assert!((agent.epsilon() - 0.25).abs() < 1e-12);
    agent.learn(&req, &[0.0], &action(0), 0.0, &[1.0]).unwrap();
    assert_eq!(agent.epsilon(), 0.2, "clamped at the floor");
    agent.learn(&req, &[0.0], &action(0), 0.0, &[1.0]).unwrap();
    assert_eq!(agent.epsilon(), 0.2);
}

/// Policy lookups never grow the table; only learn does.
#[test]
fn test_table_growth_is_learn_only() {
    let (cfg, space) = fixture(0.0);
    let req = space.request(0, 3).unwrap();
    let mut agent = QLearningAgent::new(&cfg.rl, space.action_size());

    let available = vec![action(0)];
    for i in 0..20 {
        agent.act(&req, &[i as f64], &available).unwrap();
    }
    assert_eq!(agent.q_table_states(), 0);

    agent.learn(&req, &[0.0], &action(0), 1.0, &[1.0]).unwrap();
    assert_eq!(agent.q_table_states(), 2);
}

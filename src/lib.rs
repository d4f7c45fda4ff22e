//! Flexgrid core library.
//!
//! This crate is the routing-and-spectrum-assignment (RSA) core of an
//! elastic optical network simulator: given a connection request that
//! external collaborators have already mapped to candidate paths and
//! modulation formats, it decides which contiguous block of frequency
//! slots to allocate and learns over time, via tabular Q-learning,
//! which (path, modulation, slot-block) combinations perform best.
//!
//! # Architecture
//!
//! - **Types** (`types`): shared domain types — paths, edge keys,
//!   modulation formats, allocation actions.
//!
//! - **Config** (`config`): single source of truth for grid geometry,
//!   the modulation table, and Q-learning hyperparameters, validated
//!   fail-fast before anything learns.
//!
//! - **RL core** (`rl`): the bijective action codec
//!   ([`ActionSpace`]/[`RequestActions`]) and the epsilon-greedy
//!   tabular agent ([`QLearningAgent`]).
//!
//! - **Spectrum** (`spectrum`): per-edge occupancy bitmaps
//!   ([`SpectrumMap`]) and the slot-block search strategies —
//!   deterministic leftmost fit and seeded uniform random fit, each
//!   with a wavelength-continuity-constrained and a flexible entry
//!   point.
//!
//! - **Logging** (`logging`): per-decision telemetry sinks (no-op and
//!   JSONL file).
//!
//! The surrounding discrete-event loop owns the occupancy bitmaps and
//! drives the cycle: enumerate feasible actions with the spectrum
//! search, pick one with [`QLearningAgent::act`], apply it against the
//! grid, then feed the observed reward back through
//! [`QLearningAgent::learn`]. Everything here is synchronous and
//! single-threaded; both random sources are explicit seeded
//! dependencies so runs replay deterministically.

pub mod config;
pub mod logging;
pub mod rl;
pub mod spectrum;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{
    default_modulations, resolve_exploration_profile, Config, ConfigError, EffectiveProfile,
    ExplorationProfile, ProfileSource, RlConfig,
};

pub use logging::{DecisionRecord, EventSink, FileSink, NoopSink};

pub use rl::{ActionSpace, CodecError, QLearningAgent, RequestActions, StateKey};

pub use spectrum::{enumerate_available_actions, SpectrumMap};

pub use types::{Action, EdgeKey, KPaths, ModulationFormat, NodeId, Path, SlotIndex};

// src/config.rs
//
// Central configuration for the flexgrid RSA core.
// This is the single source of truth for the spectrum-grid geometry
// (channel count, block widths, candidate-path fan-out), the modulation
// format table, and the Q-learning hyperparameters.
//
// Everything is validated once, up front: a malformed configuration must
// be rejected before any learning occurs.

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ModulationFormat;

/// Environment variable consulted by [`resolve_exploration_profile`].
pub const EXPLORATION_PROFILE_ENV: &str = "FLEXGRID_EXPLORATION_PROFILE";

#[derive(Debug, Clone)]
pub struct Config {
    /// Human-readable config / release version.
    pub version: &'static str,
    /// Number of frequency slots per fiber edge.
    pub num_channels: usize,
    /// Widest slot block a single request may ask for.
    pub max_required_slots: usize,
    /// Number of candidate paths considered per (source, destination)
    /// pair (the `k` of the external k-shortest-path precomputation).
    pub path_count: usize,
    /// Whether allocations must occupy the identical slot range on every
    /// edge of the path (no per-node spectrum conversion).
    pub wavelength_continuity: bool,
    /// Ordered modulation format table. List order fixes the modulation
    /// index used by the action codec and must stay stable for the
    /// lifetime of an agent.
    pub modulations: Vec<ModulationFormat>,
    /// Q-learning hyperparameters.
    pub rl: RlConfig,
}

/// Hyperparameters of the tabular Q-learning agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RlConfig {
    /// Step size alpha of the one-step update, in (0, 1].
    pub learning_rate: f64,
    /// Discount factor gamma, in [0, 1].
    pub discount_factor: f64,
    /// Initial exploration probability, in [0, 1].
    pub epsilon: f64,
    /// Multiplicative epsilon decay applied after every `learn` call,
    /// in (0, 1].
    pub epsilon_decay: f64,
    /// Floor below which epsilon never falls, in [0, epsilon].
    pub epsilon_min: f64,
    /// Seed for the agent's exploration RNG.
    pub seed: u64,
}

impl Default for RlConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.999,
            epsilon_min: 0.01,
            seed: 42,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "0.1.0",
            // 12.5 GHz flex-grid slots over a C-band fiber.
            num_channels: 320,
            max_required_slots: 8,
            path_count: 5,
            wavelength_continuity: true,
            modulations: default_modulations(),
            rl: RlConfig::default(),
        }
    }
}

/// Default modulation table, ordered from most robust to most
/// spectrally efficient. Thresholds are end-to-end GSNR in dB.
pub fn default_modulations() -> Vec<ModulationFormat> {
    vec![
        ModulationFormat::new("BPSK", 3.7),
        ModulationFormat::new("QPSK", 6.5),
        ModulationFormat::new("8QAM", 10.5),
        ModulationFormat::new("16QAM", 12.5),
        ModulationFormat::new("64QAM", 19.3),
    ]
}

/// Coarse exploration preset used by research harnesses.
///
/// These presets only tweak the epsilon schedule on top of the default
/// (which we treat as "Balanced").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplorationProfile {
    Greedy,
    Balanced,
    Exploratory,
}

impl ExplorationProfile {
    /// Return a stable lowercase name for the profile (used in logs).
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplorationProfile::Greedy => "greedy",
            ExplorationProfile::Balanced => "balanced",
            ExplorationProfile::Exploratory => "exploratory",
        }
    }

    /// Parse a profile name (case-insensitive). Returns None if
    /// unrecognized.
    pub fn parse(s: &str) -> Option<ExplorationProfile> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" | "bal" | "b" => Some(ExplorationProfile::Balanced),
            "greedy" | "g" => Some(ExplorationProfile::Greedy),
            "exploratory" | "explore" | "e" => Some(ExplorationProfile::Exploratory),
            _ => None,
        }
    }
}

/// Source of the effective exploration profile (for logging precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// Explicitly provided by the caller (highest priority).
    Caller,
    /// Loaded from the `FLEXGRID_EXPLORATION_PROFILE` environment
    /// variable.
    Env,
    /// Default fallback (Balanced).
    Default,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Caller => "caller",
            ProfileSource::Env => "env",
            ProfileSource::Default => "default",
        }
    }
}

/// Resolved profile with its source for logging.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveProfile {
    pub profile: ExplorationProfile,
    pub source: ProfileSource,
}

impl EffectiveProfile {
    /// Log the effective profile at startup (stderr).
    pub fn log_startup(&self) {
        eprintln!(
            "effective_exploration_profile={} source={}",
            self.profile.as_str(),
            self.source.as_str()
        );
    }
}

/// Resolve the effective exploration profile.
///
/// Precedence (highest to lowest): explicit caller choice, the
/// `FLEXGRID_EXPLORATION_PROFILE` environment variable, Balanced.
pub fn resolve_exploration_profile(caller_profile: Option<ExplorationProfile>) -> EffectiveProfile {
    if let Some(p) = caller_profile {
        return EffectiveProfile {
            profile: p,
            source: ProfileSource::Caller,
        };
    }

    if let Ok(raw) = env::var(EXPLORATION_PROFILE_ENV) {
        if let Some(p) = ExplorationProfile::parse(&raw) {
            return EffectiveProfile {
                profile: p,
                source: ProfileSource::Env,
            };
        }
    }

    EffectiveProfile {
        profile: ExplorationProfile::Balanced,
        source: ProfileSource::Default,
    }
}

impl Config {
    /// Default config with the epsilon schedule of the given preset.
    pub fn for_profile(profile: ExplorationProfile) -> Self {
        let mut cfg = Config::default();
        match profile {
            ExplorationProfile::Greedy => {
                cfg.rl.epsilon = 0.2;
                cfg.rl.epsilon_decay = 0.995;
                cfg.rl.epsilon_min = 0.001;
            }
            ExplorationProfile::Balanced => {}
            ExplorationProfile::Exploratory => {
                cfg.rl.epsilon = 1.0;
                cfg.rl.epsilon_decay = 0.9995;
                cfg.rl.epsilon_min = 0.05;
            }
        }
        cfg
    }

    /// Validate the full configuration. Must pass before constructing an
    /// action space or an agent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.max_required_slots == 0 || self.max_required_slots > self.num_channels {
            return Err(ConfigError::InvalidMaxRequiredSlots {
                max_required_slots: self.max_required_slots,
                num_channels: self.num_channels,
            });
        }
        if self.path_count == 0 {
            return Err(ConfigError::NoPaths);
        }
        if self.modulations.is_empty() {
            return Err(ConfigError::NoModulations);
        }
        for (i, m) in self.modulations.iter().enumerate() {
            if !m.gsnr_threshold_db.is_finite() {
                return Err(ConfigError::InvalidThreshold {
                    name: m.name.clone(),
                });
            }
            if self.modulations[..i].iter().any(|o| o.name == m.name) {
                return Err(ConfigError::DuplicateModulation {
                    name: m.name.clone(),
                });
            }
        }
        self.rl.validate()
    }
}

impl RlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("learning_rate", self.learning_rate, 0.0, 1.0, false)?;
        check_range("discount_factor", self.discount_factor, 0.0, 1.0, true)?;
        check_range("epsilon", self.epsilon, 0.0, 1.0, true)?;
        check_range("epsilon_decay", self.epsilon_decay, 0.0, 1.0, false)?;
        check_range("epsilon_min", self.epsilon_min, 0.0, 1.0, true)?;
        if self.epsilon_min > self.epsilon {
            return Err(ConfigError::EpsilonFloorAboveEpsilon {
                floor: self.epsilon_min,
                epsilon: self.epsilon,
            });
        }
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
    lo_inclusive: bool,
) -> Result<(), ConfigError> {
    let below = if lo_inclusive { value < lo } else { value <= lo };
    if !value.is_finite() || below || value > hi {
        return Err(ConfigError::OutOfRange { field, value });
    }
    Ok(())
}

/// Construction-time configuration errors. All of these are fatal: the
/// caller handed over a config no agent should ever learn under.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoChannels,
    InvalidMaxRequiredSlots {
        max_required_slots: usize,
        num_channels: usize,
    },
    NoPaths,
    NoModulations,
    DuplicateModulation {
        name: String,
    },
    InvalidThreshold {
        name: String,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
    },
    EpsilonFloorAboveEpsilon {
        floor: f64,
        epsilon: f64,
    },
    /// `path_count * modulation_count * slot_count * max_required_slots`
    /// does not fit in a `usize`.
    ActionSpaceOverflow,
    /// A candidate-path list is empty or longer than `path_count`.
    InvalidCandidateList {
        source: u32,
        destination: u32,
        len: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoChannels => write!(f, "num_channels must be positive"),
            ConfigError::InvalidMaxRequiredSlots {
                max_required_slots,
                num_channels,
            } => write!(
                f,
                "max_required_slots must be in [1, num_channels]: got {} with {} channels",
                max_required_slots, num_channels
            ),
            ConfigError::NoPaths => write!(f, "path_count must be positive"),
            ConfigError::NoModulations => write!(f, "modulation table is empty"),
            ConfigError::DuplicateModulation { name } => {
                write!(f, "duplicate modulation format {:?}", name)
            }
            ConfigError::InvalidThreshold { name } => {
                write!(f, "non-finite GSNR threshold for modulation {:?}", name)
            }
            ConfigError::OutOfRange { field, value } => {
                write!(f, "hyperparameter {} out of range: {}", field, value)
            }
            ConfigError::EpsilonFloorAboveEpsilon { floor, epsilon } => write!(
                f,
                "epsilon_min {} exceeds initial epsilon {}",
                floor, epsilon
            ),
            ConfigError::ActionSpaceOverflow => {
                write!(f, "action space size overflows usize")
            }
            ConfigError::InvalidCandidateList {
                source,
                destination,
                len,
            } => write!(
                f,
                "candidate list for ({}, {}) has invalid length {}",
                source, destination, len
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// src/rl/action_space.rs
//
// Combinatorial action codec for the RSA agent.
//
// An allocation decision (path, modulation, start slot, block width) is
// stored in the Q-table as a single integer index. The mapping is a
// mixed-radix encoding with digit bases
// (path_count, modulation_count, slot_count, max_required_slots):
// the path index is the most significant digit, the (1-based) block
// width the least significant. Encode and decode are mutual inverses
// over their valid domains.

use std::fmt;

use crate::config::{Config, ConfigError};
use crate::types::{Action, KPaths, ModulationFormat, NodeId, Path};

/// Validated action-space geometry plus the lookup tables the codec
/// needs: the candidate-path lists per (source, destination) pair and
/// the ordered modulation format table.
#[derive(Debug, Clone)]
pub struct ActionSpace {
    k_paths: KPaths,
    modulations: Vec<ModulationFormat>,
    path_count: usize,
    slot_count: usize,
    max_required_slots: usize,
    action_size: usize,
}

impl ActionSpace {
    /// Build the action space from the config geometry and the
    /// externally precomputed candidate paths.
    ///
    /// Fails fast on malformed geometry: the index arithmetic silently
    /// corrupts if any digit base is wrong, so everything is checked
    /// here, once.
    pub fn new(cfg: &Config, k_paths: KPaths) -> Result<Self, ConfigError> {
        cfg.validate()?;

        for ((source, destination), paths) in &k_paths {
            if paths.is_empty() || paths.len() > cfg.path_count {
                return Err(ConfigError::InvalidCandidateList {
                    source: *source,
                    destination: *destination,
                    len: paths.len(),
                });
            }
        }

        let action_size = cfg
            .path_count
            .checked_mul(cfg.modulations.len())
            .and_then(|n| n.checked_mul(cfg.num_channels))
            .and_then(|n| n.checked_mul(cfg.max_required_slots))
            .ok_or(ConfigError::ActionSpaceOverflow)?;

        Ok(Self {
            k_paths,
            modulations: cfg.modulations.clone(),
            path_count: cfg.path_count,
            slot_count: cfg.num_channels,
            max_required_slots: cfg.max_required_slots,
            action_size,
        })
    }

    /// Total number of encodable actions:
    /// `path_count * modulation_count * slot_count * max_required_slots`.
    pub fn action_size(&self) -> usize {
        self.action_size
    }

    pub fn path_count(&self) -> usize {
        self.path_count
    }

    pub fn modulation_count(&self) -> usize {
        self.modulations.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn max_required_slots(&self) -> usize {
        self.max_required_slots
    }

    /// The ordered modulation format table.
    pub fn modulations(&self) -> &[ModulationFormat] {
        &self.modulations
    }

    /// GSNR threshold (dB) of a format, by name.
    pub fn gsnr_threshold(&self, modulation: &str) -> Option<f64> {
        self.modulations
            .iter()
            .find(|m| m.name == modulation)
            .map(|m| m.gsnr_threshold_db)
    }

    /// Resolve the request context for a (source, destination) pair.
    ///
    /// The returned view borrows the pair's ordered candidate list and
    /// carries the codec for it; all encode/decode calls for the request
    /// go through the view.
    pub fn request(
        &self,
        source: NodeId,
        destination: NodeId,
    ) -> Result<RequestActions<'_>, CodecError> {
        let paths = self
            .k_paths
            .get(&(source, destination))
            .ok_or(CodecError::UnknownRequest {
                source,
                destination,
            })?;
        Ok(RequestActions {
            space: self,
            paths,
            source,
            destination,
        })
    }
}

/// Per-request view of the action space: the codec bound to the ordered
/// candidate-path list of one (source, destination) pair.
#[derive(Debug, Clone, Copy)]
pub struct RequestActions<'a> {
    space: &'a ActionSpace,
    paths: &'a [Path],
    source: NodeId,
    destination: NodeId,
}

impl<'a> RequestActions<'a> {
    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Ordered candidate paths for the pair; position is the path index.
    pub fn paths(&self) -> &'a [Path] {
        self.paths
    }

    pub fn action_size(&self) -> usize {
        self.space.action_size
    }

    pub fn modulations(&self) -> &'a [ModulationFormat] {
        self.space.modulations()
    }

    pub fn gsnr_threshold(&self, modulation: &str) -> Option<f64> {
        self.space.gsnr_threshold(modulation)
    }

    /// Encode an action into its Q-table index.
    ///
    /// Fails if the action's path is not in this pair's candidate list
    /// or its modulation is not in the format table. Both indicate a
    /// caller holding stale lookup tables and are surfaced immediately.
    pub fn encode(&self, action: &Action) -> Result<usize, CodecError> {
        let path_index = self
            .paths
            .iter()
            .position(|p| p == &action.path)
            .ok_or(CodecError::UnknownPath {
                source: self.source,
                destination: self.destination,
            })?;
        let modulation_index = self
            .space
            .modulations
            .iter()
            .position(|m| m.name == action.modulation)
            .ok_or_else(|| CodecError::UnknownModulation {
                name: action.modulation.clone(),
            })?;

        debug_assert!(action.start_slot < self.space.slot_count);
        debug_assert!((1..=self.space.max_required_slots).contains(&action.required_slots));

        let index = ((path_index * self.space.modulation_count() + modulation_index)
            * self.space.slot_count
            + action.start_slot)
            * self.space.max_required_slots
            + (action.required_slots - 1);
        Ok(index)
    }

    /// Decode a Q-table index back into an action.
    ///
    /// Pure integer arithmetic; never fails for an index in
    /// `[0, action_size)` whose path digit addresses an existing
    /// candidate. Anything else is a caller contract violation.
    pub fn decode(&self, index: usize) -> Action {
        debug_assert!(index < self.space.action_size);

        let mut rest = index;
        let required_slots = rest % self.space.max_required_slots + 1;
        rest /= self.space.max_required_slots;
        let start_slot = rest % self.space.slot_count;
        rest /= self.space.slot_count;
        let modulation_index = rest % self.space.modulation_count();
        let path_index = rest / self.space.modulation_count();

        Action {
            path: self.paths[path_index].clone(),
            modulation: self.space.modulations[modulation_index].name.clone(),
            start_slot,
            required_slots,
        }
    }
}

/// Codec contract violations. All of these mean the caller and the
/// codec disagree on the lookup tables; none are retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No candidate-path list exists for the (source, destination) pair.
    UnknownRequest { source: NodeId, destination: NodeId },
    /// The action's path is not in the pair's candidate list.
    UnknownPath { source: NodeId, destination: NodeId },
    /// The action's modulation name is not in the format table.
    UnknownModulation { name: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownRequest {
                source,
                destination,
            } => write!(f, "no candidate paths for pair ({}, {})", source, destination),
            CodecError::UnknownPath {
                source,
                destination,
            } => write!(
                f,
                "path not in the candidate list for pair ({}, {})",
                source, destination
            ),
            CodecError::UnknownModulation { name } => {
                write!(f, "unknown modulation format {:?}", name)
            }
        }
    }
}

impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModulationFormat;

    fn small_space() -> ActionSpace {
        let mut cfg = Config::default();
        cfg.num_channels = 8;
        cfg.max_required_slots = 4;
        cfg.path_count = 2;
        cfg.modulations = vec![
            ModulationFormat::new("QPSK", 6.5),
            ModulationFormat::new("16QAM", 12.5),
        ];

        let mut k_paths = KPaths::new();
        k_paths.insert(
            (0, 3),
            vec![Path::new(vec![0, 1, 3]), Path::new(vec![0, 2, 3])],
        );
        ActionSpace::new(&cfg, k_paths).unwrap()
    }

    #[test]
    fn action_size_is_digit_base_product() {
        let space = small_space();
        assert_eq!(space.action_size(), 2 * 2 * 8 * 4);
    }

    #[test]
    fn encode_matches_hand_computation() {
        let space = small_space();
        let req = space.request(0, 3).unwrap();

        // path index 1, modulation index 0, start 3, width 2:
        // ((1*2 + 0)*8 + 3)*4 + (2 - 1) = 77
        let action = Action {
            path: Path::new(vec![0, 2, 3]),
            modulation: "QPSK".to_string(),
            start_slot: 3,
            required_slots: 2,
        };
        assert_eq!(req.encode(&action).unwrap(), 77);
        assert_eq!(req.decode(77), action);
    }

    #[test]
    fn path_is_most_significant_digit() {
        let space = small_space();
        let req = space.request(0, 3).unwrap();

        let base = Action {
            path: Path::new(vec![0, 1, 3]),
            modulation: "QPSK".to_string(),
            start_slot: 0,
            required_slots: 1,
        };
        let mut other = base.clone();
        other.path = Path::new(vec![0, 2, 3]);

        let stride = space.modulation_count() * space.slot_count() * space.max_required_slots();
        assert_eq!(
            req.encode(&other).unwrap() - req.encode(&base).unwrap(),
            stride
        );
    }

    #[test]
    fn codec_round_trips_over_the_full_index_range() {
        let space = small_space();
        let req = space.request(0, 3).unwrap();

        for index in 0..space.action_size() {
            let action = req.decode(index);
            assert_eq!(req.encode(&action).unwrap(), index, "index {}", index);
            assert_eq!(req.decode(req.encode(&action).unwrap()), action);
        }
    }

    #[test]
    fn unknown_path_is_rejected() {
        let space = small_space();
        let req = space.request(0, 3).unwrap();

        let action = Action {
            path: Path::new(vec![0, 1, 2, 3]),
            modulation: "QPSK".to_string(),
            start_slot: 0,
            required_slots: 1,
        };
        assert_eq!(
            req.encode(&action),
            Err(CodecError::UnknownPath {
                source: 0,
                destination: 3
            })
        );
    }

    #[test]
    fn unknown_modulation_is_rejected() {
        let space = small_space();
        let req = space.request(0, 3).unwrap();

        let action = Action {
            path: Path::new(vec![0, 1, 3]),
            modulation: "64QAM".to_string(),
            start_slot: 0,
            required_slots: 1,
        };
        assert!(matches!(
            req.encode(&action),
            Err(CodecError::UnknownModulation { .. })
        ));
    }

    #[test]
    fn unknown_pair_is_rejected() {
        let space = small_space();
        assert_eq!(
            space.request(3, 0).err(),
            Some(CodecError::UnknownRequest {
                source: 3,
                destination: 0
            })
        );
    }

    #[test]
    fn oversized_candidate_list_is_rejected() {
        let mut cfg = Config::default();
        cfg.path_count = 1;

        let mut k_paths = KPaths::new();
        k_paths.insert(
            (0, 3),
            vec![Path::new(vec![0, 1, 3]), Path::new(vec![0, 2, 3])],
        );
        assert!(matches!(
            ActionSpace::new(&cfg, k_paths),
            Err(ConfigError::InvalidCandidateList { len: 2, .. })
        ));
    }

    #[test]
    fn gsnr_threshold_lookup() {
        let space = small_space();
        assert_eq!(space.gsnr_threshold("16QAM"), Some(12.5));
        assert_eq!(space.gsnr_threshold("64QAM"), None);
    }
}

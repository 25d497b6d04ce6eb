use serde::{Deserialize, Serialize};

use fold_geom::Tolerance;

/// Tunables for joint construction and interactive editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Angle quantum for side and top snapping (radians).
    pub angle_step: f64,
    /// Floor for wing and apex lengths; also the hinge's margin from the
    /// adjacency endpoints after a shift.
    pub min_length: f64,
    /// Fraction of the half adjacency axis used to offset the V-style hinge.
    pub hinge_ratio: f64,
    /// Apex height proportion.
    pub golden_ratio: f64,
    /// Offset match radius for symmetry propagation, V-style.
    pub symmetry_epsilon_v: f64,
    /// Offset match radius for symmetry propagation, Special V-style.
    pub symmetry_epsilon_special: f64,
    /// A V-style free move is refused closer than this to a polygon neighbour.
    pub neighbour_gap: f64,
    /// Pick radius of the wing proxy tested while the angle is locked.
    pub wing_proxy_radius: f64,
    /// Cap on ancestor walks through the patch tree.
    pub max_ancestor_depth: usize,
    pub tolerance: Tolerance,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            angle_step: std::f64::consts::FRAC_PI_8,
            min_length: 0.5,
            hinge_ratio: 0.4,
            golden_ratio: 1.618,
            symmetry_epsilon_v: 0.1,
            symmetry_epsilon_special: 0.5,
            neighbour_gap: 0.5,
            wing_proxy_radius: 0.15,
            max_ancestor_depth: 256,
            tolerance: Tolerance::default(),
        }
    }
}

impl EngineConfig {
    /// Load overrides from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

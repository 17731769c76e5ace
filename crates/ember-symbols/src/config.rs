//! Engine configuration
//!
//! Weights and limits used by matching and parameterization. The config is
//! passed explicitly to every [`Resolver`](crate::Resolver) and
//! [`Parameterizer`](crate::Parameterizer); nothing is read from global state.

use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matching: MatchConfig,
    pub generics: GenericsConfig,
}

impl EngineConfig {
    /// Load from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Assignability weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Cost of one implicit coercion hop
    pub coercion_weight: f64,
    /// Cost of one step up the super-type/trait hierarchy
    pub supertype_weight: f64,
    /// Longest coercion chain considered
    pub max_coercion_chain: usize,
    /// Two match weights closer than this are a tie
    pub ambiguity_tolerance: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            coercion_weight: 0.5,
            supertype_weight: 0.05,
            max_coercion_chain: 4,
            ambiguity_tolerance: 0.001,
        }
    }
}

/// Parameterization limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericsConfig {
    /// Deepest nesting of parameterizations before giving up
    pub max_depth: usize,
}

impl Default for GenericsConfig {
    fn default() -> Self {
        GenericsConfig { max_depth: 64 }
    }
}

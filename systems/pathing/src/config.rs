//! Search configuration shared by adapters and systems.

use serde::{Deserialize, Serialize};
use waypath_core::Heuristic;

use crate::PathRequest;

/// Movement and heuristic settings for a [`crate::PathEngine`].
///
/// Every field falls back to its default when omitted from a configuration
/// file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathingConfig {
    /// Allow the eight-cell neighbourhood instead of the four orthogonal
    /// cells.
    pub allow_diagonal: bool,
    /// Strategy estimating the remaining cost.
    pub heuristic: Heuristic,
    /// Default heuristic scale applied to requests.
    pub h_modifier: f64,
    /// Scale applied to influence weights before they enter `f`.
    pub influence_multiplier: f64,
}

impl Default for PathingConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: false,
            heuristic: Heuristic::Manhattan,
            h_modifier: 1.0,
            influence_multiplier: 1.0,
        }
    }
}

impl PathingConfig {
    /// Request between the terrain markers using the configured `h_modifier`.
    #[must_use]
    pub fn request(&self) -> PathRequest {
        PathRequest::new(self.h_modifier)
    }
}

use serde::{Deserialize, Serialize};

/// Configuration for graph path resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum number of links a single resolution may follow.
    pub max_hops: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { max_hops: 64 }
    }
}

use serde::{Deserialize, Serialize};

/// Configuration for the canonicalizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Maximum element nesting depth accepted in a document.
    pub max_depth: usize,
    /// Encode sibling subtrees on the rayon thread pool.
    pub parallel: bool,
    /// Strip surrounding whitespace from stored text. Off by default, so
    /// `@value` holds the element's text exactly as written.
    pub trim_text: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            parallel: false,
            trim_text: false,
        }
    }
}

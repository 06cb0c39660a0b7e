use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use meta_graph::GraphConfig;
use meta_types::Address;
use meta_xml::EncoderConfig;

/// Configuration for the `meta` command, read from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    /// Directory of the filesystem store.
    pub store_dir: PathBuf,
    /// Context documents every import consults first, in order.
    pub contexts: Vec<Address>,
    pub encoder: EncoderConfig,
    pub graph: GraphConfig,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".meta"),
            contexts: Vec::new(),
            encoder: EncoderConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl MetaConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

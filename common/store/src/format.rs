use std::{path::Path, str::FromStr};

use common_story::DialogueGraph;
use ron::ser::PrettyConfig;

use crate::StoreError;

/// How an asset is encoded on disk.
///
/// All of them use the same layout: `nodeLinks`, `dialogueNodeData`,
/// `exposedProperties` and `commentBlockData`.
/// JSON is the canonical one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AssetFormat {
    #[allow(missing_docs)]
    Json,
    #[allow(missing_docs)]
    Ron,
    #[allow(missing_docs)]
    Toml,
}

impl AssetFormat {
    /// Picks the format by the file extension.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
            .ok_or_else(|| StoreError::UnknownFormat(path.to_owned()))
    }

    /// Parses the graph.
    /// Doesn't validate it, see [`DialogueGraph::validate`].
    pub fn decode(self, contents: &str) -> Result<DialogueGraph, StoreError> {
        Ok(match self {
            Self::Json => serde_json::from_str(contents)?,
            Self::Ron => ron::from_str(contents)?,
            Self::Toml => toml::from_str(contents)?,
        })
    }

    /// Human readable encoding of the graph.
    pub fn encode(self, graph: &DialogueGraph) -> Result<String, StoreError> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(graph)?,
            Self::Ron => {
                ron::ser::to_string_pretty(graph, PrettyConfig::new())?
            }
            Self::Toml => toml::to_string_pretty(graph)?,
        })
    }
}

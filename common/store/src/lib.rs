//! Reads and writes dialogue assets.
//!
//! One asset is one file holding one [`DialogueGraph`].
//! The encoding is picked by the file extension, see [`AssetFormat`].
//! Writes go to a temporary file first which is then renamed over the
//! target, so a failed save never leaves a half written asset behind.
#![deny(missing_docs)]

mod format;
mod list;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use common_story::{
    editor::{EditorGraph, NodeFactory},
    serializer, DialogError, DialogueGraph,
};
pub use format::AssetFormat;
pub use list::BundledDialog;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading or saving assets.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read or written, most likely not found.
    #[error("Could not access asset file: {0}")]
    Io(#[from] std::io::Error),
    /// The temporary file could not be moved over the asset.
    #[error("Could not replace asset file: {0}")]
    Persist(#[from] tempfile::PersistError),
    /// The .json asset could not be parsed or written.
    #[error("Error in .json asset: {0}")]
    Json(#[from] serde_json::Error),
    /// The .ron asset could not be parsed.
    #[error("Error parsing .ron asset: {0}")]
    RonDe(#[from] ron::error::SpannedError),
    /// The graph could not be written as .ron.
    #[error("Error writing .ron asset: {0}")]
    RonSer(#[from] ron::Error),
    /// The .toml asset could not be parsed.
    #[error("Error parsing .toml asset: {0}")]
    TomlDe(#[from] toml::de::Error),
    /// The graph could not be written as .toml.
    #[error("Error writing .toml asset: {0}")]
    TomlSer(#[from] toml::ser::Error),
    /// The extension does not name any known format.
    #[error("Unknown asset format of '{}'", .0.display())]
    UnknownFormat(PathBuf),
    /// The asset holds a graph that breaks its invariants, or the graph
    /// to save does.
    #[error("Invalid dialogue graph: {0}")]
    Dialog(#[from] DialogError),
}

/// Reads, decodes and validates the asset.
pub fn load(path: impl AsRef<Path>) -> Result<DialogueGraph, StoreError> {
    let path = path.as_ref();
    let format = AssetFormat::from_path(path)?;

    let contents = std::fs::read_to_string(path)?;
    let graph = format.decode(&contents)?;
    graph.validate()?;

    debug!(
        "Loaded '{}' with {} nodes and {} links",
        path.display(),
        graph.nodes().len(),
        graph.links().len()
    );
    Ok(graph)
}

/// Replaces the asset with the graph.
///
/// A graph without links or with dangling references is refused before
/// anything is written.
pub fn save(
    path: impl AsRef<Path>,
    graph: &DialogueGraph,
) -> Result<(), StoreError> {
    let path = path.as_ref();
    let format = AssetFormat::from_path(path)?;

    if graph.links().is_empty() {
        return Err(DialogError::EmptyGraph.into());
    }
    graph.validate()?;
    let contents = format.encode(graph)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)?;

    info!("Saved dialogue to '{}'", path.display());
    Ok(())
}

/// What happens when the designer clicks "Save".
pub fn save_editor(
    path: impl AsRef<Path>,
    editor: &impl EditorGraph,
) -> Result<(), StoreError> {
    let graph = serializer::serialize(editor)?;
    save(path, &graph)
}

/// What happens when the designer clicks "Load".
/// On error the editor is left as it was.
pub fn load_into_editor<F: NodeFactory>(
    path: impl AsRef<Path>,
    editor: &mut F,
) -> Result<DialogueGraph, StoreError> {
    let graph = load(path)?;
    serializer::deserialize(&graph, editor)?;

    Ok(graph)
}

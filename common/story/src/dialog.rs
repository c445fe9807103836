//! Dialogue is a directed graph of text nodes connected by choice links.
//!
//! The graph is stored as four flat collections, in the same shape as
//! the persisted asset:
//! - links, each one a choice from one node to another
//! - nodes, the dialogue lines
//! - exposed properties, global variables substituted into text
//! - comment blocks, which only organize nodes in the editor
//!
//! There is no dedicated entry field.
//! The entry node is the source of the first link, and it is synthetic:
//! it never appears among the nodes.

pub mod player;
mod properties;

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferMany, serde_as, OneOrMany};
use thiserror::Error;
use uuid::Uuid;

pub(crate) use properties::unique_property_name;

/// Title of comment blocks that were created without one.
pub const DEFAULT_COMMENT_BLOCK_TITLE: &str = "Comment Block";

/// Opaque unique identifier of a node.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

/// 2D coordinate of an element in the editor.
/// Has no meaning at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[allow(missing_docs)]
    pub x: f32,
    #[allow(missing_docs)]
    pub y: f32,
}

/// A single dialogue node.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNodeRecord {
    #[serde(rename = "nodeGuid")]
    pub(crate) id: NodeId,
    /// Older assets store a single string, we always write a list.
    #[serde(rename = "dialogueText", default)]
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    pub(crate) text: Vec<String>,
    #[serde(default)]
    pub(crate) position: Position,
}

/// One outgoing choice edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "baseNodeGuid")]
    pub(crate) source: NodeId,
    /// Shown to the player, can be empty.
    #[serde(rename = "portName", default)]
    pub(crate) label: String,
    #[serde(rename = "targetNodeGuid")]
    pub(crate) target: NodeId,
}

/// Global substitution variable.
/// Every `[name]` token in dialogue text and choice labels is replaced
/// with the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedProperty {
    #[serde(rename = "propertyName")]
    pub(crate) name: String,
    #[serde(rename = "propertyValue", default)]
    pub(crate) value: String,
}

/// Groups nodes together in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentBlockRecord {
    #[serde(rename = "childNodes", default)]
    pub(crate) contained: Vec<NodeId>,
    #[serde(default = "default_comment_block_title")]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) position: Position,
}

/// The aggregate root.
/// Field names match the persisted asset layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueGraph {
    #[serde(default)]
    pub(crate) node_links: Vec<LinkRecord>,
    #[serde(default)]
    pub(crate) dialogue_node_data: Vec<DialogueNodeRecord>,
    #[serde(default)]
    pub(crate) exposed_properties: Vec<ExposedProperty>,
    #[serde(default)]
    pub(crate) comment_block_data: Vec<CommentBlockRecord>,
}

/// Errors that can occur when working with a dialogue graph.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DialogError {
    /// Saving a graph without links is refused: it could not even express
    /// the transition out of the entry node.
    #[error("The graph has no links, not even from the entry node")]
    EmptyGraph,
    /// Lookup of a node or property that does not exist.
    #[error("'{0}' not found")]
    NotFound(String),
    /// Playback was asked to follow a choice the current node does not
    /// offer.
    #[error("Choice {index} out of range, node '{node}' offers {available}")]
    InvalidChoice {
        /// Where the player stands.
        node: NodeId,
        /// The requested choice.
        index: usize,
        /// How many choices there are.
        available: usize,
    },
    /// A link or comment block names a node that is not in the graph.
    #[error("{referrer} references node '{node}' which does not exist")]
    DanglingReference {
        /// The missing node.
        node: NodeId,
        /// Who asked for it.
        referrer: Referrer,
    },
    /// Two nodes share the same id.
    #[error("Duplicate node '{0}'")]
    DuplicateNode(NodeId),
}

/// Which record holds a [`DialogError::DanglingReference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Referrer {
    /// Index into the link collection.
    Link(usize),
    /// Index into the comment block collection.
    CommentBlock(usize),
}

impl DialogueGraph {
    /// Empty graph, add records with the `push_*` methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[DialogueNodeRecord] {
        &self.dialogue_node_data
    }

    /// All links in insertion order.
    pub fn links(&self) -> &[LinkRecord] {
        &self.node_links
    }

    /// All properties in insertion order, which is also the order in which
    /// they are substituted.
    pub fn exposed_properties(&self) -> &[ExposedProperty] {
        &self.exposed_properties
    }

    /// All comment blocks in insertion order.
    pub fn comment_blocks(&self) -> &[CommentBlockRecord] {
        &self.comment_block_data
    }

    /// Appends a node.
    /// Uniqueness of ids is checked by [`DialogueGraph::validate`].
    pub fn push_node(&mut self, node: DialogueNodeRecord) {
        self.dialogue_node_data.push(node);
    }

    /// Appends a link.
    /// The very first link pushed determines the entry node.
    pub fn push_link(&mut self, link: LinkRecord) {
        self.node_links.push(link);
    }

    /// Appends a comment block.
    pub fn push_comment_block(&mut self, block: CommentBlockRecord) {
        self.comment_block_data.push(block);
    }

    /// Fails with [`DialogError::NotFound`] if there's no such node.
    pub fn find_node(
        &self,
        id: &NodeId,
    ) -> Result<&DialogueNodeRecord, DialogError> {
        self.dialogue_node_data
            .iter()
            .find(|node| &node.id == id)
            .ok_or_else(|| DialogError::NotFound(id.to_string()))
    }

    /// Whether a node with this id is in the node collection.
    /// The synthetic entry node is not.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.dialogue_node_data.iter().any(|node| &node.id == id)
    }

    /// Links leaving the given node in insertion order.
    /// The order is what the player sees as the order of choices.
    pub fn outgoing_links<'a>(
        &'a self,
        id: &'a NodeId,
    ) -> impl Iterator<Item = &'a LinkRecord> + 'a {
        self.node_links.iter().filter(move |link| &link.source == id)
    }

    /// The first link in the collection leaves the entry node.
    pub fn entry_link(&self) -> Option<&LinkRecord> {
        self.node_links.first()
    }

    /// Id of the synthetic entry node.
    pub fn entry_node_id(&self) -> Option<&NodeId> {
        self.entry_link().map(|link| &link.source)
    }

    /// Adds a new property.
    /// If the name is taken, `(1)` is appended until it's not.
    ///
    /// Returns the property as stored.
    pub fn add_exposed_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &ExposedProperty {
        let name = unique_property_name(&self.exposed_properties, name.into());
        let index = self.exposed_properties.len();
        self.exposed_properties.push(ExposedProperty {
            name,
            value: value.into(),
        });

        &self.exposed_properties[index]
    }

    /// Changes the value of an existing property.
    pub fn set_property_value(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DialogError> {
        let property = self
            .exposed_properties
            .iter_mut()
            .find(|property| property.name == name)
            .ok_or_else(|| DialogError::NotFound(name.to_owned()))?;
        property.value = value.into();

        Ok(())
    }

    /// Replaces `[name]` tokens with the property values, one property at
    /// a time in insertion order.
    pub fn substitute_properties(&self, text: &str) -> String {
        properties::substitute(&self.exposed_properties, text)
    }

    /// Referential integrity check.
    ///
    /// - node ids are unique
    /// - every link target is a node
    /// - every link source is a node or the entry node
    /// - every comment block member is a node or the entry node
    pub fn validate(&self) -> Result<(), DialogError> {
        if let Some(id) = self
            .dialogue_node_data
            .iter()
            .map(|node| &node.id)
            .duplicates()
            .next()
        {
            return Err(DialogError::DuplicateNode(id.clone()));
        }

        let entry = self.entry_node_id();
        let resolves =
            |id: &NodeId| Some(id) == entry || self.contains_node(id);

        for (index, link) in self.node_links.iter().enumerate() {
            if !self.contains_node(&link.target) {
                return Err(DialogError::DanglingReference {
                    node: link.target.clone(),
                    referrer: Referrer::Link(index),
                });
            }

            if !resolves(&link.source) {
                return Err(DialogError::DanglingReference {
                    node: link.source.clone(),
                    referrer: Referrer::Link(index),
                });
            }
        }

        for (index, block) in self.comment_block_data.iter().enumerate() {
            if let Some(id) = block.contained.iter().find(|id| !resolves(*id)) {
                return Err(DialogError::DanglingReference {
                    node: id.clone(),
                    referrer: Referrer::CommentBlock(index),
                });
            }
        }

        Ok(())
    }
}

impl NodeId {
    /// New random id, a v4 UUID.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[allow(missing_docs)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DialogueNodeRecord {
    #[allow(missing_docs)]
    pub fn new(
        id: impl Into<NodeId>,
        text: impl IntoIterator<Item = impl Into<String>>,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into_iter().map(Into::into).collect(),
            position,
        }
    }

    #[allow(missing_docs)]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Raw lines, without property substitution.
    pub fn text(&self) -> &[String] {
        &self.text
    }

    #[allow(missing_docs)]
    pub fn position(&self) -> Position {
        self.position
    }
}

impl LinkRecord {
    #[allow(missing_docs)]
    pub fn new(
        source: impl Into<NodeId>,
        label: impl Into<String>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            source: source.into(),
            label: label.into(),
            target: target.into(),
        }
    }

    #[allow(missing_docs)]
    pub fn source(&self) -> &NodeId {
        &self.source
    }

    /// Raw label, without property substitution.
    pub fn label(&self) -> &str {
        &self.label
    }

    #[allow(missing_docs)]
    pub fn target(&self) -> &NodeId {
        &self.target
    }
}

impl ExposedProperty {
    /// Doesn't check uniqueness, that's up to the collection it's added to.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Default for ExposedProperty {
    fn default() -> Self {
        Self::new("New String", "New Value")
    }
}

impl CommentBlockRecord {
    #[allow(missing_docs)]
    pub fn new(
        title: impl Into<String>,
        position: Position,
        contained: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Self {
            contained: contained.into_iter().collect(),
            title: title.into(),
            position,
        }
    }

    #[allow(missing_docs)]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[allow(missing_docs)]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Ids of the nodes in the block.
    pub fn contained(&self) -> &[NodeId] {
        &self.contained
    }
}

impl Position {
    #[allow(missing_docs)]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

fn default_comment_block_title() -> String {
    DEFAULT_COMMENT_BLOCK_TITLE.to_owned()
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(index) => write!(f, "Link #{index}"),
            Self::CommentBlock(index) => write!(f, "Comment block #{index}"),
        }
    }
}

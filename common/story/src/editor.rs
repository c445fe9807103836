//! What the serializer needs from a node editor.
//!
//! Reading goes through [`EditorGraph`], which hands out every element of
//! the graph as one [`ElementView`] variant.
//! The kind of an element is decided by the editor when it builds the
//! view, the serializer never inspects types.
//!
//! Rebuilding goes through [`NodeFactory`], so the serializer never
//! constructs editor objects on its own.

mod headless;

pub use headless::{
    CommentGroup, EditorEdge, EditorNode, GraphElement, GroupId,
    HeadlessEditor, PortId,
};

use crate::dialog::{ExposedProperty, NodeId, Position};

/// Title of the synthetic entry node.
pub const ENTRY_NODE_TITLE: &str = "START";
/// Text of the synthetic entry node.
pub const ENTRY_NODE_TEXT: &str = "ENTRYPOINT";
/// Label of the single output port of the entry node.
pub const ENTRY_PORT_LABEL: &str = "Next";
/// Label of the input port every dialogue node has.
pub const INPUT_PORT_LABEL: &str = "Input";
/// Where the entry node sits in a fresh editor.
pub const ENTRY_NODE_POSITION: Position = Position::new(100.0, 200.0);

/// A graph element as the editor sees it.
#[derive(Debug, Clone)]
pub enum ElementView<'a> {
    #[allow(missing_docs)]
    Node(NodeView<'a>),
    #[allow(missing_docs)]
    Edge(EdgeView<'a>),
    #[allow(missing_docs)]
    CommentGroup(GroupView<'a>),
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub id: &'a NodeId,
    pub text: &'a [String],
    pub position: Position,
    /// The synthetic entry node is never persisted as a node.
    pub is_entry: bool,
}

/// An edge goes from an output port to an input port.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    /// Node that owns the output port.
    pub source: &'a NodeId,
    /// Label of the output port, becomes the choice label.
    pub label: &'a str,
    /// Edges that are being dragged around don't have the input end yet.
    pub input: Option<EdgeInput<'a>>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy)]
pub struct EdgeInput<'a> {
    pub node: &'a NodeId,
    pub is_entry: bool,
}

#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct GroupView<'a> {
    pub title: &'a str,
    pub position: Position,
    /// Only dialogue nodes, other kinds of contained elements are left out.
    pub contained: Vec<&'a NodeId>,
}

/// Read access to a live editor graph.
pub trait EditorGraph {
    /// All elements in the order the editor keeps them.
    fn elements(&self) -> impl Iterator<Item = ElementView<'_>>;

    /// Contents of the blackboard.
    fn exposed_properties(&self) -> &[ExposedProperty];

    #[allow(missing_docs)]
    fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> {
        self.elements().filter_map(|element| match element {
            ElementView::Node(node) => Some(node),
            _ => None,
        })
    }

    #[allow(missing_docs)]
    fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.elements().filter_map(|element| match element {
            ElementView::Edge(edge) => Some(edge),
            _ => None,
        })
    }

    #[allow(missing_docs)]
    fn groups(&self) -> impl Iterator<Item = GroupView<'_>> {
        self.elements().filter_map(|element| match element {
            ElementView::CommentGroup(group) => Some(group),
            _ => None,
        })
    }
}

/// Builds editor elements from stored records.
///
/// Handles are whatever the editor uses to refer to its nodes and ports.
pub trait NodeFactory {
    /// Refers to a node.
    type Node: Clone;
    /// Refers to a port.
    type Port: Copy;

    /// Removes every element but the entry node, empties the blackboard
    /// and gives the entry node the provided id.
    /// The entry node keeps only its first output port.
    fn reset_to_entry(&mut self, entry_id: &NodeId) -> Self::Node;

    /// Output ports the node already has, in order.
    /// A fresh node has none, the entry node has one.
    fn output_ports(&self, node: &Self::Node) -> Vec<Self::Port>;

    /// New node without any ports.
    fn create_node(
        &mut self,
        id: NodeId,
        text: Vec<String>,
        position: Position,
    ) -> Self::Node;

    #[allow(missing_docs)]
    fn add_input_port(&mut self, node: &Self::Node) -> Self::Port;

    /// Output ports are the choices, the label is shown to the player.
    fn add_output_port(&mut self, node: &Self::Node, label: &str)
        -> Self::Port;

    /// Renames an output port the node already had.
    fn set_port_label(&mut self, port: Self::Port, label: &str);

    /// Edge from an output port to an input port.
    fn connect(&mut self, output: Self::Port, input: Self::Port);

    #[allow(missing_docs)]
    fn set_position(&mut self, node: &Self::Node, position: Position);

    /// Stored properties are added as they are, names are not
    /// disambiguated.
    fn add_exposed_property(&mut self, property: ExposedProperty);

    /// All provided nodes must already exist.
    fn create_comment_block(
        &mut self,
        title: &str,
        position: Position,
        nodes: &[Self::Node],
    );
}

//! Node editor without any UI.
//!
//! Keeps the same elements a visual editor would: nodes with ports,
//! edges between ports and comment groups.
//! The blackboard of exposed properties is part of the session, there's
//! no global state.

use std::{fmt, iter};

use tracing::{debug, error, warn};

use super::{
    EdgeInput, EdgeView, EditorGraph, ElementView, GroupView, NodeFactory,
    NodeView, ENTRY_NODE_POSITION, ENTRY_NODE_TEXT, ENTRY_NODE_TITLE,
    ENTRY_PORT_LABEL, INPUT_PORT_LABEL,
};
use crate::dialog::{
    unique_property_name, DialogError, ExposedProperty, NodeId, Position,
    DEFAULT_COMMENT_BLOCK_TITLE,
};

/// Refers to a port of some node in a [`HeadlessEditor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(usize);

/// Refers to a comment group in a [`HeadlessEditor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

/// Every element the editor holds is one of these.
#[derive(Debug, Clone)]
pub enum GraphElement {
    #[allow(missing_docs)]
    Node(EditorNode),
    #[allow(missing_docs)]
    Edge(EditorEdge),
    #[allow(missing_docs)]
    CommentGroup(CommentGroup),
}

/// A dialogue node with its ports.
#[derive(Debug, Clone)]
pub struct EditorNode {
    id: NodeId,
    title: String,
    text: Vec<String>,
    position: Position,
    is_entry: bool,
    /// Every node but the entry has exactly one.
    input: Option<Port>,
    /// One per choice.
    outputs: Vec<Port>,
}

/// Connects an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorEdge {
    output: PortId,
    input: PortId,
}

/// Organizes nodes, no meaning at runtime.
#[derive(Debug, Clone)]
pub struct CommentGroup {
    id: GroupId,
    title: String,
    position: Position,
    contained: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Port {
    id: PortId,
    label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

/// An editing session.
///
/// There's always the entry node.
/// It cannot be removed and it is always the first node.
#[derive(Debug, Clone)]
pub struct HeadlessEditor {
    entry: EditorNode,
    elements: Vec<GraphElement>,
    properties: Vec<ExposedProperty>,
    /// Ports and groups share the counter.
    next_handle: usize,
}

impl Default for HeadlessEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEditor {
    /// Session with only the entry node.
    pub fn new() -> Self {
        let entry = EditorNode {
            id: NodeId::random(),
            title: ENTRY_NODE_TITLE.to_owned(),
            text: vec![ENTRY_NODE_TEXT.to_owned()],
            position: ENTRY_NODE_POSITION,
            is_entry: true,
            input: None,
            outputs: vec![Port {
                id: PortId(0),
                label: ENTRY_PORT_LABEL.to_owned(),
            }],
        };

        Self {
            entry,
            elements: Vec::new(),
            properties: Vec::new(),
            next_handle: 1,
        }
    }

    #[allow(missing_docs)]
    pub fn entry_node_id(&self) -> &NodeId {
        &self.entry.id
    }

    /// The single output port of the entry node.
    pub fn entry_port(&self) -> Option<PortId> {
        self.entry.outputs.first().map(|port| port.id)
    }

    #[allow(missing_docs)]
    pub fn node(&self, id: &NodeId) -> Option<&EditorNode> {
        self.all_nodes().find(|node| &node.id == id)
    }

    /// Number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges_iter().count()
    }

    /// New node with a random id and an input port.
    /// Choices are added with [`HeadlessEditor::add_choice_port`].
    pub fn add_node(
        &mut self,
        text: impl IntoIterator<Item = impl Into<String>>,
        position: Position,
    ) -> NodeId {
        let id = NodeId::random();
        let input = Port {
            id: self.next_port(),
            label: INPUT_PORT_LABEL.to_owned(),
        };

        self.elements.push(GraphElement::Node(EditorNode {
            id: id.clone(),
            title: String::new(),
            text: text.into_iter().map(Into::into).collect(),
            position,
            is_entry: false,
            input: Some(input),
            outputs: Vec::new(),
        }));
        debug!("Added node '{id}'");

        id
    }

    #[allow(missing_docs)]
    pub fn add_text_line(
        &mut self,
        node: &NodeId,
        line: impl Into<String>,
    ) -> Result<(), DialogError> {
        self.find_node_mut(node)?.text.push(line.into());
        Ok(())
    }

    /// Removes the first line equal to the provided one.
    /// Returns whether there was such a line.
    pub fn remove_text_line(
        &mut self,
        node: &NodeId,
        line: &str,
    ) -> Result<bool, DialogError> {
        let text = &mut self.find_node_mut(node)?.text;
        let Some(index) = text.iter().position(|l| l == line) else {
            return Ok(false);
        };
        text.remove(index);

        Ok(true)
    }

    #[allow(missing_docs)]
    pub fn set_node_position(
        &mut self,
        node: &NodeId,
        position: Position,
    ) -> Result<(), DialogError> {
        self.find_node_mut(node)?.position = position;
        Ok(())
    }

    /// New output port.
    /// With an empty label the port is named `Option N`, N being the
    /// number of output ports including this one.
    pub fn add_choice_port(
        &mut self,
        node: &NodeId,
        label: &str,
    ) -> Result<PortId, DialogError> {
        let id = self.next_port();
        let node = self.find_node_mut(node)?;
        let label = if label.is_empty() {
            format!("Option {}", node.outputs.len() + 1)
        } else {
            label.to_owned()
        };
        node.outputs.push(Port { id, label });

        Ok(id)
    }

    /// Removes the output port and every edge leaving it.
    pub fn remove_port(
        &mut self,
        node: &NodeId,
        port: PortId,
    ) -> Result<(), DialogError> {
        let outputs = &mut self.find_node_mut(node)?.outputs;
        let index = outputs
            .iter()
            .position(|p| p.id == port)
            .ok_or_else(|| DialogError::NotFound(port.to_string()))?;
        outputs.remove(index);

        self.elements.retain(|element| {
            !matches!(element, GraphElement::Edge(edge) if edge.output == port)
        });

        Ok(())
    }

    #[allow(missing_docs)]
    pub fn input_port(&self, node: &NodeId) -> Option<PortId> {
        self.node(node)?.input.as_ref().map(|port| port.id)
    }

    /// Output ports of the node in order, empty if there's no such node.
    pub fn choice_ports(&self, node: &NodeId) -> Vec<PortId> {
        self.node(node)
            .map(|node| node.outputs.iter().map(|port| port.id).collect())
            .unwrap_or_default()
    }

    /// Edge from an output port to an input port.
    ///
    /// An output port holds a single edge, linking it again replaces the
    /// edge it had.
    /// An input port takes any number of edges.
    pub fn link(
        &mut self,
        output: PortId,
        input: PortId,
    ) -> Result<(), DialogError> {
        match self.port_owner(output) {
            Some((_, Direction::Output, _)) => {}
            _ => return Err(DialogError::NotFound(output.to_string())),
        }
        match self.port_owner(input) {
            Some((_, Direction::Input, _)) => {}
            _ => return Err(DialogError::NotFound(input.to_string())),
        }

        let edges_before = self.edge_count();
        self.elements.retain(|element| match element {
            GraphElement::Edge(edge) => edge.output != output,
            _ => true,
        });
        if edges_before != self.edge_count() {
            debug!("Replacing edge from {output}");
        }

        self.elements
            .push(GraphElement::Edge(EditorEdge { output, input }));
        Ok(())
    }

    /// Ports a drag from the given port could end at: all other ports
    /// except those of the same node.
    pub fn compatible_ports(&self, port: PortId) -> Vec<PortId> {
        let Some((owner, ..)) = self.port_owner(port) else {
            return Vec::new();
        };

        self.all_nodes()
            .filter(|node| node.id != owner.id)
            .flat_map(|node| node.input.iter().chain(&node.outputs))
            .map(|p| p.id)
            .collect()
    }

    /// Empty group.
    /// Without a title it's called "Comment Block".
    pub fn add_comment_block(
        &mut self,
        title: &str,
        position: Position,
    ) -> GroupId {
        let id = GroupId(self.next_handle());
        let title = if title.is_empty() {
            DEFAULT_COMMENT_BLOCK_TITLE
        } else {
            title
        };

        self.elements.push(GraphElement::CommentGroup(CommentGroup {
            id,
            title: title.to_owned(),
            position,
            contained: Vec::new(),
        }));

        id
    }

    /// Adding a node that's already in the group does nothing.
    pub fn add_to_comment_block(
        &mut self,
        group: GroupId,
        node: &NodeId,
    ) -> Result<(), DialogError> {
        if self.node(node).is_none() {
            return Err(DialogError::NotFound(node.to_string()));
        }

        let group = self
            .elements
            .iter_mut()
            .find_map(|element| match element {
                GraphElement::CommentGroup(g) if g.id == group => Some(g),
                _ => None,
            })
            .ok_or_else(|| DialogError::NotFound(group.to_string()))?;
        if !group.contained.contains(node) {
            group.contained.push(node.clone());
        }

        Ok(())
    }

    /// Adds a property to the blackboard, the name is made unique.
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &ExposedProperty {
        let name = unique_property_name(&self.properties, name.into());
        let index = self.properties.len();
        self.properties.push(ExposedProperty::new(name, value));

        &self.properties[index]
    }

    #[allow(missing_docs)]
    pub fn set_property_value(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DialogError> {
        let property = self
            .properties
            .iter_mut()
            .find(|property| property.name == name)
            .ok_or_else(|| DialogError::NotFound(name.to_owned()))?;
        property.value = value.into();

        Ok(())
    }

    /// Removes the node, edges touching it and its group memberships.
    /// The entry node cannot be removed.
    ///
    /// Returns whether anything was removed.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        if &self.entry.id == id {
            warn!("The entry node cannot be removed");
            return false;
        }

        let Some(ports) =
            self.elements.iter().find_map(|element| match element {
                GraphElement::Node(node) if &node.id == id => Some(
                    node.input
                        .iter()
                        .chain(&node.outputs)
                        .map(|port| port.id)
                        .collect::<Vec<_>>(),
                ),
                _ => None,
            })
        else {
            return false;
        };

        self.elements.retain_mut(|element| match element {
            GraphElement::Edge(edge) => {
                !ports.contains(&edge.output) && !ports.contains(&edge.input)
            }
            GraphElement::CommentGroup(group) => {
                group.contained.retain(|contained| contained != id);
                true
            }
            GraphElement::Node(node) => &node.id != id,
        });
        debug!("Removed node '{id}'");

        true
    }

    fn all_nodes(&self) -> impl Iterator<Item = &EditorNode> {
        iter::once(&self.entry).chain(self.elements.iter().filter_map(
            |element| match element {
                GraphElement::Node(node) => Some(node),
                _ => None,
            },
        ))
    }

    fn find_node_mut(
        &mut self,
        id: &NodeId,
    ) -> Result<&mut EditorNode, DialogError> {
        if &self.entry.id == id {
            return Ok(&mut self.entry);
        }

        self.elements
            .iter_mut()
            .find_map(|element| match element {
                GraphElement::Node(node) if &node.id == id => Some(node),
                _ => None,
            })
            .ok_or_else(|| DialogError::NotFound(id.to_string()))
    }

    fn edges_iter(&self) -> impl Iterator<Item = &EditorEdge> {
        self.elements.iter().filter_map(|element| match element {
            GraphElement::Edge(edge) => Some(edge),
            _ => None,
        })
    }

    fn port_owner(
        &self,
        port: PortId,
    ) -> Option<(&EditorNode, Direction, &str)> {
        self.all_nodes().find_map(|node| {
            if let Some(input) = node.input.as_ref().filter(|p| p.id == port) {
                return Some((node, Direction::Input, input.label.as_str()));
            }

            node.outputs
                .iter()
                .find(|p| p.id == port)
                .map(|output| (node, Direction::Output, output.label.as_str()))
        })
    }

    fn view<'a>(
        &'a self,
        element: &'a GraphElement,
    ) -> Option<ElementView<'a>> {
        match element {
            GraphElement::Node(node) => Some(ElementView::Node(node.view())),
            GraphElement::Edge(edge) => {
                let (source, _, label) = self.port_owner(edge.output)?;
                let input =
                    self.port_owner(edge.input).map(|(node, ..)| EdgeInput {
                        node: &node.id,
                        is_entry: node.is_entry,
                    });

                Some(ElementView::Edge(EdgeView {
                    source: &source.id,
                    label,
                    input,
                }))
            }
            GraphElement::CommentGroup(group) => {
                Some(ElementView::CommentGroup(GroupView {
                    title: &group.title,
                    position: group.position,
                    contained: group
                        .contained
                        .iter()
                        .filter(|id| self.node(id).is_some())
                        .collect(),
                }))
            }
        }
    }

    fn next_port(&mut self) -> PortId {
        PortId(self.next_handle())
    }

    fn next_handle(&mut self) -> usize {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl EditorNode {
    #[allow(missing_docs)]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Only the entry node has a title.
    pub fn title(&self) -> &str {
        &self.title
    }

    #[allow(missing_docs)]
    pub fn text(&self) -> &[String] {
        &self.text
    }

    #[allow(missing_docs)]
    pub fn position(&self) -> Position {
        self.position
    }

    #[allow(missing_docs)]
    pub fn is_entry(&self) -> bool {
        self.is_entry
    }

    /// Labels of the output ports in order.
    pub fn choice_labels(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|port| port.label.as_str())
    }

    fn view(&self) -> NodeView<'_> {
        NodeView {
            id: &self.id,
            text: &self.text,
            position: self.position,
            is_entry: self.is_entry,
        }
    }
}

impl EditorGraph for HeadlessEditor {
    fn elements(&self) -> impl Iterator<Item = ElementView<'_>> {
        iter::once(ElementView::Node(self.entry.view())).chain(
            self.elements
                .iter()
                .filter_map(|element| self.view(element)),
        )
    }

    fn exposed_properties(&self) -> &[ExposedProperty] {
        &self.properties
    }
}

impl NodeFactory for HeadlessEditor {
    type Node = NodeId;
    type Port = PortId;

    fn reset_to_entry(&mut self, entry_id: &NodeId) -> NodeId {
        self.elements.clear();
        self.properties.clear();
        self.entry.id = entry_id.clone();
        // ports added for extra links by a previous load
        self.entry.outputs.truncate(1);
        for port in &mut self.entry.outputs {
            port.label = ENTRY_PORT_LABEL.to_owned();
        }

        entry_id.clone()
    }

    fn output_ports(&self, node: &NodeId) -> Vec<PortId> {
        self.choice_ports(node)
    }

    fn create_node(
        &mut self,
        id: NodeId,
        text: Vec<String>,
        position: Position,
    ) -> NodeId {
        self.elements.push(GraphElement::Node(EditorNode {
            id: id.clone(),
            title: String::new(),
            text,
            position,
            is_entry: false,
            input: None,
            outputs: Vec::new(),
        }));

        id
    }

    fn add_input_port(&mut self, node: &NodeId) -> PortId {
        let id = self.next_port();
        match self.find_node_mut(node) {
            Ok(node) => {
                node.input = Some(Port {
                    id,
                    label: INPUT_PORT_LABEL.to_owned(),
                });
            }
            Err(err) => error!("Cannot add input port: {err}"),
        }

        id
    }

    fn add_output_port(&mut self, node: &NodeId, label: &str) -> PortId {
        let id = self.next_port();
        match self.find_node_mut(node) {
            Ok(node) => node.outputs.push(Port {
                id,
                label: label.to_owned(),
            }),
            Err(err) => error!("Cannot add output port: {err}"),
        }

        id
    }

    fn set_port_label(&mut self, port: PortId, label: &str) {
        let entry = iter::once(&mut self.entry);
        let others =
            self.elements.iter_mut().filter_map(|element| match element {
                GraphElement::Node(node) => Some(node),
                _ => None,
            });

        match entry
            .chain(others)
            .flat_map(|node| node.outputs.iter_mut())
            .find(|p| p.id == port)
        {
            Some(p) => p.label = label.to_owned(),
            None => error!("Cannot relabel {port}, no such output port"),
        }
    }

    fn connect(&mut self, output: PortId, input: PortId) {
        if let Err(err) = self.link(output, input) {
            error!("Cannot connect {output} to {input}: {err}");
        }
    }

    fn set_position(&mut self, node: &NodeId, position: Position) {
        if let Err(err) = self.set_node_position(node, position) {
            warn!("Cannot move node: {err}");
        }
    }

    fn add_exposed_property(&mut self, property: ExposedProperty) {
        self.properties.push(property);
    }

    fn create_comment_block(
        &mut self,
        title: &str,
        position: Position,
        nodes: &[NodeId],
    ) {
        let id = GroupId(self.next_handle());
        self.elements.push(GraphElement::CommentGroup(CommentGroup {
            id,
            title: title.to_owned(),
            position,
            contained: nodes.to_vec(),
        }));
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port #{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group #{}", self.0)
    }
}

//! Maps a live editor graph to a [`DialogueGraph`] and back.
//!
//! Links of a node are stored in the same order as the node's output
//! ports.
//! Loading relies on it: the j-th link of a node is wired to its j-th
//! output port.

use tracing::{debug, error, trace};

use crate::{
    dialog::{
        CommentBlockRecord, DialogError, DialogueGraph, DialogueNodeRecord,
        LinkRecord, NodeId,
    },
    editor::{EditorGraph, NodeFactory},
};

/// Flattens the editor graph.
///
/// Fails with [`DialogError::EmptyGraph`] if there are no edges, in which
/// case nothing is produced.
pub fn serialize(
    editor: &impl EditorGraph,
) -> Result<DialogueGraph, DialogError> {
    if editor.edges().next().is_none() {
        return Err(DialogError::EmptyGraph);
    }

    let mut graph = DialogueGraph::new();

    for edge in editor.edges() {
        let Some(input) = edge.input else {
            trace!("Skipping edge from '{}' with no input", edge.source);
            continue;
        };
        if input.is_entry {
            continue;
        }

        graph.push_link(LinkRecord::new(
            edge.source.clone(),
            edge.label,
            input.node.clone(),
        ));
    }

    for node in editor.nodes().filter(|node| !node.is_entry) {
        graph.push_node(DialogueNodeRecord::new(
            node.id.clone(),
            node.text.iter().cloned(),
            node.position,
        ));
    }

    graph.exposed_properties = editor.exposed_properties().to_vec();

    for group in editor.groups() {
        graph.push_comment_block(CommentBlockRecord::new(
            group.title,
            group.position,
            group.contained.into_iter().cloned(),
        ));
    }

    debug!(
        "Serialized {} nodes and {} links",
        graph.nodes().len(),
        graph.links().len()
    );
    Ok(graph)
}

/// A node that has been rebuilt in the editor.
struct Materialized<N, P> {
    id: NodeId,
    node: N,
    /// The entry node doesn't have one.
    input: Option<P>,
    outputs: Vec<P>,
}

/// Rebuilds the graph in the editor.
///
/// 1. Validate, so that a broken graph leaves the editor untouched.
/// 2. Reset the editor to just the entry node.
/// 3. Create the nodes with one output port per outgoing link.
/// 4. Wire the edges and restore positions.
/// 5. Restore properties.
/// 6. Rebuild comment blocks from the materialized nodes.
///
/// When the source of the first link is itself a stored node, it is
/// rebuilt like any other node and the editor's entry node gets a fresh
/// id with no links.
pub fn deserialize<F: NodeFactory>(
    graph: &DialogueGraph,
    editor: &mut F,
) -> Result<(), DialogError> {
    //
    // 1.
    //
    let entry_id = graph.entry_node_id().ok_or(DialogError::EmptyGraph)?;
    graph.validate()?;

    //
    // 2.
    //
    let entry_id = if graph.contains_node(entry_id) {
        debug!("Entry '{entry_id}' is a stored node");
        NodeId::random()
    } else {
        entry_id.clone()
    };
    let entry = editor.reset_to_entry(&entry_id);
    let mut entry = Materialized {
        outputs: editor.output_ports(&entry),
        id: entry_id,
        node: entry,
        input: None,
    };
    let entry_links: Vec<_> = graph.outgoing_links(&entry.id).collect();
    for (port, link) in entry.outputs.iter().zip(&entry_links) {
        editor.set_port_label(*port, &link.label);
    }
    for link in entry_links.iter().skip(entry.outputs.len()) {
        entry
            .outputs
            .push(editor.add_output_port(&entry.node, &link.label));
    }

    //
    // 3.
    //
    let mut materialized = Vec::with_capacity(graph.nodes().len() + 1);
    materialized.push(entry);
    for record in graph.nodes() {
        let node = editor.create_node(
            record.id.clone(),
            record.text.clone(),
            record.position,
        );
        let input = editor.add_input_port(&node);
        let outputs = graph
            .outgoing_links(&record.id)
            .map(|link| editor.add_output_port(&node, &link.label))
            .collect();

        materialized.push(Materialized {
            id: record.id.clone(),
            node,
            input: Some(input),
            outputs,
        });
    }

    //
    // 4.
    //
    // every target is a stored node, validated in step 1
    for source in &materialized {
        for (port, link) in
            source.outputs.iter().zip(graph.outgoing_links(&source.id))
        {
            let Some((target, input)) =
                materialized.iter().find_map(|m| match m.input {
                    Some(input) if m.id == link.target => Some((m, input)),
                    _ => None,
                })
            else {
                error!("No input port for link target '{}'", link.target);
                continue;
            };

            editor.connect(*port, input);
            if let Ok(record) = graph.find_node(&target.id) {
                editor.set_position(&target.node, record.position);
            }
        }
    }

    //
    // 5.
    //
    for property in graph.exposed_properties() {
        editor.add_exposed_property(property.clone());
    }

    //
    // 6.
    //
    for block in graph.comment_blocks() {
        let nodes: Vec<_> = block
            .contained
            .iter()
            .filter_map(|id| materialized.iter().find(|m| &m.id == id))
            .map(|m| m.node.clone())
            .collect();
        editor.create_comment_block(&block.title, block.position, &nodes);
    }

    debug!(
        "Loaded {} nodes and {} links into the editor",
        graph.nodes().len(),
        graph.links().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dialog::{ExposedProperty, Position},
        editor::{EdgeInput, EdgeView, ElementView, HeadlessEditor, NodeView},
    };

    /// START -> A, A -> B "north", A -> C "south", C -> A "again"
    fn authored() -> (HeadlessEditor, [NodeId; 3]) {
        let mut editor = HeadlessEditor::new();
        let a = editor.add_node(["Hello [Name]"], Position::new(10.0, 20.0));
        let b = editor.add_node(["North", "Cold"], Position::new(30.0, 40.0));
        let c = editor.add_node(["South"], Position::new(50.0, 60.0));

        let entry_port = editor.entry_port().unwrap();
        editor.link(entry_port, editor.input_port(&a).unwrap()).unwrap();
        let north = editor.add_choice_port(&a, "north").unwrap();
        editor.link(north, editor.input_port(&b).unwrap()).unwrap();
        let south = editor.add_choice_port(&a, "south").unwrap();
        editor.link(south, editor.input_port(&c).unwrap()).unwrap();
        let again = editor.add_choice_port(&c, "again").unwrap();
        editor.link(again, editor.input_port(&a).unwrap()).unwrap();

        editor.add_property("Name", "Ada");
        editor.add_property("Name", "Grace");
        let group = editor.add_comment_block("Ends", Position::new(5.0, 5.0));
        editor.add_to_comment_block(group, &c).unwrap();
        editor.add_to_comment_block(group, &b).unwrap();

        (editor, [a, b, c])
    }

    #[test]
    fn it_serializes_editor_graph() {
        let (editor, [a, b, c]) = authored();
        let entry = editor.entry_node_id().clone();

        let graph = serialize(&editor).unwrap();

        let links: Vec<_> = graph
            .links()
            .iter()
            .map(|l| (l.source().clone(), l.label(), l.target().clone()))
            .collect();
        assert_eq!(
            vec![
                (entry.clone(), "Next", a.clone()),
                (a.clone(), "north", b.clone()),
                (a.clone(), "south", c.clone()),
                (c.clone(), "again", a.clone()),
            ],
            links
        );

        let nodes: Vec<_> = graph.nodes().iter().map(|n| n.id()).collect();
        assert_eq!(vec![&a, &b, &c], nodes);
        assert!(!graph.contains_node(&entry));
        assert_eq!(&["North", "Cold"], graph.find_node(&b).unwrap().text());

        assert_eq!(
            &[
                ExposedProperty::new("Name", "Ada"),
                ExposedProperty::new("Name(1)", "Grace"),
            ],
            graph.exposed_properties()
        );
        assert_eq!(
            &[CommentBlockRecord::new(
                "Ends",
                Position::new(5.0, 5.0),
                [c.clone(), b.clone()],
            )],
            graph.comment_blocks()
        );
        assert_eq!(Ok(()), graph.validate());
    }

    #[test]
    fn it_refuses_to_serialize_without_edges() {
        let mut editor = HeadlessEditor::new();
        editor.add_node(["alone"], Position::default());

        assert_eq!(Err(DialogError::EmptyGraph), serialize(&editor));
    }

    /// Editor state a visual editor can produce but the headless one
    /// cannot: an edge into the entry node and an edge being dragged.
    struct Snapshot {
        entry: NodeId,
        a: NodeId,
        text: Vec<String>,
    }

    impl EditorGraph for Snapshot {
        fn elements(&self) -> impl Iterator<Item = ElementView<'_>> {
            let node = |id, is_entry| {
                ElementView::Node(NodeView {
                    id,
                    text: &self.text,
                    position: Position::default(),
                    is_entry,
                })
            };
            let edge = |source, label, input| {
                ElementView::Edge(EdgeView {
                    source,
                    label,
                    input,
                })
            };

            [
                node(&self.entry, true),
                node(&self.a, false),
                edge(
                    &self.entry,
                    "Next",
                    Some(EdgeInput {
                        node: &self.a,
                        is_entry: false,
                    }),
                ),
                edge(
                    &self.a,
                    "restart",
                    Some(EdgeInput {
                        node: &self.entry,
                        is_entry: true,
                    }),
                ),
                edge(&self.a, "dragging", None),
            ]
            .into_iter()
        }

        fn exposed_properties(&self) -> &[ExposedProperty] {
            &[]
        }
    }

    #[test]
    fn it_skips_edges_into_entry_and_without_input() {
        let snapshot = Snapshot {
            entry: "START".into(),
            a: "A".into(),
            text: vec!["a".to_owned()],
        };

        let graph = serialize(&snapshot).unwrap();

        assert_eq!(&[LinkRecord::new("START", "Next", "A")], graph.links());
        assert_eq!(1, graph.nodes().len());
        assert_eq!(&NodeId::from("A"), graph.nodes()[0].id());
    }

    #[test]
    fn it_round_trips() {
        let (editor, _) = authored();
        let graph = serialize(&editor).unwrap();

        let mut loaded = HeadlessEditor::new();
        deserialize(&graph, &mut loaded).unwrap();

        assert_eq!(editor.entry_node_id(), loaded.entry_node_id());
        assert_eq!(graph, serialize(&loaded).unwrap());
    }

    #[test]
    fn it_wires_ports_in_link_order() {
        let (editor, [a, b, c]) = authored();
        let graph = serialize(&editor).unwrap();

        let mut loaded = HeadlessEditor::new();
        deserialize(&graph, &mut loaded).unwrap();

        let labels: Vec<_> =
            loaded.node(&a).unwrap().choice_labels().collect();
        assert_eq!(vec!["north", "south"], labels);

        let targets: Vec<_> = loaded
            .edges()
            .filter(|edge| edge.source == &a)
            .map(|edge| (edge.label, edge.input.unwrap().node.clone()))
            .collect();
        assert_eq!(vec![("north", b.clone()), ("south", c.clone())], targets);

        assert_eq!(
            Position::new(30.0, 40.0),
            loaded.node(&b).unwrap().position()
        );
    }

    #[test]
    fn it_replaces_previous_editor_contents() {
        let (editor, _) = authored();
        let graph = serialize(&editor).unwrap();

        let (mut loaded, [stale, ..]) = authored();
        deserialize(&graph, &mut loaded).unwrap();

        assert!(loaded.node(&stale).is_none());
        assert_eq!(4, loaded.edge_count());
        assert_eq!(2, loaded.exposed_properties().len());
        assert_eq!(1, loaded.groups().count());
    }

    #[test]
    fn it_keeps_editor_untouched_on_dangling_reference() {
        let (editor, _) = authored();
        let mut graph = serialize(&editor).unwrap();
        graph.push_link(LinkRecord::new("nowhere", "", "nobody"));

        let (mut loaded, [a, ..]) = authored();
        let before = serialize(&loaded).unwrap();

        assert!(matches!(
            deserialize(&graph, &mut loaded),
            Err(DialogError::DanglingReference { .. })
        ));
        assert!(loaded.node(&a).is_some());
        assert_eq!(before, serialize(&loaded).unwrap());
    }

    #[test]
    fn it_refuses_to_load_graph_without_links() {
        let mut graph = DialogueGraph::new();
        graph.push_node(DialogueNodeRecord::new(
            "A",
            ["a"],
            Position::default(),
        ));

        let mut editor = HeadlessEditor::new();
        assert_eq!(
            Err(DialogError::EmptyGraph),
            deserialize(&graph, &mut editor)
        );
    }

    #[test]
    fn it_adds_ports_when_entry_has_more_links() {
        let mut graph = DialogueGraph::new();
        for id in ["A", "B"] {
            graph.push_node(DialogueNodeRecord::new(
                id,
                [id],
                Position::default(),
            ));
        }
        graph.push_link(LinkRecord::new("S", "Next", "A"));
        graph.push_link(LinkRecord::new("S", "Skip", "B"));

        let mut editor = HeadlessEditor::new();
        deserialize(&graph, &mut editor).unwrap();

        let entry = editor.node(&"S".into()).unwrap();
        assert!(entry.is_entry());
        assert_eq!(
            vec!["Next", "Skip"],
            entry.choice_labels().collect::<Vec<_>>()
        );
        assert_eq!(graph, serialize(&editor).unwrap());
    }

    #[test]
    fn it_loads_graph_whose_entry_is_a_stored_node() {
        let mut graph = DialogueGraph::new();
        for id in ["A", "B"] {
            graph.push_node(DialogueNodeRecord::new(
                id,
                [id],
                Position::default(),
            ));
        }
        graph.push_link(LinkRecord::new("A", "x", "B"));
        graph.push_link(LinkRecord::new("B", "y", "A"));
        assert_eq!(Ok(()), graph.validate());

        let (mut editor, [stale, ..]) = authored();
        deserialize(&graph, &mut editor).unwrap();

        assert!(editor.node(&stale).is_none());
        let a = editor.node(&"A".into()).unwrap();
        assert!(!a.is_entry());
        assert!(editor.input_port(&"A".into()).is_some());
        assert_ne!(&NodeId::from("A"), editor.entry_node_id());
        assert_eq!(graph, serialize(&editor).unwrap());
    }

    #[test]
    fn it_keeps_label_of_entry_link() {
        let mut graph = DialogueGraph::new();
        for id in ["B", "C"] {
            graph.push_node(DialogueNodeRecord::new(
                id,
                [id],
                Position::default(),
            ));
        }
        graph.push_link(LinkRecord::new("A", "x", "B"));
        graph.push_link(LinkRecord::new("B", "y", "C"));

        let mut editor = HeadlessEditor::new();
        deserialize(&graph, &mut editor).unwrap();

        let entry = editor.node(&"A".into()).unwrap();
        assert_eq!(vec!["x"], entry.choice_labels().collect::<Vec<_>>());
        assert_eq!(graph, serialize(&editor).unwrap());

        // loading another graph brings the default label back
        let (other, _) = authored();
        let other = serialize(&other).unwrap();
        deserialize(&other, &mut editor).unwrap();
        assert_eq!(other, serialize(&editor).unwrap());
    }

    #[test]
    fn it_round_trips_relinked_output_port() {
        let mut editor = HeadlessEditor::new();
        let a = editor.add_node(["a"], Position::default());
        let b = editor.add_node(["b"], Position::default());
        let c = editor.add_node(["c"], Position::default());
        editor
            .link(editor.entry_port().unwrap(), editor.input_port(&a).unwrap())
            .unwrap();
        let go = editor.add_choice_port(&a, "go").unwrap();
        editor.link(go, editor.input_port(&b).unwrap()).unwrap();
        editor.link(go, editor.input_port(&c).unwrap()).unwrap();

        let graph = serialize(&editor).unwrap();
        let targets: Vec<_> =
            graph.outgoing_links(&a).map(LinkRecord::target).collect();
        assert_eq!(vec![&c], targets);

        let mut loaded = HeadlessEditor::new();
        deserialize(&graph, &mut loaded).unwrap();
        let labels: Vec<_> =
            loaded.node(&a).unwrap().choice_labels().collect();
        assert_eq!(vec!["go"], labels);
        assert_eq!(graph, serialize(&loaded).unwrap());
    }
}

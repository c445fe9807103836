//! Plays a dialogue graph.
//!
//! The caller renders [`Player::current_text`] and
//! [`Player::current_choices`], then calls [`Player::choose`] with the
//! index the player picked.
//! Once [`Player::is_at_end`] the dialogue is over.

use tracing::{debug, trace};

use super::{DialogError, DialogueGraph, LinkRecord, NodeId};

/// Owns the graph for the duration of the conversation.
#[derive(Debug, Clone)]
pub struct Player {
    graph: DialogueGraph,
    state: PlayerState,
}

/// Where the conversation is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerState {
    /// Showing the given node.
    /// There's no terminal state, a node without outgoing links is
    /// the end of the conversation.
    AtNode(NodeId),
}

impl Player {
    /// Starts at the target of the entry link, which is the first link in
    /// the graph.
    pub fn new(graph: DialogueGraph) -> Result<Self, DialogError> {
        let start = graph
            .entry_link()
            .ok_or(DialogError::EmptyGraph)?
            .target
            .clone();
        debug!("Starting dialogue at node '{start}'");

        Ok(Self {
            graph,
            state: PlayerState::AtNode(start),
        })
    }

    #[allow(missing_docs)]
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    #[allow(missing_docs)]
    pub fn current_node_id(&self) -> &NodeId {
        match &self.state {
            PlayerState::AtNode(id) => id,
        }
    }

    /// Lines of the current node with properties substituted.
    pub fn current_text(&self) -> Result<Vec<String>, DialogError> {
        let node = self.graph.find_node(self.current_node_id())?;

        Ok(node
            .text
            .iter()
            .map(|line| self.graph.substitute_properties(line))
            .collect())
    }

    /// Labels with properties substituted, paired with the index to pass
    /// to [`Player::choose`].
    pub fn current_choices(&self) -> Vec<(String, usize)> {
        self.outgoing()
            .enumerate()
            .map(|(index, link)| {
                (self.graph.substitute_properties(&link.label), index)
            })
            .collect()
    }

    /// No more choices to make.
    pub fn is_at_end(&self) -> bool {
        self.outgoing().next().is_none()
    }

    /// Follows the link at the given index.
    /// On error the state stays unchanged.
    pub fn choose(&mut self, index: usize) -> Result<&NodeId, DialogError> {
        let Some(link) = self.outgoing().nth(index) else {
            return Err(DialogError::InvalidChoice {
                node: self.current_node_id().clone(),
                index,
                available: self.outgoing().count(),
            });
        };
        let target = link.target.clone();
        trace!(
            "Choice {index} '{}' from '{}' to '{target}'",
            link.label,
            link.source
        );

        self.state = PlayerState::AtNode(target);
        Ok(self.current_node_id())
    }

    /// Back to the target of the entry link.
    pub fn restart(&mut self) {
        if let Some(link) = self.graph.entry_link() {
            self.state = PlayerState::AtNode(link.target.clone());
        }
    }

    fn outgoing(&self) -> impl Iterator<Item = &LinkRecord> + '_ {
        self.graph.outgoing_links(self.current_node_id())
    }
}

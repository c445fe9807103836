//! Branching dialogue graphs.
//!
//! A dialogue is authored in a node editor, flattened into a
//! [`DialogueGraph`] by the [`serializer`] and played back with a
//! [`Player`].
//! The editor itself lives outside of this crate, we only talk to it
//! through the [`editor::EditorGraph`] and [`editor::NodeFactory`] traits.
//! [`editor::HeadlessEditor`] implements both without any UI.

#![deny(missing_docs)]

pub mod dialog;
pub mod editor;
pub mod serializer;

pub use dialog::{
    player::{Player, PlayerState},
    CommentBlockRecord, DialogError, DialogueGraph, DialogueNodeRecord,
    ExposedProperty, LinkRecord, NodeId, Position, Referrer,
};

use thiserror::Error;

use super::types::{NodeId, SlotType};

/// Reasons a connection attempt is refused. The graph is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
	#[error("Node '{0}' does not exist")]
	UnknownNode(NodeId),

	#[error("Node '{node}' has no output at index {index}")]
	NoSuchOutput { node: NodeId, index: usize },

	#[error("Node '{node}' has no input named '{input}'")]
	UnknownInput { node: NodeId, input: String },

	#[error("Cannot connect node '{0}' to itself")]
	SameNode(NodeId),

	#[error("Type mismatch: input expects {expected}, but output provides {found}")]
	TypeMismatch { expected: SlotType, found: SlotType },
}

/// Errors raised while loading an editor configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("Failed to parse editor config JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid zoom range: min {min} must be positive and below max {max}")]
	ZoomRange { min: f64, max: f64 },
}

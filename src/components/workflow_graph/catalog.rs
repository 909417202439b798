//! Node-type catalog: per class-type input/output definitions and defaults.
//!
//! The catalog is supplied by the host (fetched from the generation server). The
//! canvas only uses it to build new nodes and to resolve the effective default of
//! an empty literal for display; it never enforces types beyond colour coding.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Node, NodeCategory, Primitive, SlotType};

/// One declared input of a node type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
	pub name: String,
	pub slot_type: SlotType,
	/// Default literal. Inputs without a default start as unconnected slots.
	#[serde(default)]
	pub default: Option<Primitive>,
}

impl InputDefinition {
	pub fn widget(name: impl Into<String>, slot_type: impl Into<SlotType>, default: Primitive) -> Self {
		Self {
			name: name.into(),
			slot_type: slot_type.into(),
			default: Some(default),
		}
	}

	pub fn slot(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
		Self {
			name: name.into(),
			slot_type: slot_type.into(),
			default: None,
		}
	}
}

/// Definition of a node type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
	pub class_type: String,
	#[serde(default)]
	pub display_name: Option<String>,
	#[serde(default)]
	pub category: NodeCategory,
	#[serde(default)]
	pub inputs: Vec<InputDefinition>,
	#[serde(default)]
	pub outputs: Vec<SlotType>,
}

impl NodeDefinition {
	pub fn input(&self, name: &str) -> Option<&InputDefinition> {
		self.inputs.iter().find(|i| i.name == name)
	}
}

/// Read-only lookup of node definitions by class type.
pub trait NodeCatalog {
	fn definition(&self, class_type: &str) -> Option<&NodeDefinition>;
}

impl NodeCatalog for HashMap<String, NodeDefinition> {
	fn definition(&self, class_type: &str) -> Option<&NodeDefinition> {
		self.get(class_type)
	}
}

/// Catalog with no definitions, for hosts that have not fetched one yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyCatalog;

impl NodeCatalog for EmptyCatalog {
	fn definition(&self, _class_type: &str) -> Option<&NodeDefinition> {
		None
	}
}

/// Build a catalog map from a list of definitions.
pub fn catalog_from(definitions: impl IntoIterator<Item = NodeDefinition>) -> HashMap<String, NodeDefinition> {
	definitions
		.into_iter()
		.map(|d| (d.class_type.clone(), d))
		.collect()
}

fn default_for<'a>(catalog: &'a dyn NodeCatalog, node: &Node, input: &str) -> Option<&'a Primitive> {
	catalog
		.definition(&node.class_type)
		.and_then(|d| d.input(input))
		.and_then(|i| i.default.as_ref())
}

/// The value to display for a literal input: its own value, or the catalog
/// default when the literal is an empty string.
pub fn effective_default<'a>(
	catalog: &'a dyn NodeCatalog,
	node: &'a Node,
	input: &str,
) -> Option<&'a Primitive> {
	let value = match &node.input(input)?.value {
		super::types::InputValue::Literal { value } => value,
		_ => return None,
	};
	if value.is_empty_text() {
		default_for(catalog, node, input).or(Some(value))
	} else {
		Some(value)
	}
}

/// Whether a literal differs from the catalog default.
///
/// Values are already normalised to typed primitives, so this is a plain typed
/// comparison. Inputs without a known default are never reported as edited.
pub fn is_edited(catalog: &dyn NodeCatalog, node: &Node, input: &str) -> bool {
	let Some(current) = effective_default(catalog, node, input) else {
		return false;
	};
	match default_for(catalog, node, input) {
		Some(default) => current != default,
		None => false,
	}
}

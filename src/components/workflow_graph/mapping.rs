//! Field mapping: binding abstract template fields (e.g. "prompt") to concrete
//! node inputs of the loaded workflow.
//!
//! A field has zero, one or many candidate nodes and at most one selected
//! candidate. The host's mapping collaborator supplies the initial candidates; the
//! canvas lets the user pick or reassign one per field and relays the result back
//! on confirm.

use serde::{Deserialize, Serialize};

use super::types::{Graph, NodeId, SlotType};

/// A node (and optionally one of its inputs) proposed for a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidate {
	pub node_id: NodeId,
	#[serde(default)]
	pub input_name: Option<String>,
}

/// One template field and its candidates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
	pub key: String,
	#[serde(default)]
	pub label: Option<String>,
	/// Input type the field expects; used to pick the input on a tapped node.
	#[serde(default)]
	pub expected_type: Option<SlotType>,
	#[serde(default)]
	pub candidates: Vec<FieldCandidate>,
	/// Index into `candidates`.
	#[serde(default)]
	pub selected: Option<usize>,
}

impl FieldMapping {
	pub fn new(key: impl Into<String>, expected_type: Option<SlotType>) -> Self {
		Self {
			key: key.into(),
			label: None,
			expected_type,
			candidates: Vec::new(),
			selected: None,
		}
	}

	pub fn selected_candidate(&self) -> Option<&FieldCandidate> {
		self.selected.and_then(|i| self.candidates.get(i))
	}

	pub fn is_candidate(&self, node: &NodeId) -> bool {
		self.candidates.iter().any(|c| &c.node_id == node)
	}
}

/// The user's final choice for one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssignment {
	pub field_key: String,
	pub node_id: NodeId,
	pub input_name: Option<String>,
}

/// All fields of the template being filled, plus which one is being edited.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingState {
	pub fields: Vec<FieldMapping>,
	pub active_field: Option<usize>,
}

impl MappingState {
	pub fn new(fields: Vec<FieldMapping>) -> Self {
		let mut state = Self {
			fields,
			active_field: None,
		};
		for field in &mut state.fields {
			if field.selected.is_some_and(|i| i >= field.candidates.len()) {
				field.selected = None;
			}
		}
		state.active_field = (!state.fields.is_empty()).then_some(0);
		state
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn active(&self) -> Option<&FieldMapping> {
		self.active_field.and_then(|i| self.fields.get(i))
	}

	/// Make `key` the field that node taps assign to.
	pub fn activate(&mut self, key: &str) -> bool {
		match self.fields.iter().position(|f| f.key == key) {
			Some(i) => {
				self.active_field = Some(i);
				true
			}
			None => false,
		}
	}

	/// Assign `node` to the active field. An existing candidate is reselected;
	/// otherwise it is added as a new candidate and selected. Returns the field key
	/// and the chosen candidate, or `None` when no field is active.
	pub fn assign(&mut self, node: &NodeId, graph: &Graph) -> Option<(String, FieldCandidate)> {
		let field = self.active_field.and_then(|i| self.fields.get_mut(i))?;
		let index = match field.candidates.iter().position(|c| &c.node_id == node) {
			Some(i) => i,
			None => {
				let input_name = graph.node(node).and_then(|n| {
					n.inputs
						.iter()
						.find(|i| {
							field
								.expected_type
								.as_ref()
								.is_none_or(|t| t.accepts(&i.value.slot_type()))
						})
						.map(|i| i.name.clone())
				});
				field.candidates.push(FieldCandidate {
					node_id: node.clone(),
					input_name,
				});
				field.candidates.len() - 1
			}
		};
		field.selected = Some(index);
		Some((field.key.clone(), field.candidates[index].clone()))
	}

	/// Whether `node` is the selected candidate of the active field.
	pub fn is_selected(&self, node: &NodeId) -> bool {
		self.active()
			.and_then(FieldMapping::selected_candidate)
			.is_some_and(|c| &c.node_id == node)
	}

	/// Whether `node` is a candidate of any field.
	pub fn is_candidate(&self, node: &NodeId) -> bool {
		self.fields.iter().any(|f| f.is_candidate(node))
	}

	/// Drop candidates that point at a removed node, keeping selections aligned.
	pub fn prune_node(&mut self, node: &NodeId) {
		for field in &mut self.fields {
			let selected_id = field.selected_candidate().map(|c| c.node_id.clone());
			field.candidates.retain(|c| &c.node_id != node);
			field.selected = selected_id
				.filter(|id| id != node)
				.and_then(|id| field.candidates.iter().position(|c| c.node_id == id));
		}
	}

	/// The selected candidate of every field that has one.
	pub fn confirm(&self) -> Vec<FieldAssignment> {
		self.fields
			.iter()
			.filter_map(|f| {
				f.selected_candidate().map(|c| FieldAssignment {
					field_key: f.key.clone(),
					node_id: c.node_id.clone(),
					input_name: c.input_name.clone(),
				})
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::workflow_graph::geometry::Point;
	use crate::components::workflow_graph::types::{InputValue, Node, Primitive};

	fn graph() -> Graph {
		let mut g = Graph::new();
		for id in ["p1", "p2"] {
			g.add_node(
				Node::new(id, "CLIPTextEncode", Point::ZERO)
					.with_input("clip", InputValue::slot("CLIP"))
					.with_input("text", InputValue::literal(Primitive::Text(String::new()))),
			);
		}
		g
	}

	#[test]
	fn at_most_one_selected_candidate() {
		let g = graph();
		let mut m = MappingState::new(vec![FieldMapping::new("prompt", Some(SlotType::new("STRING")))]);
		let (_, c) = m.assign(&"p1".into(), &g).unwrap();
		assert_eq!(c.input_name.as_deref(), Some("text"));
		m.assign(&"p2".into(), &g);
		m.assign(&"p1".into(), &g);
		let field = &m.fields[0];
		assert_eq!(field.candidates.len(), 2);
		assert_eq!(field.selected, Some(0));
		assert_eq!(m.confirm().len(), 1);
	}

	#[test]
	fn pruning_keeps_selection_on_surviving_candidate() {
		let g = graph();
		let mut m = MappingState::new(vec![FieldMapping::new("prompt", None)]);
		m.assign(&"p1".into(), &g);
		m.assign(&"p2".into(), &g);
		m.prune_node(&"p1".into());
		assert_eq!(m.fields[0].selected, Some(0));
		assert_eq!(m.fields[0].candidates[0].node_id, NodeId::from("p2"));
		m.prune_node(&"p2".into());
		assert_eq!(m.fields[0].selected, None);
		assert!(m.confirm().is_empty());
	}

	#[test]
	fn no_active_field_means_no_assignment() {
		let mut m = MappingState::default();
		assert!(m.assign(&"p1".into(), &graph()).is_none());
	}
}

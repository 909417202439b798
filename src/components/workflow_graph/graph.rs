//! Graph mutations.
//!
//! Only the interaction state machine calls these in response to committed user
//! actions; the render model reads the graph and never mutates it.

use log::debug;

use super::catalog::NodeCatalog;
use super::error::ConnectError;
use super::geometry::{Point, Rect};
use super::types::{
	Edge, EdgeId, Graph, Group, GroupId, InputValue, Node, NodeId, NodeInput, NodeOutput, Note,
	NoteId, Primitive, SlotType,
};

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.iter().find(|n| &n.id == id)
	}

	pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| &n.id == id)
	}

	pub fn note(&self, id: &NoteId) -> Option<&Note> {
		self.notes.iter().find(|n| &n.id == id)
	}

	pub fn note_mut(&mut self, id: &NoteId) -> Option<&mut Note> {
		self.notes.iter_mut().find(|n| &n.id == id)
	}

	pub fn group(&self, id: &GroupId) -> Option<&Group> {
		self.groups.iter().find(|g| &g.id == id)
	}

	pub fn group_mut(&mut self, id: &GroupId) -> Option<&mut Group> {
		self.groups.iter_mut().find(|g| &g.id == id)
	}

	pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}

	/// The edge feeding `(target, input)`, if any.
	pub fn edge_into(&self, target: &NodeId, input: &str) -> Option<&Edge> {
		self.edges
			.iter()
			.find(|e| &e.target == target && e.target_input == input)
	}

	/// Adds a node, replacing any existing node with the same id.
	pub fn add_node(&mut self, node: Node) {
		if self.node(&node.id).is_some() {
			self.remove_node(&node.id.clone());
		}
		self.nodes.push(node);
	}

	/// Create a node of `class_type` from its catalog definition. Inputs with a
	/// default become literals, the rest unconnected slots. Returns `false` when the
	/// class type is unknown.
	pub fn add_node_from_definition(
		&mut self,
		catalog: &dyn NodeCatalog,
		id: impl Into<NodeId>,
		class_type: &str,
		position: Point,
	) -> bool {
		let Some(def) = catalog.definition(class_type) else {
			return false;
		};
		let mut node = Node::new(id, class_type, position).with_category(def.category);
		if let Some(name) = &def.display_name {
			node.title = name.clone();
		}
		node.inputs = def
			.inputs
			.iter()
			.map(|i| NodeInput {
				name: i.name.clone(),
				value: match &i.default {
					Some(v) => InputValue::literal(v.clone()),
					None => InputValue::slot(i.slot_type.clone()),
				},
			})
			.collect();
		node.outputs = def.outputs.iter().cloned().map(NodeOutput::new).collect();
		self.add_node(node);
		true
	}

	/// Re-type every literal against the slot type its input declares in the
	/// catalog, so `"20"` on an `INT` input and `8` on a `FLOAT` input land in the
	/// same variant as the catalog default. Returns the number of literals changed.
	pub fn normalize_literals(&mut self, catalog: &dyn NodeCatalog) -> usize {
		let mut changed = 0;
		for node in &mut self.nodes {
			let Some(def) = catalog.definition(&node.class_type) else {
				continue;
			};
			for input in &mut node.inputs {
				let InputValue::Literal { value } = &mut input.value else {
					continue;
				};
				let Some(declared) = def.input(&input.name).map(|i| &i.slot_type) else {
					continue;
				};
				match Primitive::normalize(&value.to_json(), Some(declared)) {
					Some(typed) if typed != *value => {
						*value = typed;
						changed += 1;
					}
					_ => {}
				}
			}
		}
		if changed > 0 {
			debug!("normalised {changed} literal(s) against the catalog");
		}
		changed
	}

	pub fn add_note(&mut self, note: Note) {
		self.notes.retain(|n| n.id != note.id);
		self.notes.push(note);
	}

	pub fn add_group(&mut self, group: Group) {
		self.groups.retain(|g| g.id != group.id);
		self.groups.push(group);
	}

	fn allocate_edge_id(&mut self) -> EdgeId {
		let floor = self.edges.iter().map(|e| e.id.0 + 1).max().unwrap_or(0);
		let id = self.next_edge_id.max(floor);
		self.next_edge_id = id + 1;
		EdgeId(id)
	}

	/// Connect `source[output_index]` to `target.input_name`.
	///
	/// Any existing edge into that input is replaced, so each input has at most one
	/// writer. The input switches to [`InputValue::Connection`] in the same step.
	pub fn connect(
		&mut self,
		source: &NodeId,
		output_index: usize,
		target: &NodeId,
		input_name: &str,
	) -> Result<EdgeId, ConnectError> {
		if source == target {
			return Err(ConnectError::SameNode(source.clone()));
		}
		let source_node = self
			.node(source)
			.ok_or_else(|| ConnectError::UnknownNode(source.clone()))?;
		let output_type = source_node
			.outputs
			.get(output_index)
			.map(|o| o.slot_type.clone())
			.ok_or_else(|| ConnectError::NoSuchOutput {
				node: source.clone(),
				index: output_index,
			})?;
		let target_node = self
			.node(target)
			.ok_or_else(|| ConnectError::UnknownNode(target.clone()))?;
		let input = target_node
			.input(input_name)
			.ok_or_else(|| ConnectError::UnknownInput {
				node: target.clone(),
				input: input_name.to_string(),
			})?;
		let expected = input.value.slot_type();
		if !expected.accepts(&output_type) {
			return Err(ConnectError::TypeMismatch {
				expected,
				found: output_type,
			});
		}

		if let Some(existing) = self.edge_into(target, input_name).map(|e| e.id) {
			self.edges.retain(|e| e.id != existing);
			debug!("replacing edge {existing} into {target}.{input_name}");
		}

		let id = self.allocate_edge_id();
		self.edges.push(Edge {
			id,
			source: source.clone(),
			source_output: output_index,
			target: target.clone(),
			target_input: input_name.to_string(),
			slot_type: Some(output_type),
		});
		if let Some(input) = self.node_mut(target).and_then(|n| n.input_mut(input_name)) {
			input.value = InputValue::Connection {
				edge: id,
				slot_type: expected,
			};
		}
		debug!("edge {id}: {source}[{output_index}] -> {target}.{input_name}");
		Ok(id)
	}

	/// Remove an edge; its target input reverts to an unconnected slot.
	pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
		let pos = self.edges.iter().position(|e| e.id == id)?;
		let edge = self.edges.remove(pos);
		self.detach_input(&edge.target, &edge.target_input, id);
		Some(edge)
	}

	/// Disconnect whatever feeds `(target, input)`.
	pub fn disconnect_input(&mut self, target: &NodeId, input: &str) -> Option<Edge> {
		let id = self.edge_into(target, input)?.id;
		self.remove_edge(id)
	}

	fn detach_input(&mut self, target: &NodeId, input_name: &str, edge: EdgeId) {
		if let Some(input) = self.node_mut(target).and_then(|n| n.input_mut(input_name)) {
			if input.value.edge() == Some(edge) {
				input.value = InputValue::UnconnectedSlot {
					slot_type: input.value.slot_type(),
				};
			}
		}
	}

	/// Delete a node and repair everything that referenced it: edges touching the
	/// node are removed, downstream inputs revert to unconnected slots, and group
	/// membership is dropped.
	pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
		let pos = self.nodes.iter().position(|n| &n.id == id)?;
		let node = self.nodes.remove(pos);

		let dangling: Vec<EdgeId> = self
			.edges
			.iter()
			.filter(|e| &e.source == id || &e.target == id)
			.map(|e| e.id)
			.collect();
		for edge in &dangling {
			self.remove_edge(*edge);
		}
		for group in &mut self.groups {
			group.nodes.retain(|n| n != id);
		}
		debug!("removed node {id} and {} edge(s)", dangling.len());
		Some(node)
	}

	pub fn remove_note(&mut self, id: &NoteId) -> Option<Note> {
		let pos = self.notes.iter().position(|n| &n.id == id)?;
		for group in &mut self.groups {
			group.notes.retain(|n| n != id);
		}
		Some(self.notes.remove(pos))
	}

	pub fn move_node(&mut self, id: &NodeId, position: Point) -> bool {
		match self.node_mut(id) {
			Some(node) if position.is_finite() => {
				node.position = position;
				true
			}
			_ => false,
		}
	}

	pub fn move_note(&mut self, id: &NoteId, position: Point) -> bool {
		match self.note_mut(id) {
			Some(note) if position.is_finite() => {
				note.position = position;
				true
			}
			_ => false,
		}
	}

	pub fn rename_node(&mut self, id: &NodeId, title: impl Into<String>) -> bool {
		self.node_mut(id).map(|n| n.title = title.into()).is_some()
	}

	pub fn rename_group(&mut self, id: &GroupId, title: impl Into<String>) -> bool {
		self.group_mut(id).map(|g| g.title = title.into()).is_some()
	}

	pub fn edit_note(&mut self, id: &NoteId, title: impl Into<String>, content: impl Into<String>) -> bool {
		self.note_mut(id)
			.map(|n| {
				n.title = title.into();
				n.content = content.into();
			})
			.is_some()
	}

	/// Set a literal input value. Connected inputs are disconnected first.
	pub fn set_literal(&mut self, id: &NodeId, input: &str, value: Primitive) -> bool {
		if self.node(id).and_then(|n| n.input(input)).is_none() {
			return false;
		}
		self.disconnect_input(id, input);
		if let Some(slot) = self.node_mut(id).and_then(|n| n.input_mut(input)) {
			slot.value = InputValue::literal(value);
		}
		true
	}

	/// Flip the bypass flag, returning the new value.
	pub fn toggle_bypass(&mut self, id: &NodeId) -> Option<bool> {
		let node = self.node_mut(id)?;
		node.bypass = !node.bypass;
		Some(node.bypass)
	}

	/// Recompute group membership by containment of member centres in persisted
	/// group rectangles. Used once when a document is loaded; afterwards group
	/// bounds follow their members.
	pub fn assign_group_members<'a>(
		&mut self,
		bounds: impl IntoIterator<Item = (&'a GroupId, Rect)>,
		node_rects: &[(NodeId, Rect)],
		note_rects: &[(NoteId, Rect)],
	) {
		for (group_id, rect) in bounds {
			let Some(group) = self.groups.iter_mut().find(|g| &g.id == group_id) else {
				continue;
			};
			group.origin = rect.origin();
			group.nodes = node_rects
				.iter()
				.filter(|(_, r)| rect.contains(r.center()))
				.map(|(id, _)| id.clone())
				.collect();
			group.notes = note_rects
				.iter()
				.filter(|(_, r)| rect.contains(r.center()))
				.map(|(id, _)| id.clone())
				.collect();
		}
	}

	/// True when no two edges target the same input and every connection input
	/// points at an edge that targets it.
	pub fn is_consistent(&self) -> bool {
		let mut seen = std::collections::HashSet::new();
		for e in &self.edges {
			if !seen.insert((&e.target, e.target_input.as_str())) {
				return false;
			}
		}
		self.nodes.iter().all(|n| {
			n.inputs.iter().all(|i| match i.value.edge() {
				Some(edge) => self
					.edge(edge)
					.is_some_and(|e| e.target == n.id && e.target_input == i.name),
				None => self.edge_into(&n.id, &i.name).is_none(),
			})
		})
	}

	/// Slot type carried by an output, if it exists.
	pub fn output_type(&self, node: &NodeId, index: usize) -> Option<&SlotType> {
		self.node(node)?.outputs.get(index).map(|o| &o.slot_type)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pair() -> Graph {
		let mut g = Graph::new();
		g.add_node(Node::new("a", "LoadImage", Point::ZERO).with_output("IMAGE"));
		g.add_node(
			Node::new("b", "Preview", Point::new(300.0, 0.0)).with_input("images", InputValue::slot("IMAGE")),
		);
		g
	}

	#[test]
	fn connect_rejects_type_mismatch() {
		let mut g = pair();
		g.add_node(Node::new("c", "CheckpointLoader", Point::ZERO).with_output("MODEL"));
		let err = g.connect(&"c".into(), 0, &"b".into(), "images").unwrap_err();
		assert!(matches!(err, ConnectError::TypeMismatch { .. }));
		assert!(g.edges.is_empty());
	}

	#[test]
	fn connect_to_self_is_refused() {
		let mut g = pair();
		let err = g.connect(&"a".into(), 0, &"a".into(), "images").unwrap_err();
		assert_eq!(err, ConnectError::SameNode("a".into()));
	}

	#[test]
	fn literal_input_becomes_slot_after_disconnect() {
		let mut g = pair();
		g.add_node(
			Node::new("d", "Scale", Point::ZERO).with_input("factor", InputValue::literal(Primitive::Float(1.0))),
		);
		g.add_node(Node::new("e", "Const", Point::ZERO).with_output("FLOAT"));
		g.connect(&"e".into(), 0, &"d".into(), "factor").unwrap();
		assert!(g.node(&"d".into()).unwrap().input("factor").unwrap().value.is_connected());
		g.disconnect_input(&"d".into(), "factor");
		assert_eq!(
			g.node(&"d".into()).unwrap().input("factor").unwrap().value,
			InputValue::slot("FLOAT")
		);
		assert!(g.is_consistent());
	}

	#[test]
	fn edge_ids_survive_deserialised_graphs() {
		let mut g = pair();
		g.edges.push(Edge {
			id: EdgeId(41),
			source: "x".into(),
			source_output: 0,
			target: "y".into(),
			target_input: "z".into(),
			slot_type: None,
		});
		let id = g.connect(&"a".into(), 0, &"b".into(), "images").unwrap();
		assert_eq!(id, EdgeId(42));
	}
}

//! Layout engine: node dimensions, slot positions, note sizes and group bounds.
//!
//! A [`GraphLayout`] is recomputed from scratch on every pass. Nothing here is
//! cached across a node move, which is what keeps group bounds tight around
//! their current members.

use std::collections::HashMap;

use super::geometry::{Point, Rect};
use super::scale::LayoutMetrics;
use super::text::TextMeasure;
use super::types::{Graph, Group, GroupId, Node, NodeId, Note, NoteId};

/// Icons shown at the right of a node header in edit mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderIcon {
	Rename,
	Bypass,
	Delete,
}

impl HeaderIcon {
	pub const ALL: [HeaderIcon; 3] = [HeaderIcon::Rename, HeaderIcon::Bypass, HeaderIcon::Delete];

	pub fn glyph(self) -> &'static str {
		match self {
			HeaderIcon::Rename => "✎",
			HeaderIcon::Bypass => "⏸",
			HeaderIcon::Delete => "✕",
		}
	}
}

/// One input row.
#[derive(Clone, Debug, PartialEq)]
pub struct InputLayout {
	pub name: String,
	pub row: usize,
	pub row_rect: Rect,
	/// Slot centre on the left edge.
	pub slot: Point,
	/// Literal inputs show a value instead of a slot circle.
	pub is_literal: bool,
}

/// One output row.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputLayout {
	pub index: usize,
	pub row: usize,
	pub row_rect: Rect,
	/// Slot centre on the right edge.
	pub slot: Point,
}

/// Derived geometry of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayout {
	pub id: NodeId,
	pub rect: Rect,
	pub header: Rect,
	pub inputs: Vec<InputLayout>,
	pub outputs: Vec<OutputLayout>,
	pub header_icons: Vec<(HeaderIcon, Rect)>,
	/// Width available to the title text.
	pub title_width: f64,
}

impl NodeLayout {
	pub fn input(&self, name: &str) -> Option<&InputLayout> {
		self.inputs.iter().find(|i| i.name == name)
	}

	pub fn output(&self, index: usize) -> Option<&OutputLayout> {
		self.outputs.get(index)
	}
}

/// Number of content rows: literal rows, plus the shared rows where slot inputs
/// (left) and outputs (right) sit side by side.
pub fn content_rows(node: &Node) -> usize {
	node.literal_count() + node.outputs.len().max(node.slot_input_count())
}

/// Node height from its content.
pub fn node_height(node: &Node, metrics: &LayoutMetrics) -> f64 {
	metrics.header_height
		+ metrics.padding_top
		+ content_rows(node) as f64 * metrics.row_height
		+ metrics.padding_bottom
}

fn icon_strip_width(metrics: &LayoutMetrics) -> f64 {
	HeaderIcon::ALL.len() as f64 * (metrics.icon_size + metrics.icon_spacing)
}

/// Node width from its title and row labels.
pub fn node_width(node: &Node, metrics: &LayoutMetrics, measure: &dyn TextMeasure) -> f64 {
	let title = measure.measure(&node.title, metrics.title_font_size)
		+ metrics.content_padding * 2.0
		+ icon_strip_width(metrics);
	let rows = (0..content_rows(node))
		.map(|row| {
			let left = node
				.inputs
				.get(row)
				.map(|i| measure.measure(&i.name, metrics.body_font_size))
				.unwrap_or(0.0);
			let right = row
				.checked_sub(node.literal_count())
				.and_then(|j| node.outputs.get(j))
				.map(|o| measure.measure(o.label(), metrics.body_font_size))
				.unwrap_or(0.0);
			left + right + metrics.content_padding * 3.0
		})
		.fold(0.0, f64::max);
	metrics.min_node_width.max(title).max(rows)
}

/// Full node layout at `position`.
pub fn layout_node(
	node: &Node,
	position: Point,
	metrics: &LayoutMetrics,
	measure: &dyn TextMeasure,
) -> NodeLayout {
	let width = node_width(node, metrics, measure);
	let height = node_height(node, metrics);
	let rect = Rect::new(position.x, position.y, width, height);
	let header = Rect::new(position.x, position.y, width, metrics.header_height);
	let content_top = position.y + metrics.header_height + metrics.padding_top;
	let row_rect = |row: usize| {
		Rect::new(
			position.x,
			content_top + row as f64 * metrics.row_height,
			width,
			metrics.row_height,
		)
	};

	// Inputs are top-aligned in declaration order; outputs start after the
	// literal rows and share rows with the slot inputs.
	let inputs = node
		.inputs
		.iter()
		.enumerate()
		.map(|(row, input)| {
			let r = row_rect(row);
			InputLayout {
				name: input.name.clone(),
				row,
				row_rect: r,
				slot: Point::new(r.left(), r.center().y),
				is_literal: input.value.is_literal(),
			}
		})
		.collect();
	let first_output_row = node.literal_count();
	let outputs = (0..node.outputs.len())
		.map(|index| {
			let row = first_output_row + index;
			let r = row_rect(row);
			OutputLayout {
				index,
				row,
				row_rect: r,
				slot: Point::new(r.right(), r.center().y),
			}
		})
		.collect();

	let icon_y = header.top() + (header.height - metrics.icon_size) / 2.0;
	let mut icon_x = header.right() - metrics.content_padding / 2.0;
	let mut header_icons = Vec::with_capacity(HeaderIcon::ALL.len());
	for icon in HeaderIcon::ALL.iter().rev() {
		icon_x -= metrics.icon_size;
		header_icons.push((*icon, Rect::new(icon_x, icon_y, metrics.icon_size, metrics.icon_size)));
		icon_x -= metrics.icon_spacing;
	}
	header_icons.reverse();

	NodeLayout {
		id: node.id.clone(),
		rect,
		header,
		inputs,
		outputs,
		header_icons,
		title_width: (width - metrics.content_padding * 2.0 - icon_strip_width(metrics)).max(0.0),
	}
}

/// Derived geometry of a note.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteLayout {
	pub id: NoteId,
	pub rect: Rect,
	pub header: Rect,
	/// Lines shown in the body, already capped.
	pub visible_lines: Vec<String>,
	/// Whether an ellipsis row follows the visible lines.
	pub truncated: bool,
}

pub fn layout_note(note: &Note, metrics: &LayoutMetrics) -> NoteLayout {
	let lines: Vec<&str> = if note.content.is_empty() {
		vec![""]
	} else {
		note.content.lines().collect()
	};
	let max_lines = metrics.note_max_lines.max(1);
	let truncated = lines.len() > max_lines;
	let visible_lines: Vec<String> = lines
		.iter()
		.take(max_lines)
		.map(|l| l.trim_start_matches('#').trim().to_string())
		.collect();
	let body_rows = visible_lines.len() + usize::from(truncated);
	let width = if note.width.is_finite() {
		note.width.max(metrics.min_note_width)
	} else {
		metrics.min_note_width
	};
	let height = metrics.note_header_height + body_rows as f64 * metrics.note_line_height;
	NoteLayout {
		id: note.id.clone(),
		rect: Rect::new(note.position.x, note.position.y, width, height),
		header: Rect::new(note.position.x, note.position.y, width, metrics.note_header_height),
		visible_lines,
		truncated,
	}
}

/// Derived geometry of a group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupLayout {
	pub id: GroupId,
	pub rect: Rect,
	pub header: Rect,
}

/// Group bounds: union of member rects grown by the margin, with the title band
/// reserved above. Empty groups keep a minimum-size box at their origin.
pub fn group_bounds<'a>(
	group: &Group,
	member_rects: impl IntoIterator<Item = &'a Rect>,
	metrics: &LayoutMetrics,
) -> GroupLayout {
	let rect = match Rect::union_all(member_rects) {
		Some(union) => {
			let body = union.expand(metrics.group_margin);
			Rect::new(
				body.x,
				body.y - metrics.group_header_height,
				body.width,
				body.height + metrics.group_header_height,
			)
		}
		None => Rect::new(group.origin.x, group.origin.y, 0.0, 0.0),
	}
	.clamp_min_size(metrics.min_group_width, metrics.min_group_height);
	GroupLayout {
		id: group.id.clone(),
		header: Rect::new(rect.x, rect.y, rect.width, metrics.group_header_height),
		rect,
	}
}

/// Where to place a node this pass (model position or an animated view value).
pub trait PositionSource {
	fn position(&self, node: &Node) -> Point;
}

/// Uses the authoritative model position.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModelPositions;

impl PositionSource for ModelPositions {
	fn position(&self, node: &Node) -> Point {
		node.position
	}
}

/// Layout of the whole graph for one pass.
#[derive(Clone, Debug, Default)]
pub struct GraphLayout {
	/// Node layouts in draw order (graph order).
	pub nodes: Vec<NodeLayout>,
	pub notes: Vec<NoteLayout>,
	pub groups: Vec<GroupLayout>,
	node_index: HashMap<NodeId, usize>,
	note_index: HashMap<NoteId, usize>,
}

impl GraphLayout {
	pub fn compute(
		graph: &Graph,
		metrics: &LayoutMetrics,
		measure: &dyn TextMeasure,
		positions: &dyn PositionSource,
	) -> Self {
		let nodes: Vec<NodeLayout> = graph
			.nodes
			.iter()
			.map(|n| layout_node(n, positions.position(n), metrics, measure))
			.collect();
		let notes: Vec<NoteLayout> = graph.notes.iter().map(|n| layout_note(n, metrics)).collect();
		let node_index: HashMap<NodeId, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, l)| (l.id.clone(), i))
			.collect();
		let note_index: HashMap<NoteId, usize> = notes
			.iter()
			.enumerate()
			.map(|(i, l)| (l.id.clone(), i))
			.collect();

		let groups = graph
			.groups
			.iter()
			.map(|group| {
				let members = group
					.nodes
					.iter()
					.filter_map(|id| node_index.get(id).map(|&i| &nodes[i].rect))
					.chain(
						group
							.notes
							.iter()
							.filter_map(|id| note_index.get(id).map(|&i| &notes[i].rect)),
					);
				group_bounds(group, members, metrics)
			})
			.collect();

		Self {
			nodes,
			notes,
			groups,
			node_index,
			note_index,
		}
	}

	pub fn node(&self, id: &NodeId) -> Option<&NodeLayout> {
		self.node_index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn note(&self, id: &NoteId) -> Option<&NoteLayout> {
		self.note_index.get(id).map(|&i| &self.notes[i])
	}

	pub fn group(&self, id: &GroupId) -> Option<&GroupLayout> {
		self.groups.iter().find(|g| &g.id == id)
	}

	/// Bounds of everything on the canvas.
	pub fn content_bounds(&self) -> Option<Rect> {
		Rect::union_all(
			self.nodes
				.iter()
				.map(|n| &n.rect)
				.chain(self.notes.iter().map(|n| &n.rect))
				.chain(self.groups.iter().map(|g| &g.rect)),
		)
	}

	/// Rects of nodes and notes keyed by id, for load-time group membership.
	pub fn member_rects(&self) -> (Vec<(NodeId, Rect)>, Vec<(NoteId, Rect)>) {
		(
			self.nodes.iter().map(|n| (n.id.clone(), n.rect)).collect(),
			self.notes.iter().map(|n| (n.id.clone(), n.rect)).collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::workflow_graph::text::MonospaceMetric;
	use crate::components::workflow_graph::types::{InputValue, Primitive};

	#[test]
	fn outputs_start_after_literal_rows() {
		let metrics = LayoutMetrics::default();
		let node = Node::new("k", "KSampler", Point::ZERO)
			.with_input("model", InputValue::slot("MODEL"))
			.with_input("seed", InputValue::literal(Primitive::Int(1)))
			.with_input("steps", InputValue::literal(Primitive::Int(20)))
			.with_output("LATENT");
		let layout = layout_node(&node, Point::ZERO, &metrics, &MonospaceMetric::default());
		assert_eq!(layout.outputs[0].row, 2);
		assert_eq!(layout.input("model").unwrap().row, 0);
		// 2 literals + max(1 output, 1 slot input)
		let expected = 30.0 + 8.0 + 3.0 * 24.0 + 8.0;
		assert_eq!(layout.rect.height, expected);
		assert_eq!(layout.outputs[0].slot.x, layout.rect.right());
		assert_eq!(layout.input("model").unwrap().slot.x, 0.0);
	}

	#[test]
	fn header_icons_fit_inside_header() {
		let metrics = LayoutMetrics::default();
		let node = Node::new("n", "Node", Point::new(10.0, 20.0));
		let layout = layout_node(&node, node.position, &metrics, &MonospaceMetric::default());
		assert_eq!(layout.header_icons.len(), 3);
		for (_, r) in &layout.header_icons {
			assert!(layout.header.contains_rect(r));
		}
		assert_eq!(layout.header_icons[2].0, HeaderIcon::Delete);
	}

	#[test]
	fn long_note_gets_ellipsis_row() {
		let metrics = LayoutMetrics::default();
		let content = (0..20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
		let note = Note::new("n", Point::ZERO, 200.0).with_content(content);
		let layout = layout_note(&note, &metrics);
		assert!(layout.truncated);
		assert_eq!(layout.visible_lines.len(), 8);
		assert_eq!(layout.rect.height, 28.0 + 9.0 * 18.0);

		let empty = layout_note(&Note::new("e", Point::ZERO, 10.0), &metrics);
		assert!(!empty.truncated);
		assert_eq!(empty.rect.width, 120.0);
		assert_eq!(empty.rect.height, 28.0 + 18.0);
	}
}

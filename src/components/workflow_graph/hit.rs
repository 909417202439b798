//! Hit testing in graph space.
//!
//! Slot hit radii are deliberately larger than the drawn circles and overlap the
//! node bodies, so the order in which target kinds are checked decides what a tap
//! means. The order depends on the interaction mode.

use super::geometry::{Point, point_in_circle};
use super::layout::{GraphLayout, HeaderIcon};
use super::routing::{EdgeRoute, route_edge};
use super::scale::RoutingConfig;
use super::types::{EdgeId, Graph, GroupId, NodeId, NoteId};

/// What lies under a tap.
#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
	InputSlot { node: NodeId, input: String },
	OutputSlot { node: NodeId, index: usize },
	HeaderIcon { node: NodeId, icon: HeaderIcon },
	NodeHeader(NodeId),
	NodeBody(NodeId),
	Note(NoteId),
	GroupHeader(GroupId),
	Empty,
}

/// Which target kinds are considered, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitPolicy {
	/// Output slots, then bodies.
	Normal,
	/// Bodies only; taps assign mapping candidates.
	FieldMapping,
	/// Input slots first, then output slots, then bodies.
	Connection,
	/// Output slots and header icons before bodies.
	EditSelect,
}

fn nearest_input_slot(layout: &GraphLayout, p: Point, radius: f64) -> Option<HitTarget> {
	layout
		.nodes
		.iter()
		.flat_map(|n| {
			n.inputs
				.iter()
				.filter(|i| !i.is_literal)
				.map(move |i| (n, i))
		})
		.filter(|(_, i)| point_in_circle(p, i.slot, radius))
		.min_by(|(_, a), (_, b)| {
			p.distance_squared(a.slot)
				.total_cmp(&p.distance_squared(b.slot))
		})
		.map(|(n, i)| HitTarget::InputSlot {
			node: n.id.clone(),
			input: i.name.clone(),
		})
}

fn nearest_output_slot(layout: &GraphLayout, p: Point, radius: f64) -> Option<HitTarget> {
	layout
		.nodes
		.iter()
		.flat_map(|n| n.outputs.iter().map(move |o| (n, o)))
		.filter(|(_, o)| point_in_circle(p, o.slot, radius))
		.min_by(|(_, a), (_, b)| {
			p.distance_squared(a.slot)
				.total_cmp(&p.distance_squared(b.slot))
		})
		.map(|(n, o)| HitTarget::OutputSlot {
			node: n.id.clone(),
			index: o.index,
		})
}

fn header_icon(layout: &GraphLayout, p: Point) -> Option<HitTarget> {
	layout.nodes.iter().rev().find_map(|n| {
		n.header_icons
			.iter()
			.find(|(_, r)| r.contains(p))
			.map(|(icon, _)| HitTarget::HeaderIcon {
				node: n.id.clone(),
				icon: *icon,
			})
	})
}

/// Bodies, topmost first: notes are drawn over nodes, nodes over groups.
fn body(layout: &GraphLayout, p: Point) -> HitTarget {
	if let Some(note) = layout.notes.iter().rev().find(|n| n.rect.contains(p)) {
		return HitTarget::Note(note.id.clone());
	}
	if let Some(node) = layout.nodes.iter().rev().find(|n| n.rect.contains(p)) {
		return if node.header.contains(p) {
			HitTarget::NodeHeader(node.id.clone())
		} else {
			HitTarget::NodeBody(node.id.clone())
		};
	}
	if let Some(group) = layout.groups.iter().rev().find(|g| g.header.contains(p)) {
		return HitTarget::GroupHeader(group.id.clone());
	}
	HitTarget::Empty
}

/// Resolve the target under graph-space point `p`.
pub fn hit_test(layout: &GraphLayout, p: Point, policy: HitPolicy, slot_hit_radius: f64) -> HitTarget {
	let found = match policy {
		HitPolicy::Connection => nearest_input_slot(layout, p, slot_hit_radius)
			.or_else(|| nearest_output_slot(layout, p, slot_hit_radius)),
		HitPolicy::EditSelect => {
			nearest_output_slot(layout, p, slot_hit_radius).or_else(|| header_icon(layout, p))
		}
		HitPolicy::Normal => nearest_output_slot(layout, p, slot_hit_radius),
		HitPolicy::FieldMapping => None,
	};
	found.unwrap_or_else(|| body(layout, p))
}

/// Route of every drawable edge. Edges whose endpoints are gone are skipped.
pub fn edge_routes(graph: &Graph, layout: &GraphLayout, config: &RoutingConfig) -> Vec<(EdgeId, EdgeRoute)> {
	graph
		.edges
		.iter()
		.filter_map(|edge| {
			let source = layout.node(&edge.source)?;
			let target = layout.node(&edge.target)?;
			let start = source.output(edge.source_output)?.slot;
			let end = target.input(&edge.target_input)?.slot;
			Some((edge.id, route_edge(start, end, &source.rect, &target.rect, config)))
		})
		.collect()
}

/// The wire closest to `p`, within `tolerance` graph units.
pub fn hit_edge(
	graph: &Graph,
	layout: &GraphLayout,
	p: Point,
	tolerance: f64,
	config: &RoutingConfig,
) -> Option<EdgeId> {
	edge_routes(graph, layout, config)
		.into_iter()
		.map(|(id, route)| (id, route.distance_to(p)))
		.filter(|(_, d)| *d <= tolerance)
		.min_by(|a, b| a.1.total_cmp(&b.1))
		.map(|(id, _)| id)
}

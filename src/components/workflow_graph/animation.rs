//! View-layer transitions for node positions and the viewport.
//!
//! Animated values are a display cache only. The graph model always holds the
//! authoritative position; nothing here is ever written back into it, so dragging
//! during an in-flight animation cannot desync.
//!
//! Every interpolation is an explicit record advanced by a clock value in seconds,
//! so the same code runs from a `requestAnimationFrame` callback or a test clock.

use std::collections::HashMap;

use super::geometry::{Point, ViewTransform};
use super::layout::PositionSource;
use super::types::{Graph, Node, NodeId};

/// Ease-in-ease-out curve.
pub fn smooth_step(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0);
	t * t * (3.0 - 2.0 * t)
}

/// Progress of an interpolation started at `start`, eased.
fn eased_progress(start: f64, duration: f64, now: f64) -> f64 {
	if duration <= 0.0 || !duration.is_finite() {
		return 1.0;
	}
	smooth_step((now - start) / duration)
}

/// One node's position transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolation {
	pub from: Point,
	pub to: Point,
	pub start: f64,
	pub duration: f64,
}

impl Interpolation {
	pub fn snapped(at: Point, now: f64) -> Self {
		Self {
			from: at,
			to: at,
			start: now,
			duration: 0.0,
		}
	}

	pub fn value_at(&self, now: f64) -> Point {
		self.from.lerp(self.to, eased_progress(self.start, self.duration, now))
	}

	pub fn is_finished(&self, now: f64) -> bool {
		self.duration <= 0.0 || now >= self.start + self.duration
	}
}

/// Per-node position animation, keyed by node id.
#[derive(Clone, Debug)]
pub struct PositionAnimator {
	entries: HashMap<NodeId, Interpolation>,
	duration: f64,
	now: f64,
}

impl PositionAnimator {
	pub fn new(duration: f64) -> Self {
		Self {
			entries: HashMap::new(),
			duration,
			now: 0.0,
		}
	}

	/// Reconcile with the model. Unknown nodes snap into place, moved nodes start
	/// a transition from wherever they are displayed now, and nodes that no longer
	/// exist are dropped.
	pub fn sync(&mut self, graph: &Graph, now: f64) {
		self.now = now;
		self.entries
			.retain(|id, _| graph.nodes.iter().any(|n| &n.id == id));
		for node in &graph.nodes {
			let target = node.position;
			match self.entries.get_mut(&node.id) {
				None => {
					self.entries
						.insert(node.id.clone(), Interpolation::snapped(target, now));
				}
				Some(entry) if entry.to != target => {
					*entry = Interpolation {
						from: entry.value_at(now),
						to: target,
						start: now,
						duration: self.duration,
					};
				}
				Some(_) => {}
			}
		}
	}

	/// Snap every node to its model position (used on full graph reload).
	pub fn snap_all(&mut self, graph: &Graph, now: f64) {
		self.entries.clear();
		self.sync(graph, now);
	}

	/// Show `id` at `at` immediately. Direct manipulation (dragging) uses this so the
	/// node tracks the finger instead of easing behind it.
	pub fn snap_node(&mut self, id: &NodeId, at: Point) {
		self.entries
			.insert(id.clone(), Interpolation::snapped(at, self.now));
	}

	/// Displayed position of a node, if tracked.
	pub fn position_of(&self, id: &NodeId) -> Option<Point> {
		self.entries.get(id).map(|e| e.value_at(self.now))
	}

	pub fn is_animating(&self) -> bool {
		self.entries.values().any(|e| !e.is_finished(self.now))
	}
}

impl PositionSource for PositionAnimator {
	fn position(&self, node: &Node) -> Point {
		self.position_of(&node.id).unwrap_or(node.position)
	}
}

/// What caused a viewport change. Live gestures snap; explicit controls animate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportChange {
	Gesture,
	Control,
}

/// Smooths zoom/pan changes made through explicit controls.
#[derive(Clone, Debug)]
pub struct ViewportAnimator {
	from: ViewTransform,
	to: ViewTransform,
	start: f64,
	duration: f64,
}

impl ViewportAnimator {
	pub fn new(initial: ViewTransform, duration: f64) -> Self {
		Self {
			from: initial,
			to: initial,
			start: 0.0,
			duration,
		}
	}

	/// Move towards `target`. The source of the change decides whether it snaps.
	pub fn apply(&mut self, target: ViewTransform, change: ViewportChange, now: f64) {
		match change {
			ViewportChange::Gesture => {
				self.from = target;
				self.to = target;
				self.start = now;
			}
			ViewportChange::Control => {
				self.from = self.current(now);
				self.to = target;
				self.start = now;
			}
		}
	}

	/// Displayed transform at `now`.
	pub fn current(&self, now: f64) -> ViewTransform {
		if self.from == self.to {
			return self.to;
		}
		self.from
			.lerp(&self.to, eased_progress(self.start, self.duration, now))
	}

	pub fn is_animating(&self, now: f64) -> bool {
		self.from != self.to && now < self.start + self.duration
	}
}

//! Edge routing.
//!
//! Wires leave an output to the right and enter an input from the left. When the
//! source sits left of the target a single S-shaped cubic is enough. Backward
//! wires need more care, or they cut straight through unrelated node bodies:
//!
//! - nearly level (`|Δy|` below the loop threshold): loop out to the right of
//!   both nodes, with both control points on a shared far-right x;
//! - otherwise: two cubic segments chained through the midpoint.

use super::geometry::{CubicBezier, Point, Rect};
use super::scale::RoutingConfig;

/// The path a wire takes.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgeRoute {
	/// Source left of target.
	Forward(CubicBezier),
	/// Backward and nearly level.
	LoopRight(CubicBezier),
	/// Backward with a large vertical gap.
	SCurve(CubicBezier, CubicBezier),
}

impl EdgeRoute {
	pub fn segments(&self) -> Vec<CubicBezier> {
		match self {
			EdgeRoute::Forward(c) | EdgeRoute::LoopRight(c) => vec![*c],
			EdgeRoute::SCurve(a, b) => vec![*a, *b],
		}
	}

	pub fn start(&self) -> Point {
		match self {
			EdgeRoute::Forward(c) | EdgeRoute::LoopRight(c) | EdgeRoute::SCurve(c, _) => c.p0,
		}
	}

	pub fn end(&self) -> Point {
		match self {
			EdgeRoute::Forward(c) | EdgeRoute::LoopRight(c) | EdgeRoute::SCurve(_, c) => c.p1,
		}
	}

	pub fn arc_length(&self) -> f64 {
		self.segments().iter().map(CubicBezier::arc_length).sum()
	}

	pub fn distance_to(&self, p: Point) -> f64 {
		self.segments()
			.iter()
			.map(|c| c.distance_to(p))
			.fold(f64::INFINITY, f64::min)
	}

	/// Point halfway along the path (by parameter, per segment).
	pub fn midpoint(&self) -> Point {
		match self {
			EdgeRoute::Forward(c) | EdgeRoute::LoopRight(c) => c.point_at(0.5),
			EdgeRoute::SCurve(a, _) => a.p1,
		}
	}
}

/// Route a wire from an output slot at `start` to an input slot at `end`.
///
/// `source` and `target` are the node rects, used to place the loop clear of
/// both bodies.
pub fn route_edge(
	start: Point,
	end: Point,
	source: &Rect,
	target: &Rect,
	config: &RoutingConfig,
) -> EdgeRoute {
	let dx = end.x - start.x;
	let dy = end.y - start.y;

	if start.x < end.x {
		let offset = (config.forward_factor * dx).max(config.min_control_offset);
		return EdgeRoute::Forward(CubicBezier::new(
			start,
			Point::new(start.x + offset, start.y),
			Point::new(end.x - offset, end.y),
			end,
		));
	}

	if dy.abs() < config.loop_threshold {
		let far_x = start.x.max(source.right()).max(target.right()) + config.loop_extent;
		return EdgeRoute::LoopRight(CubicBezier::new(
			start,
			Point::new(far_x, start.y),
			Point::new(far_x, end.y),
			end,
		));
	}

	let offset = config.min_control_offset.max(config.forward_factor * dx.abs());
	let mid = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
	EdgeRoute::SCurve(
		CubicBezier::new(
			start,
			Point::new(start.x + offset, start.y),
			Point::new(start.x + offset, mid.y),
			mid,
		),
		CubicBezier::new(
			mid,
			Point::new(end.x - offset, mid.y),
			Point::new(end.x - offset, end.y),
			end,
		),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rect_at(x: f64, y: f64) -> Rect {
		Rect::new(x, y, 200.0, 100.0)
	}

	#[test]
	fn forward_offset_has_a_floor() {
		let config = RoutingConfig::default();
		let route = route_edge(
			Point::new(0.0, 0.0),
			Point::new(20.0, 0.0),
			&rect_at(-200.0, 0.0),
			&rect_at(20.0, 0.0),
			&config,
		);
		let EdgeRoute::Forward(c) = route else {
			panic!("expected forward route");
		};
		assert_eq!(c.c1.x, 50.0);
		assert_eq!(c.c2.x, -30.0);

		let route = route_edge(
			Point::new(0.0, 0.0),
			Point::new(500.0, 80.0),
			&rect_at(-200.0, 0.0),
			&rect_at(500.0, 80.0),
			&config,
		);
		let EdgeRoute::Forward(c) = route else {
			panic!("expected forward route");
		};
		assert_eq!(c.c1, Point::new(200.0, 0.0));
	}

	#[test]
	fn large_vertical_gap_uses_tangent_continuous_s_curve() {
		let config = RoutingConfig::default();
		let route = route_edge(
			Point::new(700.0, 50.0),
			Point::new(100.0, 450.0),
			&rect_at(500.0, 0.0),
			&rect_at(100.0, 400.0),
			&config,
		);
		let EdgeRoute::SCurve(a, b) = &route else {
			panic!("expected s-curve");
		};
		assert_eq!(a.p1, b.p0);
		// Both tangents at the joint are horizontal.
		assert_eq!(a.c2.y, a.p1.y);
		assert_eq!(b.c1.y, b.p0.y);
		assert_eq!(route.end(), Point::new(100.0, 450.0));
	}
}

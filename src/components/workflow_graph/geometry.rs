//! Geometry kernel: points, rectangles, the pan/zoom transform and cubic Bézier math.
//!
//! # Coordinate Spaces
//!
//! - **Graph-space**: where node positions live. Independent of pan/zoom.
//! - **Screen-space**: canvas pixels. `screen = graph * scale + offset`.
//!
//! Rendering applies `translate(offset); scale(scale)` and hit-testing applies the
//! inverse, so [`ViewTransform::screen_to_graph`] and [`ViewTransform::graph_to_screen`]
//! must stay exact inverses of each other.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point (or displacement) in either coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance_squared(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		dx * dx + dy * dy
	}

	pub fn distance(self, other: Point) -> f64 {
		self.distance_squared(other).sqrt()
	}

	pub fn lerp(self, other: Point, t: f64) -> Point {
		Point::new(
			self.x + (other.x - self.x) * t,
			self.y + (other.y - self.y) * t,
		)
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

/// Axis-aligned rectangle. Nodes and notes are never rotated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn from_corners(min: Point, max: Point) -> Self {
		Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
	}

	pub fn left(&self) -> f64 {
		self.x
	}

	pub fn top(&self) -> f64 {
		self.y
	}

	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	pub fn origin(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	/// Inclusive bounds check.
	pub fn contains(&self, p: Point) -> bool {
		point_in_rect(p, self)
	}

	/// True when `other` lies entirely inside `self`.
	pub fn contains_rect(&self, other: &Rect) -> bool {
		other.left() >= self.left()
			&& other.top() >= self.top()
			&& other.right() <= self.right()
			&& other.bottom() <= self.bottom()
	}

	pub fn union(&self, other: &Rect) -> Rect {
		Rect::from_corners(
			Point::new(self.left().min(other.left()), self.top().min(other.top())),
			Point::new(
				self.right().max(other.right()),
				self.bottom().max(other.bottom()),
			),
		)
	}

	/// Grow by `margin` on every side.
	pub fn expand(&self, margin: f64) -> Rect {
		Rect::new(
			self.x - margin,
			self.y - margin,
			self.width + margin * 2.0,
			self.height + margin * 2.0,
		)
	}

	/// Keep the origin, but never report a size smaller than the minimum.
	/// Non-finite sizes collapse to the minimum as well.
	pub fn clamp_min_size(&self, min_width: f64, min_height: f64) -> Rect {
		let width = if self.width.is_finite() {
			self.width.max(min_width)
		} else {
			min_width
		};
		let height = if self.height.is_finite() {
			self.height.max(min_height)
		} else {
			min_height
		};
		Rect::new(self.x, self.y, width, height)
	}

	pub fn translate(&self, delta: Point) -> Rect {
		Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
	}

	/// Union of many rectangles, `None` when the iterator is empty.
	pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
		rects
			.into_iter()
			.fold(None, |acc: Option<Rect>, r| match acc {
				Some(acc) => Some(acc.union(r)),
				None => Some(*r),
			})
	}
}

/// Pan and zoom transform applied to the whole canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
	/// Screen-space translation.
	pub offset: Point,
	/// Zoom factor (1.0 = 100%).
	pub scale: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			offset: Point::ZERO,
			scale: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn new(offset: Point, scale: f64) -> Self {
		Self { offset, scale }
	}

	/// `graph = (screen - offset) / scale`
	pub fn screen_to_graph(&self, screen: Point) -> Point {
		screen_to_graph(screen, self.scale, self.offset)
	}

	/// `screen = graph * scale + offset`
	pub fn graph_to_screen(&self, graph: Point) -> Point {
		graph_to_screen(graph, self.scale, self.offset)
	}

	/// Zoom by `factor` keeping the graph point under `centroid` fixed on screen.
	///
	/// The new scale is clamped to `[min_scale, max_scale]`; the anchor is computed
	/// from the clamped ratio so it holds exactly at the limits too.
	pub fn zoom_about(&mut self, centroid: Point, factor: f64, min_scale: f64, max_scale: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			return;
		}
		let new_scale = (self.scale * factor).clamp(min_scale, max_scale);
		let ratio = new_scale / self.scale;
		self.offset = Point::new(
			centroid.x - (centroid.x - self.offset.x) * ratio,
			centroid.y - (centroid.y - self.offset.y) * ratio,
		);
		self.scale = new_scale;
	}

	pub fn pan_by(&mut self, delta: Point) {
		if delta.is_finite() {
			self.offset = self.offset + delta;
		}
	}

	/// Transform that centers `content` inside a `viewport` of the given size.
	pub fn fit_rect(
		content: &Rect,
		viewport_width: f64,
		viewport_height: f64,
		padding: f64,
		min_scale: f64,
		max_scale: f64,
	) -> ViewTransform {
		let content = content.clamp_min_size(1.0, 1.0);
		let avail_w = (viewport_width - padding * 2.0).max(1.0);
		let avail_h = (viewport_height - padding * 2.0).max(1.0);
		let scale = (avail_w / content.width)
			.min(avail_h / content.height)
			.clamp(min_scale, max_scale);
		let center = content.center();
		ViewTransform {
			offset: Point::new(
				viewport_width / 2.0 - center.x * scale,
				viewport_height / 2.0 - center.y * scale,
			),
			scale,
		}
	}

	/// Linear interpolation of offset and scale.
	pub fn lerp(&self, other: &ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			offset: self.offset.lerp(other.offset, t),
			scale: self.scale + (other.scale - self.scale) * t,
		}
	}
}

pub fn screen_to_graph(screen: Point, scale: f64, offset: Point) -> Point {
	Point::new((screen.x - offset.x) / scale, (screen.y - offset.y) / scale)
}

pub fn graph_to_screen(graph: Point, scale: f64, offset: Point) -> Point {
	Point::new(graph.x * scale + offset.x, graph.y * scale + offset.y)
}

/// Squared-distance comparison, no square root.
pub fn point_in_circle(p: Point, center: Point, radius: f64) -> bool {
	p.distance_squared(center) <= radius * radius
}

pub fn point_in_rect(p: Point, rect: &Rect) -> bool {
	p.x >= rect.left() && p.x <= rect.right() && p.y >= rect.top() && p.y <= rect.bottom()
}

/// Minimum number of polyline samples used for arc-length estimates.
pub const ARC_LENGTH_SAMPLES: usize = 32;

/// A cubic Bézier segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
	pub p0: Point,
	pub c1: Point,
	pub c2: Point,
	pub p1: Point,
}

impl CubicBezier {
	pub const fn new(p0: Point, c1: Point, c2: Point, p1: Point) -> Self {
		Self { p0, c1, c2, p1 }
	}

	/// Evaluate at `t` (clamped to `[0, 1]`) using the Bernstein polynomial form.
	pub fn point_at(&self, t: f64) -> Point {
		let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
		let u = 1.0 - t;
		let a = u * u * u;
		let b = 3.0 * u * u * t;
		let c = 3.0 * u * t * t;
		let d = t * t * t;
		Point::new(
			a * self.p0.x + b * self.c1.x + c * self.c2.x + d * self.p1.x,
			a * self.p0.y + b * self.c1.y + c * self.c2.y + d * self.p1.y,
		)
	}

	/// `steps + 1` evenly spaced (in `t`) points including both endpoints.
	pub fn sample(&self, steps: usize) -> Vec<Point> {
		let steps = steps.max(1);
		(0..=steps)
			.map(|i| self.point_at(i as f64 / steps as f64))
			.collect()
	}

	/// Approximate arc length by polyline summation. Zero-length curves return 0.
	pub fn arc_length(&self) -> f64 {
		self.sample(ARC_LENGTH_SAMPLES)
			.windows(2)
			.map(|w| w[0].distance(w[1]))
			.sum()
	}

	/// Approximate distance from `p` to the curve.
	pub fn distance_to(&self, p: Point) -> f64 {
		self.sample(ARC_LENGTH_SAMPLES)
			.windows(2)
			.map(|w| point_segment_distance_squared(w[0], w[1], p))
			.fold(f64::INFINITY, f64::min)
			.sqrt()
	}
}

fn point_segment_distance_squared(a: Point, b: Point, p: Point) -> f64 {
	let ab = b - a;
	let ap = p - a;
	let len2 = ab.x * ab.x + ab.y * ab.y;
	if len2 <= 1e-12 {
		return ap.x * ap.x + ap.y * ap.y;
	}
	let t = ((ap.x * ab.x + ap.y * ab.y) / len2).clamp(0.0, 1.0);
	p.distance_squared(a + ab * t)
}

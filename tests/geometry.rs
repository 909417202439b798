//! Coordinate transform and zoom behaviour.
mod common;
use common::*;

use workflow_canvas::geometry::{CubicBezier, graph_to_screen, screen_to_graph};
use workflow_canvas::{Point, Rect, ViewTransform};

const SCALES: [f64; 5] = [0.2, 0.5, 1.0, 2.5, 3.0];
const OFFSETS: [Point; 3] = [
	Point::new(0.0, 0.0),
	Point::new(-250.0, 130.0),
	Point::new(1024.5, -77.25),
];
const POINTS: [Point; 4] = [
	Point::new(0.0, 0.0),
	Point::new(10.0, -20.0),
	Point::new(-333.3, 812.7),
	Point::new(4096.0, 4096.0),
];

#[test]
fn screen_and_graph_space_are_inverse() {
	for scale in SCALES {
		for offset in OFFSETS {
			let t = ViewTransform::new(offset, scale);
			for p in POINTS {
				assert!(approx_point(t.graph_to_screen(t.screen_to_graph(p)), p));
				assert!(approx_point(t.screen_to_graph(t.graph_to_screen(p)), p));
				assert!(approx_point(screen_to_graph(p, scale, offset), t.screen_to_graph(p)));
				assert!(approx_point(graph_to_screen(p, scale, offset), t.graph_to_screen(p)));
			}
		}
	}
}

#[test]
fn zoom_keeps_graph_point_under_centroid() {
	for scale in SCALES {
		for offset in OFFSETS {
			for factor in [0.5, 0.9, 1.1, 2.0, 50.0, 0.01] {
				let centroid = Point::new(320.0, 240.0);
				let mut t = ViewTransform::new(offset, scale);
				let anchored = t.screen_to_graph(centroid);
				t.zoom_about(centroid, factor, 0.2, 3.0);
				assert!(t.scale >= 0.2 && t.scale <= 3.0);
				assert!(approx_point(t.screen_to_graph(centroid), anchored));
			}
		}
	}
}

#[test]
fn invalid_zoom_factor_is_ignored() {
	let mut t = ViewTransform::new(Point::new(5.0, 5.0), 1.5);
	for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
		t.zoom_about(Point::ZERO, factor, 0.2, 3.0);
		assert_eq!(t, ViewTransform::new(Point::new(5.0, 5.0), 1.5));
	}
}

#[test]
fn fit_centers_content_inside_padding() {
	let content = Rect::new(100.0, 100.0, 400.0, 200.0);
	let t = ViewTransform::fit_rect(&content, 800.0, 600.0, 40.0, 0.2, 3.0);
	// width-bound: (800 - 80) / 400
	assert!(approx(t.scale, 1.8));
	assert!(approx_point(t.graph_to_screen(content.center()), Point::new(400.0, 300.0)));

	let tiny = Rect::new(0.0, 0.0, 1.0, 1.0);
	assert_eq!(ViewTransform::fit_rect(&tiny, 800.0, 600.0, 40.0, 0.2, 3.0).scale, 3.0);
}

#[test]
fn bezier_distance_finds_the_curve() {
	let c = CubicBezier::new(
		Point::new(0.0, 0.0),
		Point::new(50.0, 0.0),
		Point::new(50.0, 100.0),
		Point::new(100.0, 100.0),
	);
	assert!(c.distance_to(c.point_at(0.5)) < 1e-6);
	assert!(c.distance_to(Point::new(0.0, 100.0)) > 30.0);
	assert!(c.arc_length() > Point::ZERO.distance(Point::new(100.0, 100.0)));
}

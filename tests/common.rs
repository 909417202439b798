//! Shared fixtures: a small image pipeline and a matching node catalog.
//!
//! With default metrics and the monospace fallback metric, the three pipeline
//! nodes land at:
//!
//! - `load`  (0, 0)   180 x 70, output IMAGE at (180, 50)
//! - `scale` (400, 0) 186 x 94, input `image` at (400, 50), output IMAGE at (586, 74)
//! - `save`  (800, 0) 180 x 70, input `images` at (800, 50)
use std::collections::HashMap;

use workflow_canvas::catalog::{InputDefinition, NodeDefinition, catalog_from};
use workflow_canvas::types::{InputValue, NodeCategory, Primitive, SlotType};
use workflow_canvas::{Editor, EditorConfig, Graph, Node, Point};

pub const LOAD_OUT: Point = Point::new(180.0, 50.0);
pub const SCALE_IN: Point = Point::new(400.0, 50.0);
pub const SCALE_OUT: Point = Point::new(586.0, 74.0);
pub const SAVE_IN: Point = Point::new(800.0, 50.0);
pub const EMPTY: Point = Point::new(600.0, 400.0);

#[allow(dead_code)]
pub fn pipeline() -> Graph {
	let mut g = Graph::new();
	g.add_node(
		Node::new("load", "LoadImage", Point::new(0.0, 0.0))
			.with_category(NodeCategory::Loader)
			.with_output("IMAGE"),
	);
	g.add_node(
		Node::new("scale", "ImageScale", Point::new(400.0, 0.0))
			.with_category(NodeCategory::Image)
			.with_input("image", InputValue::slot("IMAGE"))
			.with_input("factor", InputValue::literal(Primitive::Float(1.5)))
			.with_output("IMAGE"),
	);
	g.add_node(
		Node::new("save", "SaveImage", Point::new(800.0, 0.0))
			.with_category(NodeCategory::Output)
			.with_input("images", InputValue::slot("IMAGE")),
	);
	g
}

/// Identity view over an 800 x 600 viewport, so screen and graph space agree.
#[allow(dead_code)]
pub fn editor() -> Editor {
	editor_with(pipeline())
}

#[allow(dead_code)]
pub fn editor_with(graph: Graph) -> Editor {
	let mut e = Editor::new(graph, EditorConfig::default());
	e.set_viewport_size(800.0, 600.0);
	e
}

#[allow(dead_code)]
pub fn catalog() -> HashMap<String, NodeDefinition> {
	catalog_from([
		NodeDefinition {
			class_type: "ImageScale".into(),
			display_name: Some("Upscale Image".into()),
			category: NodeCategory::Image,
			inputs: vec![
				InputDefinition::slot("image", "IMAGE"),
				InputDefinition::widget("factor", "FLOAT", Primitive::Float(1.0)),
			],
			outputs: vec![SlotType::new("IMAGE")],
		},
		NodeDefinition {
			class_type: "KSampler".into(),
			display_name: None,
			category: NodeCategory::Sampling,
			inputs: vec![
				InputDefinition::slot("model", "MODEL"),
				InputDefinition::widget("seed", "INT", Primitive::Int(0)),
				InputDefinition::widget("sampler_name", "STRING", Primitive::Text("euler".into())),
				InputDefinition::widget("denoise", "BOOLEAN", Primitive::Bool(true)),
			],
			outputs: vec![SlotType::new("LATENT")],
		},
		NodeDefinition {
			class_type: "SamplerSettings".into(),
			display_name: None,
			category: NodeCategory::Sampling,
			inputs: vec![
				InputDefinition::widget("steps", "INT", Primitive::Int(20)),
				InputDefinition::widget("cfg", "FLOAT", Primitive::Float(8.0)),
			],
			outputs: Vec::new(),
		},
	])
}

#[allow(dead_code)]
pub fn approx(a: f64, b: f64) -> bool {
	(a - b).abs() < 1e-6
}

#[allow(dead_code)]
pub fn approx_point(a: Point, b: Point) -> bool {
	approx(a.x, b.x) && approx(a.y, b.y)
}

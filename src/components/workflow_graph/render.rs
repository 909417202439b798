//! Render model: turns the graph, its layout and the interaction state into a flat,
//! layered list of draw commands.
//!
//! Nothing here touches a canvas. A [`Frame`] is plain data, produced the same way
//! in tests and in the browser; the web painter only executes it. Layers are
//! emitted in a fixed back-to-front order:
//!
//! 1. Group backgrounds
//! 2. Edges
//! 3. Nodes (body, header, rows, slots, selection outline)
//! 4. Notes
//! 5. Transient overlays (connection glow, compatible slots, drag and run highlights)

use std::collections::HashMap;

use super::catalog::{NodeCatalog, effective_default, is_edited};
use super::geometry::{CubicBezier, Point, Rect, ViewTransform};
use super::hit::edge_routes;
use super::layout::{GraphLayout, NodeLayout};
use super::scale::{EditorConfig, ScaledValues};
use super::state::{EditorState, Mode};
use super::text::{FormattedValue, PlaceholderResolver, TextMeasure, format_value, truncate_to_width};
use super::theme::{Color, Theme};
use super::types::{Graph, InputValue, Node, NodeId};

/// Back-to-front drawing layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
	Groups,
	Edges,
	Nodes,
	Notes,
	Overlays,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
	Left,
	Center,
	Right,
}

/// One drawing instruction in graph space.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	FillRect {
		rect: Rect,
		radius: f64,
		color: Color,
	},
	StrokeRect {
		rect: Rect,
		radius: f64,
		color: Color,
		width: f64,
	},
	FillCircle {
		center: Point,
		radius: f64,
		color: Color,
	},
	StrokeCircle {
		center: Point,
		radius: f64,
		color: Color,
		width: f64,
	},
	/// A chain of cubic segments stroked as one path.
	Wire {
		segments: Vec<CubicBezier>,
		color: Color,
		width: f64,
	},
	/// Single-line text, vertically centred on `position.y`.
	Text {
		position: Point,
		text: String,
		size: f64,
		color: Color,
		align: TextAlign,
	},
	/// Boolean literal switch centred on `center`.
	Toggle {
		center: Point,
		on: bool,
		color: Color,
	},
}

#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
	pub layer: Layer,
	pub command: DrawCommand,
}

/// Everything needed to paint one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
	pub transform: ViewTransform,
	pub background: Color,
	pub primitives: Vec<Primitive>,
}

impl Frame {
	pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
		self.primitives
			.iter()
			.filter(move |p| p.layer == layer)
			.map(|p| &p.command)
	}

	/// All text drawn in the frame, in order.
	pub fn texts(&self) -> impl Iterator<Item = &str> {
		self.primitives.iter().filter_map(|p| match &p.command {
			DrawCommand::Text { text, .. } => Some(text.as_str()),
			_ => None,
		})
	}
}

/// How strongly a node is highlighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeHighlight {
	None,
	Candidate,
	Selected,
}

/// Highlight of one node. The node open in the attribute editor wins over a
/// mode-specific selection, which wins over being a mapping candidate.
pub fn resolve_highlight(node: &NodeId, state: &EditorState) -> NodeHighlight {
	if state.editing.as_ref() == Some(node) {
		return NodeHighlight::Selected;
	}
	match &state.mode {
		Mode::EditSelect if state.selected_nodes.contains(node) => NodeHighlight::Selected,
		Mode::ConnectionDrawing { source, .. } if &source.node == node => NodeHighlight::Selected,
		Mode::FieldMapping if state.mapping.is_selected(node) => NodeHighlight::Selected,
		Mode::FieldMapping if state.mapping.is_candidate(node) => NodeHighlight::Candidate,
		_ => NodeHighlight::None,
	}
}

/// What the server reports about the running prompt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionSnapshot {
	pub running: Option<NodeId>,
	/// Progress of the running node in `[0, 1]`.
	pub progress: Option<f64>,
}

static IDLE: ExecutionSnapshot = ExecutionSnapshot {
	running: None,
	progress: None,
};

/// Host-provided collaborators consulted while building a frame.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
	pub catalog: &'a dyn NodeCatalog,
	pub placeholders: &'a dyn PlaceholderResolver,
	pub execution: &'a ExecutionSnapshot,
}

impl RenderContext<'static> {
	/// No catalog, no placeholder names, nothing running.
	pub fn detached() -> Self {
		Self {
			catalog: &super::catalog::EmptyCatalog,
			placeholders: &super::text::NoPlaceholders,
			execution: &IDLE,
		}
	}
}

/// Output slot colours for one frame, keyed by `(node, output index)`.
///
/// Built once per frame so slot circles and the wires leaving them agree even
/// when an edge carries no type of its own.
#[derive(Clone, Debug, Default)]
pub struct WireColors(HashMap<(NodeId, usize), Color>);

impl WireColors {
	pub fn build(graph: &Graph, theme: &Theme) -> Self {
		let mut colors = HashMap::new();
		for node in &graph.nodes {
			for (index, output) in node.outputs.iter().enumerate() {
				colors.insert(
					(node.id.clone(), index),
					theme.wire_color(Some(&output.slot_type)),
				);
			}
		}
		Self(colors)
	}

	pub fn get(&self, node: &NodeId, index: usize) -> Option<Color> {
		self.0.get(&(node.clone(), index)).copied()
	}
}

/// Inputs of one render pass.
pub struct FrameInput<'a> {
	pub graph: &'a Graph,
	pub layout: &'a GraphLayout,
	pub state: &'a EditorState,
	/// Displayed (possibly animating) transform.
	pub transform: ViewTransform,
	pub config: &'a EditorConfig,
	pub theme: &'a Theme,
	pub measure: &'a dyn TextMeasure,
	pub context: RenderContext<'a>,
}

struct Builder<'a> {
	input: &'a FrameInput<'a>,
	scaled: ScaledValues,
	wire_colors: WireColors,
	primitives: Vec<Primitive>,
}

/// Build the frame for the current state.
pub fn build_frame(input: &FrameInput<'_>) -> Frame {
	let mut b = Builder {
		input,
		scaled: ScaledValues::new(input.config, input.transform.scale),
		wire_colors: WireColors::build(input.graph, input.theme),
		primitives: Vec::new(),
	};
	b.groups();
	b.edges();
	b.nodes();
	b.notes();
	b.overlays();
	Frame {
		transform: input.transform,
		background: input.theme.background,
		primitives: b.primitives,
	}
}

impl Builder<'_> {
	fn push(&mut self, layer: Layer, command: DrawCommand) {
		self.primitives.push(Primitive { layer, command });
	}

	fn text(&mut self, layer: Layer, position: Point, text: String, size: f64, color: Color, align: TextAlign) {
		self.push(
			layer,
			DrawCommand::Text {
				position,
				text,
				size,
				color,
				align,
			},
		);
	}

	fn fit(&self, text: &str, width: f64, size: f64) -> String {
		truncate_to_width(text, width, size, self.input.measure)
	}

	fn groups(&mut self) {
		let FrameInput {
			graph,
			layout,
			theme,
			config,
			..
		} = *self.input;
		let m = &config.layout;
		for (index, group) in graph.groups.iter().enumerate() {
			let Some(g) = layout.group(&group.id) else {
				continue;
			};
			let color = theme.group_color(group, index);
			self.push(
				Layer::Groups,
				DrawCommand::FillRect {
					rect: g.rect,
					radius: m.corner_radius,
					color: color.with_alpha(0.15),
				},
			);
			self.push(
				Layer::Groups,
				DrawCommand::FillRect {
					rect: g.header,
					radius: m.corner_radius,
					color: color.with_alpha(0.35),
				},
			);
			let title = self.fit(
				&group.title,
				g.header.width - m.content_padding * 2.0,
				m.title_font_size,
			);
			self.text(
				Layer::Groups,
				Point::new(g.header.left() + m.content_padding, g.header.center().y),
				title,
				m.title_font_size,
				theme.text,
				TextAlign::Left,
			);
		}
	}

	fn edges(&mut self) {
		let FrameInput {
			graph,
			layout,
			theme,
			config,
			..
		} = *self.input;
		for (id, route) in edge_routes(graph, layout, &config.routing) {
			let Some(edge) = graph.edge(id) else {
				continue;
			};
			let mut color = match &edge.slot_type {
				Some(t) => theme.wire_color(Some(t)),
				None => self
					.wire_colors
					.get(&edge.source, edge.source_output)
					.unwrap_or(theme.wire_fallback),
			};
			let bypassed = [&edge.source, &edge.target]
				.iter()
				.any(|id| graph.node(id).is_some_and(|n| n.bypass));
			if bypassed {
				color = color.fade(theme.bypass_alpha);
			}
			self.push(
				Layer::Edges,
				DrawCommand::Wire {
					segments: route.segments(),
					color,
					width: self.scaled.wire_width,
				},
			);
		}
	}

	fn nodes(&mut self) {
		let graph = self.input.graph;
		let layout = self.input.layout;
		for node in &graph.nodes {
			if let Some(l) = layout.node(&node.id) {
				self.node(node, l);
			}
		}
	}

	fn node(&mut self, node: &Node, l: &NodeLayout) {
		let FrameInput {
			theme,
			config,
			state,
			context,
			..
		} = *self.input;
		let m = &config.layout;
		let colors = theme.node_colors(node);
		let dim = |c: Color| if node.bypass { c.fade(theme.bypass_alpha) } else { c };

		self.push(
			Layer::Nodes,
			DrawCommand::FillRect {
				rect: l.rect,
				radius: m.corner_radius,
				color: dim(colors.body),
			},
		);
		self.push(
			Layer::Nodes,
			DrawCommand::FillRect {
				rect: l.header,
				radius: m.corner_radius,
				color: dim(colors.header),
			},
		);
		let title = self.fit(&node.title, l.title_width, m.title_font_size);
		self.text(
			Layer::Nodes,
			Point::new(l.header.left() + m.content_padding, l.header.center().y),
			title,
			m.title_font_size,
			dim(theme.text),
			TextAlign::Left,
		);

		let value_alpha = self.scaled.value_alpha;
		for (input, row) in node.inputs.iter().zip(&l.inputs) {
			let y = row.row_rect.center().y;
			let label_x = row.row_rect.left() + m.content_padding;
			let half = row.row_rect.width / 2.0 - m.content_padding;
			match &input.value {
				InputValue::Literal { .. } => {
					let label = self.fit(&input.name, half, m.body_font_size);
					self.text(
						Layer::Nodes,
						Point::new(label_x, y),
						label,
						m.body_font_size,
						dim(theme.text_muted),
						TextAlign::Left,
					);
					if value_alpha <= 0.0 {
						continue;
					}
					let Some(value) = effective_default(context.catalog, node, &input.name) else {
						continue;
					};
					let right = row.row_rect.right() - m.content_padding;
					match format_value(value, context.placeholders, config.text.long_value_chars) {
						FormattedValue::Text(s) => {
							let s = self.fit(&s, half, m.body_font_size);
							self.text(
								Layer::Nodes,
								Point::new(right, y),
								s,
								m.body_font_size,
								dim(theme.text).fade(value_alpha),
								TextAlign::Right,
							);
						}
						FormattedValue::Toggle(on) => {
							let color = if on { theme.toggle_on } else { theme.toggle_off };
							self.push(
								Layer::Nodes,
								DrawCommand::Toggle {
									center: Point::new(right - m.row_height / 2.0, y),
									on,
									color: dim(color).fade(value_alpha),
								},
							);
						}
					}
					if is_edited(context.catalog, node, &input.name) {
						self.push(
							Layer::Nodes,
							DrawCommand::FillCircle {
								center: Point::new(row.row_rect.left() + m.content_padding / 2.0, y),
								radius: m.slot_radius / 2.5,
								color: theme.edited_marker,
							},
						);
					}
				}
				InputValue::Connection { slot_type, .. } | InputValue::UnconnectedSlot { slot_type } => {
					let color = if input.value.is_connected() {
						theme.wire_color(Some(slot_type))
					} else {
						theme.slot_unconnected
					};
					self.push(
						Layer::Nodes,
						DrawCommand::FillCircle {
							center: row.slot,
							radius: m.slot_radius,
							color: dim(color),
						},
					);
					let label = self.fit(&input.name, half, m.body_font_size);
					self.text(
						Layer::Nodes,
						Point::new(label_x + m.slot_radius, y),
						label,
						m.body_font_size,
						dim(theme.text_muted),
						TextAlign::Left,
					);
				}
			}
		}

		for (output, row) in node.outputs.iter().zip(&l.outputs) {
			let color = self
				.wire_colors
				.get(&node.id, row.index)
				.unwrap_or(theme.wire_fallback);
			self.push(
				Layer::Nodes,
				DrawCommand::FillCircle {
					center: row.slot,
					radius: m.slot_radius,
					color: dim(color),
				},
			);
			let width = row.row_rect.width / 2.0 - m.content_padding;
			let label = self.fit(output.label(), width, m.body_font_size);
			self.text(
				Layer::Nodes,
				Point::new(row.slot.x - m.slot_radius - m.content_padding, row.slot.y),
				label,
				m.body_font_size,
				dim(theme.text_muted),
				TextAlign::Right,
			);
		}

		if node.bypass {
			self.push(
				Layer::Nodes,
				DrawCommand::FillRect {
					rect: l.rect,
					radius: m.corner_radius,
					color: theme.bypass_tint,
				},
			);
		}

		if state.mode == Mode::EditSelect {
			for (icon, rect) in &l.header_icons {
				self.push(
					Layer::Nodes,
					DrawCommand::FillCircle {
						center: rect.center(),
						radius: rect.width / 2.0,
						color: colors.header.darken(0.3),
					},
				);
				self.text(
					Layer::Nodes,
					rect.center(),
					icon.glyph().to_string(),
					m.body_font_size,
					theme.icon,
					TextAlign::Center,
				);
			}
		}

		let outline = match resolve_highlight(&node.id, state) {
			NodeHighlight::Selected => Some(theme.highlight.selected),
			NodeHighlight::Candidate => Some(theme.highlight.candidate),
			NodeHighlight::None => None,
		};
		if let Some(color) = outline {
			self.push(
				Layer::Nodes,
				DrawCommand::StrokeRect {
					rect: l.rect.expand(self.scaled.highlight_width),
					radius: m.corner_radius,
					color,
					width: self.scaled.highlight_width,
				},
			);
		}
	}

	fn notes(&mut self) {
		let FrameInput {
			graph,
			layout,
			theme,
			config,
			state,
			..
		} = *self.input;
		let m = &config.layout;
		for note in &graph.notes {
			let Some(l) = layout.note(&note.id) else {
				continue;
			};
			self.push(
				Layer::Notes,
				DrawCommand::FillRect {
					rect: l.rect,
					radius: m.corner_radius,
					color: theme.note.body,
				},
			);
			self.push(
				Layer::Notes,
				DrawCommand::FillRect {
					rect: l.header,
					radius: m.corner_radius,
					color: theme.note.header,
				},
			);
			let width = l.rect.width - m.content_padding * 2.0;
			let title = self.fit(&note.title, width, m.title_font_size);
			self.text(
				Layer::Notes,
				Point::new(l.header.left() + m.content_padding, l.header.center().y),
				title,
				m.title_font_size,
				theme.text,
				TextAlign::Left,
			);
			let mut y = l.header.bottom() + m.note_line_height / 2.0;
			for line in &l.visible_lines {
				let line = self.fit(line, width, m.body_font_size);
				self.text(
					Layer::Notes,
					Point::new(l.rect.left() + m.content_padding, y),
					line,
					m.body_font_size,
					theme.text,
					TextAlign::Left,
				);
				y += m.note_line_height;
			}
			if l.truncated {
				self.text(
					Layer::Notes,
					Point::new(l.rect.left() + m.content_padding, y),
					super::text::ELLIPSIS.to_string(),
					m.body_font_size,
					theme.text_muted,
					TextAlign::Left,
				);
			}
			let selected = state.mode == Mode::EditSelect && state.selected_notes.contains(&note.id);
			if selected {
				self.push(
					Layer::Notes,
					DrawCommand::StrokeRect {
						rect: l.rect.expand(self.scaled.highlight_width),
						radius: m.corner_radius,
						color: theme.highlight.selected,
						width: self.scaled.highlight_width,
					},
				);
			}
		}
	}

	fn overlays(&mut self) {
		let FrameInput {
			graph,
			layout,
			theme,
			config,
			state,
			context,
			..
		} = *self.input;
		let m = &config.layout;
		let width = self.scaled.highlight_width;

		if let Mode::ConnectionDrawing { source, .. } = &state.mode {
			let source_type = graph.output_type(&source.node, source.index).cloned();
			if let Some(slot) = layout
				.node(&source.node)
				.and_then(|l| l.output(source.index))
			{
				self.push(
					Layer::Overlays,
					DrawCommand::FillCircle {
						center: slot.slot,
						radius: m.slot_radius * 2.0,
						color: theme.highlight.connection_glow.with_alpha(0.35),
					},
				);
				self.push(
					Layer::Overlays,
					DrawCommand::StrokeCircle {
						center: slot.slot,
						radius: m.slot_radius * 1.5,
						color: theme.highlight.connection_glow,
						width,
					},
				);
			}
			if let Some(source_type) = source_type {
				for node in graph.nodes.iter().filter(|n| n.id != source.node) {
					let Some(l) = layout.node(&node.id) else {
						continue;
					};
					for (input, row) in node.inputs.iter().zip(&l.inputs) {
						if input.value.is_literal() || !input.value.slot_type().accepts(&source_type) {
							continue;
						}
						self.push(
							Layer::Overlays,
							DrawCommand::StrokeCircle {
								center: row.slot,
								radius: m.slot_radius * 1.6,
								color: theme.highlight.compatible_slot,
								width,
							},
						);
					}
				}
			}
		}

		for id in state.dragged_nodes() {
			if let Some(l) = layout.node(id) {
				self.push(
					Layer::Overlays,
					DrawCommand::StrokeRect {
						rect: l.rect.expand(width * 2.0),
						radius: m.corner_radius,
						color: theme.highlight.drag,
						width,
					},
				);
			}
		}

		let execution = context.execution;
		if let Some(l) = execution.running.as_ref().and_then(|id| layout.node(id)) {
			self.push(
				Layer::Overlays,
				DrawCommand::StrokeRect {
					rect: l.rect.expand(width * 2.0),
					radius: m.corner_radius,
					color: theme.highlight.running,
					width: width * 1.5,
				},
			);
			if let Some(progress) = execution.progress.filter(|p| p.is_finite()) {
				let bar = Rect::new(
					l.header.left(),
					l.header.bottom() - 3.0,
					l.header.width * progress.clamp(0.0, 1.0),
					3.0,
				);
				self.push(
					Layer::Overlays,
					DrawCommand::FillRect {
						rect: bar,
						radius: 0.0,
						color: theme.highlight.progress,
					},
				);
			}
		}
	}
}

//! Visual theming for the workflow canvas.
//!
//! Provides node category colours, wire colours per slot type, group palette and
//! highlight styles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{Group, Node, NodeCategory, SlotType};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Multiply the current alpha.
	pub fn fade(self, factor: f64) -> Self {
		Self {
			a: self.a * factor.clamp(0.0, 1.0),
			..self
		}
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t) as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t) as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t) as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parse `#rrggbb` (or `#rgb`). Anything else yields `None`.
	pub fn parse_hex(s: &str) -> Option<Color> {
		let hex = s.trim().strip_prefix('#')?;
		let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
		match hex.len() {
			6 => Some(Color::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
			3 => {
				let (r, g, b) = (channel(0, 1)?, channel(1, 1)?, channel(2, 1)?);
				Some(Color::rgb(r * 17, g * 17, b * 17))
			}
			_ => None,
		}
	}
}

/// Header and body colour of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeColors {
	pub header: Color,
	pub body: Color,
}

impl NodeColors {
	pub const fn new(header: Color, body: Color) -> Self {
		Self { header, body }
	}
}

/// Colours of transient highlight overlays.
#[derive(Clone, Debug)]
pub struct HighlightStyle {
	/// Outline of selected / edit-target nodes.
	pub selected: Color,
	/// Outline of field-mapping candidates.
	pub candidate: Color,
	/// Glow around the source slot while drawing a connection.
	pub connection_glow: Color,
	/// Ring around input slots that accept the pending connection.
	pub compatible_slot: Color,
	/// Outline of the node being dragged.
	pub drag: Color,
	/// Glow around the node currently executing on the server.
	pub running: Color,
	/// Progress bar under the running node's header.
	pub progress: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: Color,
	pub text: Color,
	pub text_muted: Color,
	pub slot_unconnected: Color,
	pub edited_marker: Color,
	pub toggle_on: Color,
	pub toggle_off: Color,
	pub bypass_tint: Color,
	pub bypass_alpha: f64,
	pub note: NodeColors,
	pub icon: Color,
	pub highlight: HighlightStyle,
	pub categories: HashMap<NodeCategory, NodeColors>,
	/// Prompt-node overrides for titles containing "positive" / "negative".
	pub positive_prompt: NodeColors,
	pub negative_prompt: NodeColors,
	pub wires: HashMap<SlotType, Color>,
	pub wire_fallback: Color,
	pub group_palette: Vec<Color>,
}

impl Theme {
	/// Dark theme matching the generation server's web UI.
	pub fn dark() -> Self {
		let categories = [
			(NodeCategory::Loader, NodeColors::new(Color::rgb(58, 74, 104), Color::rgb(43, 52, 68))),
			(NodeCategory::Model, NodeColors::new(Color::rgb(92, 70, 122), Color::rgb(56, 48, 70))),
			(NodeCategory::Conditioning, NodeColors::new(Color::rgb(122, 96, 52), Color::rgb(66, 58, 44))),
			(NodeCategory::Sampling, NodeColors::new(Color::rgb(60, 96, 110), Color::rgb(42, 56, 62))),
			(NodeCategory::Latent, NodeColors::new(Color::rgb(118, 70, 98), Color::rgb(66, 48, 60))),
			(NodeCategory::Image, NodeColors::new(Color::rgb(52, 94, 128), Color::rgb(40, 54, 68))),
			(NodeCategory::Mask, NodeColors::new(Color::rgb(62, 104, 72), Color::rgb(44, 58, 48))),
			(NodeCategory::Video, NodeColors::new(Color::rgb(128, 78, 52), Color::rgb(68, 50, 42))),
			(NodeCategory::Utility, NodeColors::new(Color::rgb(80, 84, 92), Color::rgb(50, 52, 56))),
			(NodeCategory::Output, NodeColors::new(Color::rgb(46, 112, 90), Color::rgb(38, 60, 54))),
			(NodeCategory::Other, NodeColors::new(Color::rgb(68, 68, 68), Color::rgb(53, 53, 53))),
		]
		.into_iter()
		.collect();

		let wires = [
			("MODEL", Color::rgb(178, 157, 255)),
			("CLIP", Color::rgb(255, 210, 0)),
			("VAE", Color::rgb(255, 108, 108)),
			("CONDITIONING", Color::rgb(255, 160, 49)),
			("LATENT", Color::rgb(255, 157, 245)),
			("IMAGE", Color::rgb(100, 181, 246)),
			("MASK", Color::rgb(129, 200, 132)),
			("CONTROL_NET", Color::rgb(0, 214, 163)),
			("CLIP_VISION", Color::rgb(168, 218, 220)),
			("VIDEO", Color::rgb(255, 138, 101)),
			("AUDIO", Color::rgb(186, 104, 200)),
			("INT", Color::rgb(125, 190, 220)),
			("FLOAT", Color::rgb(170, 215, 130)),
			("STRING", Color::rgb(200, 200, 120)),
			("BOOLEAN", Color::rgb(220, 130, 160)),
		]
		.into_iter()
		.map(|(name, color)| (SlotType::new(name), color))
		.collect();

		Self {
			name: "dark",
			background: Color::rgb(32, 32, 32),
			text: Color::rgb(230, 230, 230),
			text_muted: Color::rgb(160, 160, 160),
			slot_unconnected: Color::rgb(120, 120, 120),
			edited_marker: Color::rgb(255, 193, 7),
			toggle_on: Color::rgb(76, 175, 80),
			toggle_off: Color::rgb(97, 97, 97),
			bypass_tint: Color::rgba(156, 39, 176, 0.35),
			bypass_alpha: 0.5,
			note: NodeColors::new(Color::rgb(110, 98, 58), Color::rgb(72, 66, 46)),
			icon: Color::rgb(220, 220, 220),
			highlight: HighlightStyle {
				selected: Color::rgb(33, 150, 243),
				candidate: Color::rgba(255, 193, 7, 0.8),
				connection_glow: Color::rgba(100, 181, 246, 0.6),
				compatible_slot: Color::rgba(129, 200, 132, 0.9),
				drag: Color::rgba(255, 255, 255, 0.5),
				running: Color::rgba(76, 175, 80, 0.7),
				progress: Color::rgb(76, 175, 80),
			},
			categories,
			positive_prompt: NodeColors::new(Color::rgb(50, 110, 60), Color::rgb(40, 64, 44)),
			negative_prompt: NodeColors::new(Color::rgb(128, 52, 52), Color::rgb(70, 42, 42)),
			wires,
			wire_fallback: Color::rgb(170, 170, 170),
			group_palette: vec![
				Color::rgb(138, 161, 192),
				Color::rgb(161, 138, 192),
				Color::rgb(138, 192, 161),
				Color::rgb(192, 170, 138),
				Color::rgb(192, 138, 138),
				Color::rgb(138, 183, 192),
			],
		}
	}

	/// Header/body colours of a node.
	///
	/// Prompt nodes are told apart by title: a title containing "positive" or
	/// "negative" (any case) gets the matching override. This applies to those two
	/// words only.
	pub fn node_colors(&self, node: &Node) -> NodeColors {
		let title = node.title.to_lowercase();
		if title.contains("positive") {
			return self.positive_prompt;
		}
		if title.contains("negative") {
			return self.negative_prompt;
		}
		self.category_colors(node.category)
	}

	pub fn category_colors(&self, category: NodeCategory) -> NodeColors {
		match self.categories.get(&category) {
			Some(colors) => *colors,
			None => self
				.categories
				.get(&NodeCategory::Other)
				.copied()
				.unwrap_or(NodeColors::new(Color::rgb(68, 68, 68), Color::rgb(53, 53, 53))),
		}
	}

	/// Wire colour for a slot type, falling back to a neutral grey.
	pub fn wire_color(&self, slot_type: Option<&SlotType>) -> Color {
		slot_type
			.and_then(|t| self.wires.get(t))
			.copied()
			.unwrap_or(self.wire_fallback)
	}

	/// Explicit group colour, else a palette entry by position.
	pub fn group_color(&self, group: &Group, index: usize) -> Color {
		group
			.color
			.as_deref()
			.and_then(Color::parse_hex)
			.unwrap_or_else(|| {
				if self.group_palette.is_empty() {
					self.wire_fallback
				} else {
					self.group_palette[index % self.group_palette.len()]
				}
			})
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::dark()
	}
}

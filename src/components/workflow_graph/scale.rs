//! Editor configuration and zoom-dependent scaling.
//!
//! This module centralizes every tunable of the canvas: layout metrics, zoom
//! limits, animation timing, routing constants and how visuals react to zoom.
//!
//! # Coordinate Spaces
//!
//! - **Graph-space**: The coordinate system of the workflow. Values in graph-space
//!   scale proportionally with zoom (appear larger when zoomed in).
//! - **Screen-space**: Pixel coordinates on the canvas. Values in screen-space
//!   remain constant regardless of zoom level.
//!
//! # Scaling Behaviors
//!
//! - [`ScaleBehavior::World`]: Scales with zoom.
//! - [`ScaleBehavior::Screen`]: Constant screen size. Divides by `k` to counteract
//!   the canvas transform.
//! - [`ScaleBehavior::Clamped`]: Graph-space scaling with min/max screen-size bounds.
//!   Slot hit areas use this so they stay tappable when zoomed far out.

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleBehavior {
	/// Constant graph-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// Graph-space scaling, clamped to screen-space bounds. No `max_screen`
	/// means unbounded above.
	Clamped {
		min_screen: f64,
		#[serde(default)]
		max_screen: Option<f64>,
	},
}

impl ScaleBehavior {
	/// Compute the graph-space value for a given base value and zoom level.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => {
				// screen_size = world_size * k
				let min_world = min_screen / k;
				let clamped = base.max(min_world);
				match max_screen {
					Some(max_screen) => clamped.min((max_screen / k).max(min_world)),
					None => clamped,
				}
			}
		}
	}
}

/// Defines how alpha/opacity scales with zoom level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlphaBehavior {
	/// Constant alpha regardless of zoom.
	Constant,
	/// Alpha scales linearly with zoom, clamped to [0, 1].
	ScaleWithZoom,
	/// Fully visible at `full_alpha_k`, fades to zero at `zero_alpha_k`.
	Fade { zero_alpha_k: f64, full_alpha_k: f64 },
}

impl AlphaBehavior {
	/// Compute alpha multiplier for a given zoom level.
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::Constant => 1.0,
			AlphaBehavior::ScaleWithZoom => k.clamp(0.0, 1.0),
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				let t = (k - zero_alpha_k) / (full_alpha_k - zero_alpha_k);
				t.clamp(0.0, 1.0)
			}
		}
	}
}

/// Fixed sizes used by the layout engine, in graph units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
	pub header_height: f64,
	pub row_height: f64,
	pub padding_top: f64,
	pub padding_bottom: f64,
	pub min_node_width: f64,
	/// Horizontal padding around the title and row contents.
	pub content_padding: f64,
	/// Visual slot circle radius.
	pub slot_radius: f64,
	/// Tap tolerance around a slot centre. Deliberately larger than `slot_radius`.
	pub slot_hit_radius: f64,
	/// Side of a header icon square (edit mode only).
	pub icon_size: f64,
	pub icon_spacing: f64,
	pub group_margin: f64,
	pub group_header_height: f64,
	pub min_group_width: f64,
	pub min_group_height: f64,
	pub note_header_height: f64,
	pub note_line_height: f64,
	pub note_max_lines: usize,
	pub min_note_width: f64,
	pub title_font_size: f64,
	pub body_font_size: f64,
	pub corner_radius: f64,
}

impl Default for LayoutMetrics {
	fn default() -> Self {
		Self {
			header_height: 30.0,
			row_height: 24.0,
			padding_top: 8.0,
			padding_bottom: 8.0,
			min_node_width: 180.0,
			content_padding: 12.0,
			slot_radius: 7.0,
			slot_hit_radius: 30.0,
			icon_size: 20.0,
			icon_spacing: 6.0,
			group_margin: 12.0,
			group_header_height: 34.0,
			min_group_width: 120.0,
			min_group_height: 80.0,
			note_header_height: 28.0,
			note_line_height: 18.0,
			note_max_lines: 8,
			min_note_width: 120.0,
			title_font_size: 14.0,
			body_font_size: 12.0,
			corner_radius: 6.0,
		}
	}
}

/// Zoom limits and view-control steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Factor applied by the zoom-in/out buttons.
	pub zoom_step: f64,
	/// Screen padding kept around content by fit-to-content.
	pub fit_padding: f64,
	/// Tolerance, in screen pixels, for tapping a wire.
	pub wire_hit_tolerance: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.2,
			max_zoom: 3.0,
			zoom_step: 1.25,
			fit_padding: 40.0,
			wire_hit_tolerance: 12.0,
		}
	}
}

/// Durations (seconds) for view-layer transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
	pub node_move_duration: f64,
	pub viewport_duration: f64,
}

impl Default for AnimationConfig {
	fn default() -> Self {
		Self {
			node_move_duration: 0.3,
			viewport_duration: 0.3,
		}
	}
}

/// Constants of the edge routing policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
	/// Control-point offset as a fraction of the horizontal distance.
	pub forward_factor: f64,
	pub min_control_offset: f64,
	/// Backward edges closer than this vertically loop around the right side.
	pub loop_threshold: f64,
	/// How far right of both nodes the loop reaches.
	pub loop_extent: f64,
}

impl Default for RoutingConfig {
	fn default() -> Self {
		Self {
			forward_factor: 0.4,
			min_control_offset: 50.0,
			loop_threshold: 50.0,
			loop_extent: 80.0,
		}
	}
}

/// Text formatting thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
	/// Strings longer than this are middle-elided.
	pub long_value_chars: usize,
	/// Width-to-font-size ratio of the fallback text metric.
	pub char_width_ratio: f64,
}

impl Default for TextConfig {
	fn default() -> Self {
		Self {
			long_value_chars: 28,
			char_width_ratio: 0.6,
		}
	}
}

/// Zoom-dependent visual behaviours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
	/// Wire width in screen pixels.
	pub wire_width: f64,
	pub wire_width_behavior: ScaleBehavior,
	pub slot_hit_behavior: ScaleBehavior,
	/// Value text fades out when zoomed far out.
	pub value_alpha_behavior: AlphaBehavior,
	/// Outline width of highlighted nodes in screen pixels.
	pub highlight_width: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			wire_width: 2.5,
			wire_width_behavior: ScaleBehavior::Clamped {
				min_screen: 1.5,
				max_screen: Some(6.0),
			},
			slot_hit_behavior: ScaleBehavior::Clamped {
				min_screen: 24.0,
				max_screen: None,
			},
			value_alpha_behavior: AlphaBehavior::Fade {
				zero_alpha_k: 0.3,
				full_alpha_k: 0.5,
			},
			highlight_width: 3.0,
		}
	}
}

/// Complete editor configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
	pub layout: LayoutMetrics,
	pub interaction: InteractionConfig,
	pub animation: AnimationConfig,
	pub routing: RoutingConfig,
	pub text: TextConfig,
	pub scale: ScaleConfig,
}

impl EditorConfig {
	/// Parse a JSON configuration document. Missing keys take their defaults.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: EditorConfig = serde_json::from_str(json)?;
		let (min, max) = (config.interaction.min_zoom, config.interaction.max_zoom);
		if !(min > 0.0 && min < max) {
			return Err(ConfigError::ZoomRange { min, max });
		}
		Ok(config)
	}

	/// Like [`EditorConfig::from_json`], logging and falling back to defaults.
	pub fn from_json_or_default(json: &str) -> Self {
		Self::from_json(json).unwrap_or_else(|e| {
			warn!("workflow-canvas: {}; using default config", e);
			Self::default()
		})
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create this once per frame. All sizes are in graph-space (ready to use after
/// the canvas transform).
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Current zoom level.
	pub k: f64,
	pub wire_width: f64,
	pub slot_hit_radius: f64,
	/// Value text visibility [0, 1].
	pub value_alpha: f64,
	pub highlight_width: f64,
}

impl ScaledValues {
	pub fn new(config: &EditorConfig, k: f64) -> Self {
		let k = if k.is_finite() && k > 0.0 { k } else { 1.0 };
		let scale = &config.scale;
		Self {
			k,
			wire_width: scale.wire_width_behavior.apply(scale.wire_width / k, k),
			slot_hit_radius: scale
				.slot_hit_behavior
				.apply(config.layout.slot_hit_radius, k),
			value_alpha: scale.value_alpha_behavior.apply(k),
			highlight_width: scale.highlight_width / k,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = EditorConfig::from_json(r#"{ "interaction": { "max_zoom": 4.0 } }"#).unwrap();
		assert_eq!(config.interaction.max_zoom, 4.0);
		assert_eq!(config.interaction.min_zoom, 0.2);
		assert_eq!(config.layout, LayoutMetrics::default());
	}

	#[test]
	fn inverted_zoom_range_is_rejected() {
		let err = EditorConfig::from_json(r#"{ "interaction": { "min_zoom": 2.0, "max_zoom": 1.0 } }"#);
		assert!(matches!(err, Err(ConfigError::ZoomRange { .. })));
		assert_eq!(
			EditorConfig::from_json_or_default("not json"),
			EditorConfig::default()
		);
	}

	#[test]
	fn default_config_survives_a_json_round_trip() {
		let json = serde_json::to_string(&EditorConfig::default()).unwrap();
		assert_eq!(EditorConfig::from_json(&json).unwrap(), EditorConfig::default());

		let mut config = EditorConfig::default();
		config.interaction.max_zoom = 5.0;
		let json = serde_json::to_string(&config).unwrap();
		assert_eq!(EditorConfig::from_json_or_default(&json), config);
	}

	#[test]
	fn unbounded_clamp_only_applies_the_minimum() {
		let clamp = ScaleBehavior::Clamped {
			min_screen: 24.0,
			max_screen: None,
		};
		assert_eq!(clamp.apply(30.0, 1.0), 30.0);
		assert_eq!(clamp.apply(30.0, 0.5), 48.0);
		assert_eq!(clamp.apply(30.0, 100.0), 30.0);
	}

	#[test]
	fn slot_hit_radius_stays_tappable_when_zoomed_out() {
		let config = EditorConfig::default();
		assert_eq!(ScaledValues::new(&config, 1.0).slot_hit_radius, 30.0);
		// 24 screen px at k = 0.2 is 120 graph units.
		assert!((ScaledValues::new(&config, 0.2).slot_hit_radius - 120.0).abs() < 1e-9);
	}
}

//! Canvas painter: executes a render [`Frame`] on a 2D context.
//!
//! The frame is already in back-to-front order, so painting is a single pass.
//! The view transform is applied once with `translate`/`scale`; every command is
//! in graph space.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::geometry::{Point, Rect};
use super::render::{DrawCommand, Frame, TextAlign};
use super::text::TextMeasure;
use super::theme::Color;

fn font(size: f64) -> String {
	format!("{size}px sans-serif")
}

/// Paint `frame` over the whole `width` × `height` canvas.
pub fn paint(frame: &Frame, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str(&frame.background.to_css());
	ctx.fill_rect(0.0, 0.0, width, height);

	ctx.save();
	let t = frame.transform;
	let _ = ctx.translate(t.offset.x, t.offset.y);
	let _ = ctx.scale(t.scale, t.scale);
	ctx.set_text_baseline("middle");

	for primitive in &frame.primitives {
		draw(ctx, &primitive.command);
	}

	ctx.restore();
}

fn draw(ctx: &CanvasRenderingContext2d, command: &DrawCommand) {
	match command {
		DrawCommand::FillRect {
			rect,
			radius,
			color,
		} => {
			ctx.set_fill_style_str(&color.to_css());
			rounded_rect(ctx, rect, *radius);
			ctx.fill();
		}
		DrawCommand::StrokeRect {
			rect,
			radius,
			color,
			width,
		} => {
			ctx.set_stroke_style_str(&color.to_css());
			ctx.set_line_width(*width);
			rounded_rect(ctx, rect, *radius);
			ctx.stroke();
		}
		DrawCommand::FillCircle {
			center,
			radius,
			color,
		} => {
			ctx.set_fill_style_str(&color.to_css());
			ctx.begin_path();
			let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
			ctx.fill();
		}
		DrawCommand::StrokeCircle {
			center,
			radius,
			color,
			width,
		} => {
			ctx.set_stroke_style_str(&color.to_css());
			ctx.set_line_width(*width);
			ctx.begin_path();
			let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
			ctx.stroke();
		}
		DrawCommand::Wire {
			segments,
			color,
			width,
		} => {
			let Some(first) = segments.first() else {
				return;
			};
			ctx.set_stroke_style_str(&color.to_css());
			ctx.set_line_width(*width);
			ctx.begin_path();
			ctx.move_to(first.p0.x, first.p0.y);
			for c in segments {
				ctx.bezier_curve_to(c.c1.x, c.c1.y, c.c2.x, c.c2.y, c.p1.x, c.p1.y);
			}
			ctx.stroke();
		}
		DrawCommand::Text {
			position,
			text,
			size,
			color,
			align,
		} => {
			ctx.set_font(&font(*size));
			ctx.set_text_align(match align {
				TextAlign::Left => "left",
				TextAlign::Center => "center",
				TextAlign::Right => "right",
			});
			ctx.set_fill_style_str(&color.to_css());
			let _ = ctx.fill_text(text, position.x, position.y);
		}
		DrawCommand::Toggle { center, on, color } => draw_toggle(ctx, *center, *on, *color),
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, rect: &Rect, radius: f64) {
	let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
	ctx.begin_path();
	ctx.move_to(rect.left() + r, rect.top());
	let _ = ctx.arc_to(rect.right(), rect.top(), rect.right(), rect.bottom(), r);
	let _ = ctx.arc_to(rect.right(), rect.bottom(), rect.left(), rect.bottom(), r);
	let _ = ctx.arc_to(rect.left(), rect.bottom(), rect.left(), rect.top(), r);
	let _ = ctx.arc_to(rect.left(), rect.top(), rect.right(), rect.top(), r);
	ctx.close_path();
}

fn draw_toggle(ctx: &CanvasRenderingContext2d, center: Point, on: bool, color: Color) {
	let (w, h) = (22.0, 12.0);
	let track = Rect::new(center.x - w / 2.0, center.y - h / 2.0, w, h);
	ctx.set_fill_style_str(&color.with_alpha(color.a * 0.5).to_css());
	rounded_rect(ctx, &track, h / 2.0);
	ctx.fill();

	let knob_x = if on { track.right() - h / 2.0 } else { track.left() + h / 2.0 };
	ctx.set_fill_style_str(&color.to_css());
	ctx.begin_path();
	let _ = ctx.arc(knob_x, center.y, h / 2.0 - 1.5, 0.0, 2.0 * PI);
	ctx.fill();
}

/// Text metric backed by the canvas' own font measurement.
#[derive(Clone, Debug)]
pub struct CanvasMetric {
	ctx: CanvasRenderingContext2d,
	fallback_ratio: f64,
}

impl CanvasMetric {
	pub fn new(ctx: CanvasRenderingContext2d, fallback_ratio: f64) -> Self {
		Self {
			ctx,
			fallback_ratio,
		}
	}
}

impl TextMeasure for CanvasMetric {
	fn measure(&self, text: &str, font_size: f64) -> f64 {
		self.ctx.set_font(&font(font_size));
		self.ctx
			.measure_text(text)
			.map(|m| m.width())
			.unwrap_or_else(|_| text.chars().count() as f64 * font_size * self.fallback_ratio)
	}
}

//! Leptos component wrapping the workflow canvas.
//!
//! The component creates an HTML canvas element, turns mouse, wheel and touch
//! input into [`Gesture`]s for the [`Editor`], and runs an animation loop via
//! `requestAnimationFrame` that advances the clock, builds a frame and paints it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::catalog::NodeDefinition;
use super::geometry::Point;
use super::paint::{CanvasMetric, paint};
use super::render::{ExecutionSnapshot, RenderContext};
use super::scale::EditorConfig;
use super::state::{Editor, EditorEvent, Gesture, ViewCommand};
use super::theme::Theme;
use super::types::WorkflowDocument;

/// Pointer travel (pixels) before a press becomes a drag.
const DRAG_SLOP: f64 = 6.0;
/// Seconds between two taps for them to count as a double tap.
const DOUBLE_TAP_WINDOW: f64 = 0.3;

fn now_seconds() -> f64 {
	js_sys::Date::now() / 1000.0
}

/// Turns raw press/move/release input into recognised gestures.
#[derive(Debug, Default)]
struct PointerTracker {
	down: Option<Point>,
	dragging: bool,
	last_tap: Option<(Point, f64)>,
	/// Last pinch centroid and finger distance.
	pinch: Option<(Point, f64)>,
}

impl PointerTracker {
	fn press(&mut self, p: Point) {
		self.down = Some(p);
		self.dragging = false;
	}

	fn motion(&mut self, p: Point) -> Vec<Gesture> {
		let Some(down) = self.down else {
			return Vec::new();
		};
		if self.dragging {
			return vec![Gesture::DragMove(p)];
		}
		if p.distance(down) < DRAG_SLOP {
			return Vec::new();
		}
		self.dragging = true;
		vec![Gesture::DragStart(down), Gesture::DragMove(p)]
	}

	fn release(&mut self, p: Point, now: f64) -> Vec<Gesture> {
		if self.down.take().is_none() {
			return Vec::new();
		}
		if std::mem::take(&mut self.dragging) {
			return vec![Gesture::DragEnd];
		}
		match self.last_tap.take() {
			Some((q, t)) if now - t < DOUBLE_TAP_WINDOW && q.distance(p) < DRAG_SLOP * 2.0 => {
				vec![Gesture::DoubleTap(p)]
			}
			_ => {
				self.last_tap = Some((p, now));
				vec![Gesture::Tap(p)]
			}
		}
	}

	fn cancel(&mut self) -> Vec<Gesture> {
		self.down = None;
		self.pinch = None;
		if std::mem::take(&mut self.dragging) {
			vec![Gesture::DragEnd]
		} else {
			Vec::new()
		}
	}

	/// Two-finger update. The first call only records the baseline.
	fn pinch(&mut self, a: Point, b: Point) -> Vec<Gesture> {
		let centroid = a.lerp(b, 0.5);
		let distance = a.distance(b);
		let gesture = self.pinch.map(|(last_centroid, last_distance)| Gesture::Transform {
			centroid,
			pan: centroid - last_centroid,
			zoom: if last_distance > 0.0 {
				distance / last_distance
			} else {
				1.0
			},
		});
		self.pinch = Some((centroid, distance));
		gesture.into_iter().collect()
	}
}

/// Editor plus everything the animation loop needs to paint it.
struct CanvasContext {
	editor: Editor,
	theme: Theme,
	ctx: CanvasRenderingContext2d,
	catalog: HashMap<String, NodeDefinition>,
	placeholders: HashMap<String, String>,
	pointer: PointerTracker,
	size: (f64, f64),
}

type SharedContext = Rc<RefCell<Option<CanvasContext>>>;

fn canvas_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	let inner = |v: Result<JsValue, JsValue>, fallback: f64| v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback);
	if fullscreen {
		return (
			inner(window.inner_width(), 800.0),
			inner(window.inner_height(), 600.0),
		);
	}
	(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> Option<Point> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		client_x as f64 - rect.left(),
		client_y as f64 - rect.top(),
	))
}

fn touch_points(ev: &TouchEvent, canvas_ref: NodeRef<leptos::html::Canvas>) -> Vec<Point> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.item(i))
		.filter_map(|t| local_point(canvas_ref, t.client_x(), t.client_y()))
		.collect()
}

/// Run gestures through the editor, then hand the resulting events to the host.
fn dispatch(
	context: &SharedContext,
	on_event: Option<Callback<EditorEvent>>,
	input: impl FnOnce(&mut PointerTracker) -> Vec<Gesture>,
) {
	let events: Vec<EditorEvent> = {
		let mut guard = context.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		let gestures = input(&mut c.pointer);
		if gestures.is_empty() {
			return;
		}
		c.editor.tick(now_seconds());
		gestures
			.into_iter()
			.flat_map(|g| c.editor.handle(g))
			.collect()
	};
	for event in events {
		debug!("editor event: {event:?}");
		if let Some(cb) = on_event {
			cb.run(event);
		}
	}
}

/// Renders an interactive workflow graph on a canvas element.
///
/// The `document` signal supplies the graph; later changes reload it in place
/// (surviving nodes animate to their new positions). The component sizes itself
/// to its parent container by default; set `fullscreen = true` to fill the
/// viewport and resize automatically with the window. Editor events (dialogs to
/// open, moves to persist, ...) are reported through `on_event`.
#[component]
pub fn WorkflowCanvas(
	#[prop(into)] document: Signal<WorkflowDocument>,
	#[prop(optional)] config: Option<EditorConfig>,
	#[prop(optional)] catalog: HashMap<String, NodeDefinition>,
	#[prop(optional)] placeholders: HashMap<String, String>,
	#[prop(optional, into)] execution: Option<Signal<ExecutionSnapshot>>,
	#[prop(optional)] on_event: Option<Callback<EditorEvent>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: SharedContext = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if context_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = canvas_size(&window, &canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("workflow-canvas: no 2d context");
			return;
		};

		let config = config.clone().unwrap_or_default();
		let metric = CanvasMetric::new(ctx.clone(), config.text.char_width_ratio);
		let mut editor =
			Editor::from_document(document.get_untracked(), config, &catalog).with_measure(Box::new(metric));
		editor.set_viewport_size(w, h);
		editor.tick(now_seconds());
		editor.apply_view_command(ViewCommand::FitToContent);

		*context_init.borrow_mut() = Some(CanvasContext {
			editor,
			theme: Theme::default(),
			ctx,
			catalog: catalog.clone(),
			placeholders: placeholders.clone(),
			pointer: PointerTracker::default(),
			size: (w, h),
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = canvas_size(&win, &canvas_resize, true, None, None);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.size = (nw, nh);
					c.editor.set_viewport_size(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.editor.tick(now_seconds());
				let execution = execution.map(|s| s.get_untracked()).unwrap_or_default();
				let frame = c.editor.render(
					&c.theme,
					RenderContext {
						catalog: &c.catalog,
						placeholders: &c.placeholders,
						execution: &execution,
					},
				);
				paint(&frame, &c.ctx, c.size.0, c.size.1);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(win) = web_sys::window() {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_reload = context.clone();
	Effect::new(move |previous: Option<()>| {
		let doc = document.get();
		if previous.is_none() {
			return;
		}
		let events = match context_reload.borrow_mut().as_mut() {
			Some(c) => c.editor.replace_document(doc, &c.catalog),
			None => return,
		};
		for event in events {
			if let Some(cb) = on_event {
				cb.run(event);
			}
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		dispatch(&context_md, on_event, |pointer| {
			pointer.press(p);
			Vec::new()
		});
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		dispatch(&context_mm, on_event, |pointer| pointer.motion(p));
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		dispatch(&context_mu, on_event, |pointer| pointer.release(p, now_seconds()));
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		dispatch(&context_ml, on_event, PointerTracker::cancel);
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(p) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		let zoom = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		dispatch(&context_wh, on_event, |_| {
			vec![Gesture::Transform {
				centroid: p,
				pan: Point::ZERO,
				zoom,
			}]
		});
	};

	let context_ts = context.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(&ev, canvas_ref);
		dispatch(&context_ts, on_event, |pointer| match points.as_slice() {
			[p] => {
				pointer.press(*p);
				Vec::new()
			}
			[a, b, ..] => {
				let mut gestures = pointer.cancel();
				gestures.extend(pointer.pinch(*a, *b));
				gestures
			}
			[] => Vec::new(),
		});
	};

	let context_tm = context.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let points = touch_points(&ev, canvas_ref);
		dispatch(&context_tm, on_event, |pointer| match points.as_slice() {
			[p] if pointer.pinch.is_none() => pointer.motion(*p),
			[a, b, ..] => pointer.pinch(*a, *b),
			_ => Vec::new(),
		});
	};

	let context_te = context.clone();
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		let remaining = ev.touches().length();
		let released = ev
			.changed_touches()
			.item(0)
			.and_then(|t| local_point(canvas_ref, t.client_x(), t.client_y()));
		dispatch(&context_te, on_event, |pointer| {
			if pointer.pinch.is_some() {
				if remaining < 2 {
					pointer.pinch = None;
				}
				return Vec::new();
			}
			match released {
				Some(p) => pointer.release(p, now_seconds()),
				None => pointer.cancel(),
			}
		});
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="workflow-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_press_is_a_tap_and_travel_is_a_drag() {
		let mut t = PointerTracker::default();
		t.press(Point::new(10.0, 10.0));
		assert!(t.motion(Point::new(12.0, 11.0)).is_empty());
		assert_eq!(t.release(Point::new(12.0, 11.0), 1.0), vec![Gesture::Tap(Point::new(12.0, 11.0))]);

		t.press(Point::new(10.0, 10.0));
		let g = t.motion(Point::new(40.0, 10.0));
		assert_eq!(g[0], Gesture::DragStart(Point::new(10.0, 10.0)));
		assert_eq!(t.release(Point::new(40.0, 10.0), 5.0), vec![Gesture::DragEnd]);
	}

	#[test]
	fn second_quick_tap_is_a_double_tap() {
		let mut t = PointerTracker::default();
		t.press(Point::ZERO);
		t.release(Point::ZERO, 1.0);
		t.press(Point::ZERO);
		assert_eq!(t.release(Point::ZERO, 1.2), vec![Gesture::DoubleTap(Point::ZERO)]);
	}

	#[test]
	fn pinch_reports_relative_zoom() {
		let mut t = PointerTracker::default();
		assert!(t.pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0)).is_empty());
		let g = t.pinch(Point::new(0.0, 0.0), Point::new(200.0, 0.0));
		assert_eq!(
			g,
			vec![Gesture::Transform {
				centroid: Point::new(100.0, 0.0),
				pan: Point::new(50.0, 0.0),
				zoom: 2.0,
			}]
		);
	}
}

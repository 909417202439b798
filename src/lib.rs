//! workflow-canvas: interactive node-graph canvas for media generation workflows.
//!
//! The core (layout, routing, render model, interaction state machine and
//! animation) is platform-independent. With the `web` feature the crate also
//! provides a WASM canvas component that paints the render model and feeds it
//! mouse, wheel and touch gestures.

pub mod components;

pub use components::workflow_graph::*;

#[cfg(feature = "web")]
mod app {
	use leptos::prelude::*;
	use leptos_meta::*;
	use log::{Level, info, warn};
	use wasm_bindgen::JsCast;
	use web_sys::{HtmlScriptElement, Window};

	use crate::components::workflow_graph::{EditorEvent, WorkflowCanvas, WorkflowDocument};

	/// Initialize logging and panic hooks for the WASM target.
	pub fn init_logging() {
		let _ = console_log::init_with_level(Level::Debug);
		console_error_panic_hook::set_once();
		info!("workflow-canvas: logging initialized");
	}

	/// Load the workflow from a script element with id="workflow-data".
	/// Expected format: JSON with { graph: { nodes, edges, groups, notes }, group_bounds }
	fn load_workflow_document() -> Option<WorkflowDocument> {
		let window: Window = web_sys::window()?;
		let document = window.document()?;
		let element = document.get_element_by_id("workflow-data")?;
		let script: HtmlScriptElement = element.dyn_into().ok()?;
		let json_text = script.text().ok()?;

		match serde_json::from_str::<WorkflowDocument>(&json_text) {
			Ok(doc) => {
				info!(
					"workflow-canvas: loaded {} nodes, {} edges, {} groups, {} notes",
					doc.graph.nodes.len(),
					doc.graph.edges.len(),
					doc.graph.groups.len(),
					doc.graph.notes.len()
				);
				Some(doc)
			}
			Err(e) => {
				warn!("workflow-canvas: failed to parse workflow data: {}", e);
				None
			}
		}
	}

	/// Main application component.
	/// Loads the workflow from the DOM and renders the editable canvas.
	#[component]
	pub fn App() -> impl IntoView {
		provide_meta_context();

		let workflow = load_workflow_document().unwrap_or_default();
		let document = Signal::derive(move || workflow.clone());
		let on_event = Callback::new(|event: EditorEvent| {
			info!("workflow-canvas: {event:?}");
		});

		view! {
			<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
			<Title text="Workflow Editor" />
			<Meta charset="UTF-8" />
			<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

			<div class="fullscreen-graph">
				<WorkflowCanvas document=document on_event=on_event fullscreen=true />
				<div class="graph-overlay">
					<h1>"Workflow"</h1>
					<p class="subtitle">"Tap an output to connect. Drag nodes to move. Pinch or scroll to zoom."</p>
				</div>
			</div>
		}
	}
}

#[cfg(feature = "web")]
pub use app::{App, init_logging};

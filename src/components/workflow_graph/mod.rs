//! Workflow graph canvas.
//!
//! Displays and edits a node-graph workflow on a zoomable, pannable canvas:
//! - Layout of nodes, notes and groups from the graph model
//! - Wire routing, including backward loops
//! - A retained render model (layered draw commands) painted onto a 2D canvas
//! - A single-writer interaction state machine (connect, select, map, drag)
//! - Eased transitions for node moves and view controls
//!
//! Everything except `component` and `paint` is plain Rust and runs headless,
//! which is how the tests drive it.
//!
//! # Example
//!
//! ```ignore
//! use workflow_canvas::{WorkflowCanvas, WorkflowDocument};
//!
//! let doc: WorkflowDocument = serde_json::from_str(json)?;
//! view! { <WorkflowCanvas document=Signal::derive(move || doc.clone()) fullscreen=true /> }
//! ```

pub mod animation;
pub mod catalog;
#[cfg(feature = "web")]
mod component;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hit;
pub mod layout;
pub mod mapping;
#[cfg(feature = "web")]
mod paint;
pub mod render;
pub mod routing;
pub mod scale;
pub mod state;
pub mod text;
pub mod theme;
pub mod types;

pub use catalog::{InputDefinition, NodeCatalog, NodeDefinition};
#[cfg(feature = "web")]
pub use component::WorkflowCanvas;
pub use error::{ConfigError, ConnectError};
pub use geometry::{Point, Rect, ViewTransform};
pub use hit::{HitPolicy, HitTarget};
pub use layout::GraphLayout;
pub use mapping::{FieldAssignment, FieldCandidate, FieldMapping};
pub use render::{ExecutionSnapshot, Frame, RenderContext};
pub use scale::EditorConfig;
pub use state::{Editor, EditorEvent, EditorState, Gesture, Mode, ModeKind, ViewCommand};
pub use theme::Theme;
pub use types::{Edge, EdgeId, Graph, Group, GroupId, Node, NodeId, Note, NoteId, WorkflowDocument};

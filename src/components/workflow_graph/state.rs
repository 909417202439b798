//! Interaction state machine and editor root.
//!
//! [`Editor`] owns the graph and is its only writer. Gestures come in already
//! recognised by the platform (tap, double tap, pinch/pan transform, drag), get
//! hit-tested against the displayed layout and turn into model mutations plus a
//! list of [`EditorEvent`]s for the host (open a dialog, persist a move, ...).
//!
//! Modes:
//!
//! - `Normal`: taps open the attribute editor, output slots start connections.
//! - `FieldMapping`: taps assign the tapped node to the active template field.
//! - `ConnectionDrawing`: a source output is armed; tapping an input commits the
//!   edge, anything else cancels. Returns to the mode it was entered from.
//! - `EditSelect`: taps toggle selection, header icons rename, bypass or delete.
//!
//! Transient state belonging to a mode (the armed source slot, the edit
//! selection, the mapping being edited) is cleared in the same call that leaves
//! the mode.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::animation::{PositionAnimator, ViewportAnimator, ViewportChange};
use super::catalog::NodeCatalog;
use super::error::ConnectError;
use super::geometry::{Point, ViewTransform};
use super::hit::{HitPolicy, HitTarget, hit_edge, hit_test};
use super::layout::{GraphLayout, HeaderIcon, ModelPositions};
use super::mapping::{FieldAssignment, FieldCandidate, FieldMapping, MappingState};
use super::render::{Frame, FrameInput, RenderContext, build_frame};
use super::scale::{EditorConfig, ScaledValues};
use super::text::{MonospaceMetric, TextMeasure};
use super::theme::Theme;
use super::types::{EdgeId, Graph, GroupId, NodeId, NoteId, Primitive, WorkflowDocument};

/// An output slot: node plus output index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSlotRef {
	pub node: NodeId,
	pub index: usize,
}

/// Interaction mode. The connection source only exists while drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Mode {
	#[default]
	Normal,
	FieldMapping,
	ConnectionDrawing {
		source: OutputSlotRef,
		/// Mode to return to once the connection is committed or cancelled.
		prior: Box<Mode>,
	},
	EditSelect,
}

/// Mode without its payload, for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeKind {
	Normal,
	FieldMapping,
	ConnectionDrawing,
	EditSelect,
}

impl Mode {
	pub fn kind(&self) -> ModeKind {
		match self {
			Mode::Normal => ModeKind::Normal,
			Mode::FieldMapping => ModeKind::FieldMapping,
			Mode::ConnectionDrawing { .. } => ModeKind::ConnectionDrawing,
			Mode::EditSelect => ModeKind::EditSelect,
		}
	}

	pub fn connection_source(&self) -> Option<&OutputSlotRef> {
		match self {
			Mode::ConnectionDrawing { source, .. } => Some(source),
			_ => None,
		}
	}

	fn hit_policy(&self) -> HitPolicy {
		match self {
			Mode::Normal => HitPolicy::Normal,
			Mode::FieldMapping => HitPolicy::FieldMapping,
			Mode::ConnectionDrawing { .. } => HitPolicy::Connection,
			Mode::EditSelect => HitPolicy::EditSelect,
		}
	}
}

/// A recognised platform gesture. Points are in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
	Tap(Point),
	DoubleTap(Point),
	/// Combined pinch and pan: `zoom` is the scale factor since the last event.
	Transform { centroid: Point, pan: Point, zoom: f64 },
	DragStart(Point),
	DragMove(Point),
	DragEnd,
}

/// Explicit viewport controls (buttons, menu entries). These animate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewCommand {
	ZoomIn,
	ZoomOut,
	FitToContent,
	Reset,
}

/// What the host should know or do after a state change.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
	ModeChanged(ModeKind),
	OpenAttributeEditor(NodeId),
	CloseAttributeEditor(NodeId),
	RenameNode(NodeId),
	RenameGroup(GroupId),
	EditNote(NoteId),
	ConnectionStarted(OutputSlotRef),
	ConnectionCancelled,
	EdgeCreated {
		edge: EdgeId,
		/// Edge that previously fed the same input.
		replaced: Option<EdgeId>,
	},
	ConnectionRejected(ConnectError),
	SelectionChanged {
		nodes: Vec<NodeId>,
		notes: Vec<NoteId>,
	},
	FieldCandidateAssigned {
		field: String,
		candidate: FieldCandidate,
	},
	MappingConfirmed(Vec<FieldAssignment>),
	NodeDeleted {
		node: NodeId,
		removed_edges: usize,
	},
	NoteDeleted(NoteId),
	EdgeDeleted(EdgeId),
	BypassToggled {
		node: NodeId,
		bypass: bool,
	},
	NodeMoved {
		node: NodeId,
		position: Point,
	},
	NoteMoved {
		note: NoteId,
		position: Point,
	},
	ViewportChanged(ViewTransform),
}

#[derive(Clone, Debug, PartialEq)]
enum DragTarget {
	/// Nodes, notes and group anchors with their positions at drag start.
	Items {
		nodes: Vec<(NodeId, Point)>,
		notes: Vec<(NoteId, Point)>,
		groups: Vec<(GroupId, Point)>,
	},
	Pan {
		origin: Point,
	},
}

/// An in-progress drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
	start: Point,
	/// Displayed zoom when the drag began; pointer deltas are divided by it.
	scale: f64,
	target: DragTarget,
	moved: bool,
}

/// Everything about the interaction that is not the graph itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorState {
	pub mode: Mode,
	/// Selection made in `EditSelect`. Kept while a connection started there is
	/// being drawn, cleared on any other mode change.
	pub selected_nodes: BTreeSet<NodeId>,
	pub selected_notes: BTreeSet<NoteId>,
	pub mapping: MappingState,
	/// Node open in the attribute editor.
	pub editing: Option<NodeId>,
	/// Authoritative view transform (what animations converge to).
	pub transform: ViewTransform,
	drag: Option<DragState>,
}

impl EditorState {
	pub fn is_dragging(&self) -> bool {
		self.drag.is_some()
	}

	/// Nodes currently being dragged.
	pub fn dragged_nodes(&self) -> impl Iterator<Item = &NodeId> {
		self.drag
			.iter()
			.flat_map(|d| match &d.target {
				DragTarget::Items { nodes, .. } => nodes.as_slice(),
				DragTarget::Pan { .. } => &[][..],
			})
			.map(|(id, _)| id)
	}

	fn selection_event(&self) -> EditorEvent {
		EditorEvent::SelectionChanged {
			nodes: self.selected_nodes.iter().cloned().collect(),
			notes: self.selected_notes.iter().cloned().collect(),
		}
	}
}

/// The canvas editor: graph, interaction state and view-layer animation.
pub struct Editor {
	graph: Graph,
	state: EditorState,
	config: EditorConfig,
	measure: Box<dyn TextMeasure>,
	positions: PositionAnimator,
	viewport: ViewportAnimator,
	viewport_size: (f64, f64),
	now: f64,
}

impl Editor {
	pub fn new(graph: Graph, config: EditorConfig) -> Self {
		let mut positions = PositionAnimator::new(config.animation.node_move_duration);
		positions.snap_all(&graph, 0.0);
		let viewport = ViewportAnimator::new(ViewTransform::default(), config.animation.viewport_duration);
		let measure = Box::new(MonospaceMetric {
			char_width_ratio: config.text.char_width_ratio,
		});
		info!(
			"editor: {} nodes, {} edges, {} groups, {} notes",
			graph.nodes.len(),
			graph.edges.len(),
			graph.groups.len(),
			graph.notes.len()
		);
		Self {
			graph,
			state: EditorState::default(),
			config,
			measure,
			positions,
			viewport,
			viewport_size: (0.0, 0.0),
			now: 0.0,
		}
	}

	/// Build from a loaded document. Literals are typed against `catalog` and group
	/// membership is derived from the persisted group rectangles.
	pub fn from_document(document: WorkflowDocument, config: EditorConfig, catalog: &dyn NodeCatalog) -> Self {
		let measure = MonospaceMetric {
			char_width_ratio: config.text.char_width_ratio,
		};
		let graph = document_graph(document, &config, &measure, catalog);
		Self::new(graph, config)
	}

	/// Replace the text metric (the web shell measures with the canvas).
	pub fn with_measure(mut self, measure: Box<dyn TextMeasure>) -> Self {
		self.measure = measure;
		self
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn state(&self) -> &EditorState {
		&self.state
	}

	pub fn mode(&self) -> ModeKind {
		self.state.mode.kind()
	}

	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	pub fn measure(&self) -> &dyn TextMeasure {
		self.measure.as_ref()
	}

	pub fn now(&self) -> f64 {
		self.now
	}

	/// Displayed transform, which lags the authoritative one while animating.
	pub fn transform(&self) -> ViewTransform {
		self.viewport.current(self.now)
	}

	pub fn set_viewport_size(&mut self, width: f64, height: f64) {
		self.viewport_size = (width, height);
	}

	pub fn viewport_size(&self) -> (f64, f64) {
		self.viewport_size
	}

	/// Advance the clock (seconds) and reconcile animations with the model.
	pub fn tick(&mut self, now: f64) {
		if now.is_finite() {
			self.now = now;
		}
		self.positions.sync(&self.graph, self.now);
	}

	pub fn is_animating(&self) -> bool {
		self.positions.is_animating() || self.viewport.is_animating(self.now)
	}

	/// Layout at displayed positions; this is what hit tests and rendering see.
	pub fn layout(&self) -> GraphLayout {
		GraphLayout::compute(&self.graph, &self.config.layout, self.measure.as_ref(), &self.positions)
	}

	/// Layout at model positions.
	pub fn model_layout(&self) -> GraphLayout {
		GraphLayout::compute(&self.graph, &self.config.layout, self.measure.as_ref(), &ModelPositions)
	}

	/// Build the frame to paint.
	pub fn render(&self, theme: &Theme, context: RenderContext<'_>) -> Frame {
		let layout = self.layout();
		build_frame(&FrameInput {
			graph: &self.graph,
			layout: &layout,
			state: &self.state,
			transform: self.transform(),
			config: &self.config,
			theme,
			measure: self.measure.as_ref(),
			context,
		})
	}

	/// Target under a screen point for the current mode.
	pub fn hit(&self, screen: Point) -> HitTarget {
		self.hit_with(screen, self.state.mode.hit_policy())
	}

	fn hit_with(&self, screen: Point, policy: HitPolicy) -> HitTarget {
		let transform = self.transform();
		let scaled = ScaledValues::new(&self.config, transform.scale);
		hit_test(
			&self.layout(),
			transform.screen_to_graph(screen),
			policy,
			scaled.slot_hit_radius,
		)
	}

	/// Wire under a screen point, if any.
	pub fn edge_at(&self, screen: Point) -> Option<EdgeId> {
		let transform = self.transform();
		hit_edge(
			&self.graph,
			&self.layout(),
			transform.screen_to_graph(screen),
			self.config.interaction.wire_hit_tolerance / transform.scale,
			&self.config.routing,
		)
	}

	/// Feed one gesture through the state machine.
	pub fn handle(&mut self, gesture: Gesture) -> Vec<EditorEvent> {
		let events = match gesture {
			Gesture::Tap(p) => self.tap(p),
			Gesture::DoubleTap(p) => self.double_tap(p),
			Gesture::Transform {
				centroid,
				pan,
				zoom,
			} => self.transform_gesture(centroid, pan, zoom),
			Gesture::DragStart(p) => self.drag_start(p),
			Gesture::DragMove(p) => self.drag_move(p),
			Gesture::DragEnd => self.drag_end(),
		};
		self.positions.sync(&self.graph, self.now);
		events
	}

	fn set_mode(&mut self, mode: Mode) -> EditorEvent {
		debug!("mode {:?} -> {:?}", self.state.mode.kind(), mode.kind());
		self.state.mode = mode;
		EditorEvent::ModeChanged(self.state.mode.kind())
	}

	fn tap(&mut self, p: Point) -> Vec<EditorEvent> {
		let target = self.hit(p);
		match self.state.mode.kind() {
			ModeKind::Normal => self.tap_normal(target),
			ModeKind::FieldMapping => self.tap_mapping(target),
			ModeKind::ConnectionDrawing => self.tap_connecting(target),
			ModeKind::EditSelect => self.tap_edit_select(target),
		}
	}

	fn tap_normal(&mut self, target: HitTarget) -> Vec<EditorEvent> {
		match target {
			HitTarget::OutputSlot { node, index } => self.start_connection(OutputSlotRef { node, index }),
			HitTarget::NodeHeader(id) | HitTarget::NodeBody(id) => self.open_editor(id),
			HitTarget::Note(id) => vec![EditorEvent::EditNote(id)],
			_ => self.close_editor().into_iter().collect(),
		}
	}

	fn tap_mapping(&mut self, target: HitTarget) -> Vec<EditorEvent> {
		let (HitTarget::NodeHeader(id) | HitTarget::NodeBody(id)) = target else {
			return Vec::new();
		};
		self.state
			.mapping
			.assign(&id, &self.graph)
			.map(|(field, candidate)| {
				debug!("field '{field}' -> node {}", candidate.node_id);
				EditorEvent::FieldCandidateAssigned { field, candidate }
			})
			.into_iter()
			.collect()
	}

	fn tap_connecting(&mut self, target: HitTarget) -> Vec<EditorEvent> {
		let Some(source) = self.state.mode.connection_source().cloned() else {
			return Vec::new();
		};
		match target {
			HitTarget::InputSlot { node, input } => {
				let replaced = self.graph.edge_into(&node, &input).map(|e| e.id);
				match self.graph.connect(&source.node, source.index, &node, &input) {
					Ok(edge) => {
						debug!("edge {edge}: {}[{}] -> {node}.{input}", source.node, source.index);
						let mut events = vec![EditorEvent::EdgeCreated { edge, replaced }];
						events.extend(self.leave_connection());
						events
					}
					Err(err) => {
						warn!("connection rejected: {err}");
						vec![EditorEvent::ConnectionRejected(err)]
					}
				}
			}
			HitTarget::OutputSlot { node, index } if node != source.node || index != source.index => {
				let next = OutputSlotRef { node, index };
				if let Mode::ConnectionDrawing { source, .. } = &mut self.state.mode {
					*source = next.clone();
				}
				vec![EditorEvent::ConnectionStarted(next)]
			}
			_ => self.cancel_connection(),
		}
	}

	fn tap_edit_select(&mut self, target: HitTarget) -> Vec<EditorEvent> {
		match target {
			HitTarget::OutputSlot { node, index } => self.start_connection(OutputSlotRef { node, index }),
			HitTarget::HeaderIcon { node, icon } => match icon {
				HeaderIcon::Rename => vec![EditorEvent::RenameNode(node)],
				HeaderIcon::Bypass => self.toggle_bypass(&node),
				HeaderIcon::Delete => self.delete_node(&node),
			},
			HitTarget::NodeHeader(id) | HitTarget::NodeBody(id) => {
				if !self.state.selected_nodes.remove(&id) {
					self.state.selected_nodes.insert(id);
				}
				vec![self.state.selection_event()]
			}
			HitTarget::Note(id) => {
				if !self.state.selected_notes.remove(&id) {
					self.state.selected_notes.insert(id);
				}
				vec![self.state.selection_event()]
			}
			_ => Vec::new(),
		}
	}

	fn double_tap(&mut self, p: Point) -> Vec<EditorEvent> {
		if self.state.mode.kind() == ModeKind::ConnectionDrawing {
			return self.tap(p);
		}
		match self.hit_with(p, HitPolicy::FieldMapping) {
			HitTarget::NodeHeader(id) => vec![EditorEvent::RenameNode(id)],
			HitTarget::GroupHeader(id) => vec![EditorEvent::RenameGroup(id)],
			HitTarget::Note(id) => vec![EditorEvent::EditNote(id)],
			HitTarget::Empty => self.apply_view_command(ViewCommand::FitToContent),
			_ => self.tap(p),
		}
	}

	fn open_editor(&mut self, id: NodeId) -> Vec<EditorEvent> {
		if self.state.editing.as_ref() == Some(&id) {
			return Vec::new();
		}
		let mut events: Vec<EditorEvent> = self.close_editor().into_iter().collect();
		self.state.editing = Some(id.clone());
		events.push(EditorEvent::OpenAttributeEditor(id));
		events
	}

	fn close_editor(&mut self) -> Option<EditorEvent> {
		self.state.editing.take().map(EditorEvent::CloseAttributeEditor)
	}

	fn start_connection(&mut self, source: OutputSlotRef) -> Vec<EditorEvent> {
		let prior = Box::new(self.state.mode.clone());
		let changed = self.set_mode(Mode::ConnectionDrawing {
			source: source.clone(),
			prior,
		});
		vec![EditorEvent::ConnectionStarted(source), changed]
	}

	/// Return from connection drawing to the mode it was entered from.
	fn leave_connection(&mut self) -> Vec<EditorEvent> {
		let prior = match &self.state.mode {
			Mode::ConnectionDrawing { prior, .. } => (**prior).clone(),
			_ => return Vec::new(),
		};
		vec![self.set_mode(prior)]
	}

	/// Drop the armed source without touching the graph.
	pub fn cancel_connection(&mut self) -> Vec<EditorEvent> {
		if self.state.mode.kind() != ModeKind::ConnectionDrawing {
			return Vec::new();
		}
		let mut events = vec![EditorEvent::ConnectionCancelled];
		events.extend(self.leave_connection());
		events
	}

	/// Leave the current mode for `Normal`, clearing every piece of transient
	/// state.
	fn leave_mode(&mut self) -> Vec<EditorEvent> {
		let mut events = Vec::new();
		if self.state.mode.kind() == ModeKind::ConnectionDrawing {
			events.push(EditorEvent::ConnectionCancelled);
		}
		if !self.state.selected_nodes.is_empty() || !self.state.selected_notes.is_empty() {
			self.state.selected_nodes.clear();
			self.state.selected_notes.clear();
			events.push(self.state.selection_event());
		}
		if self.state.mode.kind() == ModeKind::FieldMapping {
			self.state.mapping = MappingState::default();
		}
		events.extend(self.close_editor());
		self.state.drag = None;
		if self.state.mode != Mode::Normal {
			events.push(self.set_mode(Mode::Normal));
		}
		events
	}

	/// Back to `Normal` from anywhere. Calling it again changes nothing.
	pub fn exit_to_normal(&mut self) -> Vec<EditorEvent> {
		self.leave_mode()
	}

	pub fn enter_edit_select(&mut self) -> Vec<EditorEvent> {
		if self.state.mode == Mode::EditSelect {
			return Vec::new();
		}
		let mut events = self.leave_mode();
		events.push(self.set_mode(Mode::EditSelect));
		events
	}

	/// Start mapping template fields onto nodes. The first field is active.
	pub fn enter_field_mapping(&mut self, fields: Vec<FieldMapping>) -> Vec<EditorEvent> {
		let mut events = self.leave_mode();
		self.state.mapping = MappingState::new(fields);
		events.push(self.set_mode(Mode::FieldMapping));
		events
	}

	pub fn activate_field(&mut self, key: &str) -> bool {
		self.state.mode == Mode::FieldMapping && self.state.mapping.activate(key)
	}

	/// Finish mapping and hand the choices back to the host.
	pub fn confirm_mapping(&mut self) -> Vec<EditorEvent> {
		if self.state.mode != Mode::FieldMapping {
			return Vec::new();
		}
		let assignments = self.state.mapping.confirm();
		info!("mapping confirmed: {} field(s)", assignments.len());
		let mut events = vec![EditorEvent::MappingConfirmed(assignments)];
		events.extend(self.leave_mode());
		events
	}

	fn transform_gesture(&mut self, centroid: Point, pan: Point, zoom: f64) -> Vec<EditorEvent> {
		let limits = &self.config.interaction;
		let mut t = self.transform();
		t.pan_by(pan);
		t.zoom_about(centroid, zoom, limits.min_zoom, limits.max_zoom);
		self.set_transform(t, ViewportChange::Gesture)
	}

	fn set_transform(&mut self, t: ViewTransform, change: ViewportChange) -> Vec<EditorEvent> {
		if !t.offset.is_finite() || !t.scale.is_finite() || t.scale <= 0.0 {
			return Vec::new();
		}
		self.state.transform = t;
		self.viewport.apply(t, change, self.now);
		vec![EditorEvent::ViewportChanged(t)]
	}

	/// Zoom buttons, fit and reset. These animate.
	pub fn apply_view_command(&mut self, command: ViewCommand) -> Vec<EditorEvent> {
		let limits = &self.config.interaction;
		let (width, height) = self.viewport_size;
		let center = Point::new(width / 2.0, height / 2.0);
		let target = match command {
			ViewCommand::ZoomIn | ViewCommand::ZoomOut => {
				let factor = match command {
					ViewCommand::ZoomIn => limits.zoom_step,
					_ => 1.0 / limits.zoom_step,
				};
				let mut t = self.state.transform;
				t.zoom_about(center, factor, limits.min_zoom, limits.max_zoom);
				t
			}
			ViewCommand::FitToContent => match self.model_layout().content_bounds() {
				Some(bounds) => ViewTransform::fit_rect(
					&bounds,
					width,
					height,
					limits.fit_padding,
					limits.min_zoom,
					limits.max_zoom,
				),
				None => ViewTransform::default(),
			},
			ViewCommand::Reset => ViewTransform::default(),
		};
		debug!("view command {command:?} -> scale {:.3}", target.scale);
		self.set_transform(target, ViewportChange::Control)
	}

	fn drag_start(&mut self, p: Point) -> Vec<EditorEvent> {
		let target = if self.state.mode.kind() == ModeKind::ConnectionDrawing {
			DragTarget::Pan {
				origin: self.transform().offset,
			}
		} else {
			self.drag_target(self.hit_with(p, HitPolicy::FieldMapping))
		};
		self.state.drag = Some(DragState {
			start: p,
			scale: self.transform().scale,
			target,
			moved: false,
		});
		Vec::new()
	}

	fn drag_target(&self, hit: HitTarget) -> DragTarget {
		let edit_select = self.state.mode == Mode::EditSelect;
		let selection = || -> (Vec<NodeId>, Vec<NoteId>, Vec<GroupId>) {
			(
				self.state.selected_nodes.iter().cloned().collect(),
				self.state.selected_notes.iter().cloned().collect(),
				Vec::new(),
			)
		};
		let (nodes, notes, groups): (Vec<NodeId>, Vec<NoteId>, Vec<GroupId>) = match hit {
			HitTarget::NodeHeader(id) | HitTarget::NodeBody(id) => {
				if edit_select && self.state.selected_nodes.contains(&id) {
					selection()
				} else {
					(vec![id], Vec::new(), Vec::new())
				}
			}
			HitTarget::Note(id) => {
				if edit_select && self.state.selected_notes.contains(&id) {
					selection()
				} else {
					(Vec::new(), vec![id], Vec::new())
				}
			}
			HitTarget::GroupHeader(id) => match self.graph.group(&id) {
				Some(group) => (group.nodes.clone(), group.notes.clone(), vec![id]),
				None => (Vec::new(), Vec::new(), Vec::new()),
			},
			_ => {
				return DragTarget::Pan {
					origin: self.transform().offset,
				};
			}
		};
		DragTarget::Items {
			nodes: nodes
				.into_iter()
				.filter_map(|id| {
					let at = self.positions.position_of(&id).or_else(|| self.graph.node(&id).map(|n| n.position))?;
					Some((id, at))
				})
				.collect(),
			notes: notes
				.into_iter()
				.filter_map(|id| self.graph.note(&id).map(|n| (id, n.position)))
				.collect(),
			groups: groups
				.into_iter()
				.filter_map(|id| self.graph.group(&id).map(|g| (id, g.origin)))
				.collect(),
		}
	}

	fn drag_move(&mut self, p: Point) -> Vec<EditorEvent> {
		let Some(mut drag) = self.state.drag.take() else {
			return Vec::new();
		};
		drag.moved = true;
		let delta = p - drag.start;
		let events = match &drag.target {
			DragTarget::Pan { origin } => {
				let mut t = self.transform();
				t.offset = *origin + delta;
				self.set_transform(t, ViewportChange::Gesture)
			}
			DragTarget::Items {
				nodes,
				notes,
				groups,
			} => {
				let delta = delta * (1.0 / drag.scale);
				for (id, origin) in nodes {
					let at = *origin + delta;
					if self.graph.move_node(id, at) {
						self.positions.snap_node(id, at);
					}
				}
				for (id, origin) in notes {
					self.graph.move_note(id, *origin + delta);
				}
				for (id, origin) in groups {
					if let Some(group) = self.graph.group_mut(id) {
						group.origin = *origin + delta;
					}
				}
				Vec::new()
			}
		};
		self.state.drag = Some(drag);
		events
	}

	fn drag_end(&mut self) -> Vec<EditorEvent> {
		let Some(drag) = self.state.drag.take() else {
			return Vec::new();
		};
		let DragTarget::Items { nodes, notes, .. } = drag.target else {
			return Vec::new();
		};
		if !drag.moved {
			return Vec::new();
		}
		let moved_nodes = nodes.into_iter().filter_map(|(id, _)| {
			let position = self.graph.node(&id)?.position;
			Some(EditorEvent::NodeMoved { node: id, position })
		});
		let moved_notes = notes.into_iter().filter_map(|(id, _)| {
			let position = self.graph.note(&id)?.position;
			Some(EditorEvent::NoteMoved { note: id, position })
		});
		moved_nodes.chain(moved_notes).collect()
	}

	/// Drop every reference to nodes and notes that no longer exist.
	fn repair_references(&mut self) -> Vec<EditorEvent> {
		let mut events = Vec::new();
		let graph = &self.graph;

		let before = (self.state.selected_nodes.len(), self.state.selected_notes.len());
		self.state.selected_nodes.retain(|id| graph.node(id).is_some());
		self.state.selected_notes.retain(|id| graph.note(id).is_some());
		if before != (self.state.selected_nodes.len(), self.state.selected_notes.len()) {
			events.push(self.state.selection_event());
		}

		if self
			.state
			.editing
			.as_ref()
			.is_some_and(|id| graph.node(id).is_none())
		{
			events.extend(self.state.editing.take().map(EditorEvent::CloseAttributeEditor));
		}

		let stale: BTreeSet<NodeId> = self
			.state
			.mapping
			.fields
			.iter()
			.flat_map(|f| f.candidates.iter())
			.filter(|c| graph.node(&c.node_id).is_none())
			.map(|c| c.node_id.clone())
			.collect();
		for id in &stale {
			self.state.mapping.prune_node(id);
		}

		if let Some(drag) = self.state.drag.as_mut() {
			if let DragTarget::Items { nodes, notes, .. } = &mut drag.target {
				nodes.retain(|(id, _)| graph.node(id).is_some());
				notes.retain(|(id, _)| graph.note(id).is_some());
			}
		}

		let source_gone = self
			.state
			.mode
			.connection_source()
			.is_some_and(|s| graph.node(&s.node).is_none());
		if source_gone {
			events.extend(self.cancel_connection());
		}
		events
	}

	/// Delete a node with its edges, and every reference the interaction state
	/// held to it.
	pub fn delete_node(&mut self, id: &NodeId) -> Vec<EditorEvent> {
		let removed_edges = self
			.graph
			.edges
			.iter()
			.filter(|e| &e.source == id || &e.target == id)
			.count();
		if self.graph.remove_node(id).is_none() {
			return Vec::new();
		}
		let mut events = vec![EditorEvent::NodeDeleted {
			node: id.clone(),
			removed_edges,
		}];
		events.extend(self.repair_references());
		self.positions.sync(&self.graph, self.now);
		events
	}

	pub fn delete_note(&mut self, id: &NoteId) -> Vec<EditorEvent> {
		if self.graph.remove_note(id).is_none() {
			return Vec::new();
		}
		let mut events = vec![EditorEvent::NoteDeleted(id.clone())];
		events.extend(self.repair_references());
		events
	}

	/// Delete everything selected in `EditSelect`.
	pub fn delete_selected(&mut self) -> Vec<EditorEvent> {
		let nodes: Vec<NodeId> = self.state.selected_nodes.iter().cloned().collect();
		let notes: Vec<NoteId> = self.state.selected_notes.iter().cloned().collect();
		let mut events = Vec::new();
		for id in &nodes {
			events.extend(self.delete_node(id));
		}
		for id in &notes {
			events.extend(self.delete_note(id));
		}
		events
	}

	pub fn delete_edge(&mut self, id: EdgeId) -> Vec<EditorEvent> {
		match self.graph.remove_edge(id) {
			Some(edge) => {
				debug!("removed edge {id} into {}.{}", edge.target, edge.target_input);
				vec![EditorEvent::EdgeDeleted(id)]
			}
			None => Vec::new(),
		}
	}

	pub fn toggle_bypass(&mut self, id: &NodeId) -> Vec<EditorEvent> {
		match self.graph.toggle_bypass(id) {
			Some(bypass) => vec![EditorEvent::BypassToggled {
				node: id.clone(),
				bypass,
			}],
			None => Vec::new(),
		}
	}

	/// Connect programmatically, with the same validation as a tap.
	pub fn connect(
		&mut self,
		source: &NodeId,
		output_index: usize,
		target: &NodeId,
		input: &str,
	) -> Result<EdgeId, ConnectError> {
		self.graph.connect(source, output_index, target, input)
	}

	/// Add a node of a catalog type. Returns `false` for unknown types.
	pub fn add_node_from_definition(
		&mut self,
		catalog: &dyn NodeCatalog,
		id: impl Into<NodeId>,
		class_type: &str,
		position: Point,
	) -> bool {
		let added = self
			.graph
			.add_node_from_definition(catalog, id, class_type, position);
		self.positions.sync(&self.graph, self.now);
		added
	}

	pub fn rename_node(&mut self, id: &NodeId, title: impl Into<String>) -> bool {
		self.graph.rename_node(id, title)
	}

	pub fn rename_group(&mut self, id: &GroupId, title: impl Into<String>) -> bool {
		self.graph.rename_group(id, title)
	}

	pub fn edit_note(&mut self, id: &NoteId, title: impl Into<String>, content: impl Into<String>) -> bool {
		self.graph.edit_note(id, title, content)
	}

	/// Write a value from the attribute editor.
	pub fn set_literal(&mut self, id: &NodeId, input: &str, value: Primitive) -> bool {
		self.graph.set_literal(id, input, value)
	}

	/// Move a node to an externally decided position; the view animates there.
	pub fn move_node(&mut self, id: &NodeId, position: Point) -> bool {
		let moved = self.graph.move_node(id, position);
		self.positions.sync(&self.graph, self.now);
		moved
	}

	/// Reload from a host document, re-typing literals and re-deriving group
	/// membership.
	pub fn replace_document(&mut self, document: WorkflowDocument, catalog: &dyn NodeCatalog) -> Vec<EditorEvent> {
		let graph = document_graph(document, &self.config, self.measure.as_ref(), catalog);
		self.replace_graph(graph)
	}

	/// Swap in a reloaded graph. Nodes that survive animate to their new
	/// positions, new nodes appear in place, and stale references are dropped.
	pub fn replace_graph(&mut self, graph: Graph) -> Vec<EditorEvent> {
		info!("graph reloaded: {} nodes, {} edges", graph.nodes.len(), graph.edges.len());
		self.graph = graph;
		self.positions.sync(&self.graph, self.now);
		self.repair_references()
	}
}

/// The document's graph with typed literals and group membership derived from
/// its persisted bounds.
fn document_graph(
	document: WorkflowDocument,
	config: &EditorConfig,
	measure: &dyn TextMeasure,
	catalog: &dyn NodeCatalog,
) -> Graph {
	let WorkflowDocument {
		mut graph,
		group_bounds,
	} = document;
	graph.normalize_literals(catalog);
	if !group_bounds.is_empty() {
		let layout = GraphLayout::compute(&graph, &config.layout, measure, &ModelPositions);
		let (nodes, notes) = layout.member_rects();
		graph.assign_group_members(group_bounds.iter().map(|(id, r)| (id, *r)), &nodes, &notes);
	}
	graph
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::workflow_graph::types::{InputValue, Node};

	fn editor() -> Editor {
		let mut g = Graph::new();
		g.add_node(Node::new("a", "Loader", Point::new(0.0, 0.0)).with_output("IMAGE"));
		g.add_node(
			Node::new("b", "Save", Point::new(400.0, 0.0)).with_input("images", InputValue::slot("IMAGE")),
		);
		let mut e = Editor::new(g, EditorConfig::default());
		e.set_viewport_size(800.0, 600.0);
		e
	}

	fn body_of(e: &Editor, id: &str) -> Point {
		let layout = e.layout();
		let rect = layout.node(&id.into()).unwrap().rect;
		e.transform()
			.graph_to_screen(Point::new(rect.center().x, rect.bottom() - 4.0))
	}

	#[test]
	fn dragging_a_node_moves_model_and_display_together() {
		let mut e = editor();
		let start = body_of(&e, "a");
		e.handle(Gesture::DragStart(start));
		e.handle(Gesture::DragMove(start + Point::new(30.0, 40.0)));
		assert_eq!(e.graph().node(&"a".into()).unwrap().position, Point::new(30.0, 40.0));
		assert_eq!(e.layout().node(&"a".into()).unwrap().rect.origin(), Point::new(30.0, 40.0));
		assert_eq!(e.state().dragged_nodes().count(), 1);

		let events = e.handle(Gesture::DragEnd);
		assert_eq!(
			events,
			vec![EditorEvent::NodeMoved {
				node: "a".into(),
				position: Point::new(30.0, 40.0)
			}]
		);
		assert!(!e.state().is_dragging());
	}

	#[test]
	fn dragging_empty_canvas_pans() {
		let mut e = editor();
		let start = Point::new(700.0, 500.0);
		e.handle(Gesture::DragStart(start));
		e.handle(Gesture::DragMove(start + Point::new(-50.0, 20.0)));
		assert_eq!(e.transform().offset, Point::new(-50.0, 20.0));
		assert!(e.handle(Gesture::DragEnd).is_empty());
	}

	#[test]
	fn dragging_during_an_animated_zoom_tracks_the_finger() {
		let mut e = editor();
		e.tick(1.0);
		e.apply_view_command(ViewCommand::ZoomIn);
		e.tick(1.15);
		let shown = e.transform();
		assert!(shown.scale > 1.0 && shown.scale < e.state().transform.scale);

		let start = body_of(&e, "a");
		let before = e.graph().node(&"a".into()).unwrap().position;
		e.handle(Gesture::DragStart(start));
		e.handle(Gesture::DragMove(start + Point::new(30.0, 0.0)));
		let after = e.graph().node(&"a".into()).unwrap().position;
		assert!(((after.x - before.x) * shown.scale - 30.0).abs() < 1e-9);
		assert_eq!(after.y, before.y);
	}

	#[test]
	fn view_commands_animate_but_gestures_snap() {
		let mut e = editor();
		e.tick(1.0);
		e.apply_view_command(ViewCommand::ZoomIn);
		assert_eq!(e.state().transform.scale, 1.25);
		assert_eq!(e.transform().scale, 1.0);
		e.tick(2.0);
		assert_eq!(e.transform().scale, 1.25);

		e.handle(Gesture::Transform {
			centroid: Point::new(100.0, 100.0),
			pan: Point::ZERO,
			zoom: 100.0,
		});
		assert_eq!(e.transform().scale, 3.0);
	}
}

//! Interaction state machine: connecting, selecting, mapping, deleting and
//! reloading, driven through gestures the way the web shell drives it.
mod common;
use common::*;

use workflow_canvas::layout::HeaderIcon;
use workflow_canvas::state::OutputSlotRef;
use workflow_canvas::types::{InputValue, SlotType};
use workflow_canvas::{
	ConnectError, EdgeId, EditorEvent, FieldAssignment, FieldCandidate, FieldMapping, Gesture, Group,
	HitTarget, ModeKind, Node, Note, Point, ViewCommand,
};

fn tap(e: &mut workflow_canvas::Editor, p: Point) -> Vec<EditorEvent> {
	e.handle(Gesture::Tap(p))
}

fn slot(node: &str, index: usize) -> OutputSlotRef {
	OutputSlotRef {
		node: node.into(),
		index,
	}
}

mod connecting {
	use super::*;

	#[test]
	fn tap_output_then_input_creates_edge() {
		let mut e = editor();
		assert_eq!(
			tap(&mut e, LOAD_OUT),
			vec![
				EditorEvent::ConnectionStarted(slot("load", 0)),
				EditorEvent::ModeChanged(ModeKind::ConnectionDrawing),
			]
		);
		assert_eq!(
			tap(&mut e, SCALE_IN),
			vec![
				EditorEvent::EdgeCreated {
					edge: EdgeId(0),
					replaced: None
				},
				EditorEvent::ModeChanged(ModeKind::Normal),
			]
		);
		let edge = e.graph().edge(EdgeId(0)).unwrap();
		assert_eq!(edge.source, "load".into());
		assert_eq!(edge.target_input, "image");
		assert!(e.graph().node(&"scale".into()).unwrap().input("image").unwrap().value.is_connected());
		assert!(e.graph().is_consistent());
	}

	#[test]
	fn new_edge_replaces_the_previous_writer() {
		let mut e = editor();
		let first = e.connect(&"load".into(), 0, &"save".into(), "images").unwrap();
		tap(&mut e, SCALE_OUT);
		let events = tap(&mut e, SAVE_IN);
		assert_eq!(
			events[0],
			EditorEvent::EdgeCreated {
				edge: EdgeId(1),
				replaced: Some(first)
			}
		);
		let into_save: Vec<_> = e
			.graph()
			.edges
			.iter()
			.filter(|edge| edge.target == "save".into())
			.collect();
		assert_eq!(into_save.len(), 1);
		assert_eq!(into_save[0].source, "scale".into());
		assert!(e.graph().is_consistent());
	}

	#[test]
	fn type_mismatch_keeps_the_connection_armed() {
		let mut g = pipeline();
		g.add_node(Node::new("model", "LoadModel", Point::new(0.0, 300.0)).with_output("MODEL"));
		let mut e = editor_with(g);

		tap(&mut e, Point::new(180.0, 350.0));
		assert_eq!(
			tap(&mut e, SAVE_IN),
			vec![EditorEvent::ConnectionRejected(ConnectError::TypeMismatch {
				expected: SlotType::new("IMAGE"),
				found: SlotType::new("MODEL"),
			})]
		);
		assert_eq!(e.mode(), ModeKind::ConnectionDrawing);
		assert!(e.graph().edges.is_empty());

		assert_eq!(
			tap(&mut e, EMPTY),
			vec![
				EditorEvent::ConnectionCancelled,
				EditorEvent::ModeChanged(ModeKind::Normal),
			]
		);
		assert!(e.state().mode.connection_source().is_none());
	}

	#[test]
	fn tapping_another_output_moves_the_source() {
		let mut e = editor();
		tap(&mut e, LOAD_OUT);
		assert_eq!(tap(&mut e, SCALE_OUT), vec![EditorEvent::ConnectionStarted(slot("scale", 0))]);
		assert_eq!(e.state().mode.connection_source(), Some(&slot("scale", 0)));
	}

	#[test]
	fn cancel_is_idempotent() {
		let mut e = editor();
		tap(&mut e, LOAD_OUT);
		assert_eq!(
			e.cancel_connection(),
			vec![
				EditorEvent::ConnectionCancelled,
				EditorEvent::ModeChanged(ModeKind::Normal),
			]
		);
		assert!(e.cancel_connection().is_empty());
		assert!(e.exit_to_normal().is_empty());
		assert_eq!(e.mode(), ModeKind::Normal);
	}

	#[test]
	fn connection_returns_to_edit_select() {
		let mut e = editor();
		e.enter_edit_select();
		tap(&mut e, LOAD_OUT);
		let events = tap(&mut e, SCALE_IN);
		assert_eq!(events.last(), Some(&EditorEvent::ModeChanged(ModeKind::EditSelect)));
		assert_eq!(e.mode(), ModeKind::EditSelect);
	}

	#[test]
	fn deleting_the_source_cancels_the_connection() {
		let mut e = editor();
		tap(&mut e, LOAD_OUT);
		assert_eq!(
			e.delete_node(&"load".into()),
			vec![
				EditorEvent::NodeDeleted {
					node: "load".into(),
					removed_edges: 0
				},
				EditorEvent::ConnectionCancelled,
				EditorEvent::ModeChanged(ModeKind::Normal),
			]
		);
	}

	#[test]
	fn wire_under_pointer_can_be_deleted() {
		let mut e = editor();
		let id = e.connect(&"load".into(), 0, &"scale".into(), "image").unwrap();
		assert_eq!(e.edge_at(Point::new(290.0, 52.0)), Some(id));
		assert_eq!(e.edge_at(Point::new(290.0, 200.0)), None);
		assert_eq!(e.delete_edge(id), vec![EditorEvent::EdgeDeleted(id)]);
		assert_eq!(
			e.graph().node(&"scale".into()).unwrap().input("image").unwrap().value,
			InputValue::slot("IMAGE")
		);
		assert!(e.delete_edge(id).is_empty());
	}
}

mod hits {
	use super::*;

	#[test]
	fn output_slot_wins_over_body_only_where_the_mode_allows() {
		let mut e = editor();
		let near_output = Point::new(170.0, 55.0);
		assert_eq!(e.hit(near_output), HitTarget::OutputSlot {
			node: "load".into(),
			index: 0
		});

		e.enter_field_mapping(vec![FieldMapping::new("image", None)]);
		assert_eq!(e.hit(near_output), HitTarget::NodeBody("load".into()));
	}

	#[test]
	fn input_slots_only_count_while_connecting() {
		let mut e = editor();
		let near_input = Point::new(405.0, 52.0);
		assert_eq!(e.hit(near_input), HitTarget::NodeBody("scale".into()));

		tap(&mut e, LOAD_OUT);
		assert_eq!(e.hit(near_input), HitTarget::InputSlot {
			node: "scale".into(),
			input: "image".into()
		});
		// the literal row below is never a connection target
		assert_eq!(e.hit(Point::new(400.0, 74.0)), HitTarget::InputSlot {
			node: "scale".into(),
			input: "image".into()
		});
	}

	#[test]
	fn notes_sit_above_nodes_and_groups_below() {
		let mut g = pipeline();
		g.add_note(Note::new("memo", Point::new(20.0, 20.0), 100.0));
		let mut group = Group::new("g", "Inputs", Point::ZERO);
		group.nodes.push("load".into());
		g.add_group(group);
		let e = editor_with(g);

		assert_eq!(e.hit(Point::new(60.0, 40.0)), HitTarget::Note("memo".into()));
		assert_eq!(e.hit(Point::new(10.0, 10.0)), HitTarget::NodeHeader("load".into()));
		assert_eq!(e.hit(Point::new(50.0, -30.0)), HitTarget::GroupHeader("g".into()));
		assert_eq!(e.hit(EMPTY), HitTarget::Empty);
	}

	#[test]
	fn hits_follow_the_view_transform() {
		let mut e = editor();
		// pan first, then zoom about the pan target so the offset stays put
		e.handle(Gesture::Transform {
			centroid: Point::new(100.0, 100.0),
			pan: Point::new(100.0, 100.0),
			zoom: 2.0,
		});
		// graph (90, 60) is now at screen (100 + 180, 100 + 120)
		assert_eq!(e.hit(Point::new(280.0, 220.0)), HitTarget::NodeBody("load".into()));
		assert_eq!(e.hit(Point::new(90.0, 60.0)), HitTarget::Empty);
	}
}

mod edit_select {
	use super::*;

	const LOAD_BODY: Point = Point::new(90.0, 60.0);
	const BYPASS_ICON: Point = Point::new(138.0, 15.0);
	const RENAME_ICON: Point = Point::new(112.0, 15.0);
	const SAVE_DELETE_ICON: Point = Point::new(964.0, 15.0);

	#[test]
	fn taps_toggle_selection() {
		let mut e = editor();
		assert_eq!(e.enter_edit_select(), vec![EditorEvent::ModeChanged(ModeKind::EditSelect)]);
		assert!(e.enter_edit_select().is_empty());

		assert_eq!(
			tap(&mut e, LOAD_BODY),
			vec![EditorEvent::SelectionChanged {
				nodes: vec!["load".into()],
				notes: vec![]
			}]
		);
		assert_eq!(
			tap(&mut e, LOAD_BODY),
			vec![EditorEvent::SelectionChanged {
				nodes: vec![],
				notes: vec![]
			}]
		);
	}

	#[test]
	fn header_icons_act_only_in_edit_select() {
		let mut e = editor();
		assert_eq!(e.hit(BYPASS_ICON), HitTarget::NodeHeader("load".into()));
		assert_eq!(tap(&mut e, BYPASS_ICON), vec![EditorEvent::OpenAttributeEditor("load".into())]);

		e.enter_edit_select();
		assert_eq!(e.hit(BYPASS_ICON), HitTarget::HeaderIcon {
			node: "load".into(),
			icon: HeaderIcon::Bypass
		});
		assert_eq!(
			tap(&mut e, BYPASS_ICON),
			vec![EditorEvent::BypassToggled {
				node: "load".into(),
				bypass: true
			}]
		);
		assert!(e.graph().node(&"load".into()).unwrap().bypass);
		assert_eq!(tap(&mut e, RENAME_ICON), vec![EditorEvent::RenameNode("load".into())]);
		assert_eq!(
			tap(&mut e, SAVE_DELETE_ICON),
			vec![EditorEvent::NodeDeleted {
				node: "save".into(),
				removed_edges: 0
			}]
		);
		assert!(e.graph().node(&"save".into()).is_none());
	}

	#[test]
	fn leaving_clears_selection_once() {
		let mut g = pipeline();
		g.add_note(Note::new("memo", Point::new(0.0, 300.0), 160.0));
		let mut e = editor_with(g);
		e.enter_edit_select();
		tap(&mut e, LOAD_BODY);
		tap(&mut e, Point::new(50.0, 320.0));
		assert_eq!(e.state().selected_notes.len(), 1);

		assert_eq!(
			e.exit_to_normal(),
			vec![
				EditorEvent::SelectionChanged {
					nodes: vec![],
					notes: vec![]
				},
				EditorEvent::ModeChanged(ModeKind::Normal),
			]
		);
		assert!(e.exit_to_normal().is_empty());
		assert!(e.state().selected_nodes.is_empty());
	}

	#[test]
	fn delete_selected_removes_nodes_and_notes() {
		let mut g = pipeline();
		g.add_note(Note::new("memo", Point::new(0.0, 300.0), 160.0));
		let mut e = editor_with(g);
		e.connect(&"load".into(), 0, &"scale".into(), "image").unwrap();
		e.enter_edit_select();
		tap(&mut e, LOAD_BODY);
		tap(&mut e, Point::new(50.0, 320.0));

		let events = e.delete_selected();
		assert!(events.contains(&EditorEvent::NodeDeleted {
			node: "load".into(),
			removed_edges: 1
		}));
		assert!(events.contains(&EditorEvent::NoteDeleted("memo".into())));
		assert!(e.graph().notes.is_empty());
		assert!(e.graph().edges.is_empty());
		assert!(e.state().selected_nodes.is_empty());
		assert!(e.state().selected_notes.is_empty());
	}

	#[test]
	fn dragging_a_selected_node_moves_the_selection() {
		let mut e = editor();
		e.enter_edit_select();
		tap(&mut e, LOAD_BODY);
		tap(&mut e, Point::new(860.0, 60.0));

		e.handle(Gesture::DragStart(LOAD_BODY));
		e.handle(Gesture::DragMove(LOAD_BODY + Point::new(0.0, 100.0)));
		let events = e.handle(Gesture::DragEnd);
		assert_eq!(events.len(), 2);
		assert_eq!(e.graph().node(&"load".into()).unwrap().position, Point::new(0.0, 100.0));
		assert_eq!(e.graph().node(&"save".into()).unwrap().position, Point::new(800.0, 100.0));
		assert_eq!(e.graph().node(&"scale".into()).unwrap().position, Point::new(400.0, 0.0));
	}
}

mod mapping {
	use super::*;

	#[test]
	fn taps_pick_one_candidate_per_field() {
		let mut e = editor();
		assert_eq!(
			e.enter_field_mapping(vec![FieldMapping::new("image", Some(SlotType::new("IMAGE")))]),
			vec![EditorEvent::ModeChanged(ModeKind::FieldMapping)]
		);

		assert_eq!(
			tap(&mut e, Point::new(490.0, 85.0)),
			vec![EditorEvent::FieldCandidateAssigned {
				field: "image".into(),
				candidate: FieldCandidate {
					node_id: "scale".into(),
					input_name: Some("image".into()),
				},
			}]
		);
		tap(&mut e, Point::new(90.0, 60.0));
		let field = &e.state().mapping.fields[0];
		assert_eq!(field.candidates.len(), 2);
		assert_eq!(field.selected_candidate().unwrap().node_id, "load".into());

		assert!(tap(&mut e, EMPTY).is_empty());
		assert_eq!(
			e.confirm_mapping(),
			vec![
				EditorEvent::MappingConfirmed(vec![FieldAssignment {
					field_key: "image".into(),
					node_id: "load".into(),
					input_name: None,
				}]),
				EditorEvent::ModeChanged(ModeKind::Normal),
			]
		);
		assert!(e.state().mapping.is_empty());
		assert!(e.confirm_mapping().is_empty());
	}

	#[test]
	fn active_field_receives_taps() {
		let mut e = editor();
		e.enter_field_mapping(vec![
			FieldMapping::new("source", None),
			FieldMapping::new("target", None),
		]);
		assert!(e.activate_field("target"));
		assert!(!e.activate_field("missing"));
		tap(&mut e, Point::new(860.0, 60.0));
		let fields = &e.state().mapping.fields;
		assert!(fields[0].selected_candidate().is_none());
		assert_eq!(fields[1].selected_candidate().unwrap().node_id, "save".into());
	}

	#[test]
	fn deleted_candidates_are_pruned() {
		let mut e = editor();
		let mut field = FieldMapping::new("image", None);
		field.candidates = vec![
			FieldCandidate {
				node_id: "scale".into(),
				input_name: Some("image".into()),
			},
			FieldCandidate {
				node_id: "save".into(),
				input_name: Some("images".into()),
			},
		];
		field.selected = Some(1);
		e.enter_field_mapping(vec![field]);

		e.delete_node(&"scale".into());
		let field = &e.state().mapping.fields[0];
		assert_eq!(field.candidates.len(), 1);
		assert_eq!(field.selected_candidate().unwrap().node_id, "save".into());
	}
}

mod lifecycle {
	use super::*;

	#[test]
	fn deleting_a_node_cascades() {
		let mut e = editor();
		e.connect(&"load".into(), 0, &"scale".into(), "image").unwrap();
		e.connect(&"scale".into(), 0, &"save".into(), "images").unwrap();
		assert_eq!(
			tap(&mut e, Point::new(490.0, 85.0)),
			vec![EditorEvent::OpenAttributeEditor("scale".into())]
		);

		assert_eq!(
			e.delete_node(&"scale".into()),
			vec![
				EditorEvent::NodeDeleted {
					node: "scale".into(),
					removed_edges: 2
				},
				EditorEvent::CloseAttributeEditor("scale".into()),
			]
		);
		assert!(e.graph().edges.is_empty());
		assert_eq!(
			e.graph().node(&"save".into()).unwrap().input("images").unwrap().value,
			InputValue::slot("IMAGE")
		);
		assert!(e.graph().is_consistent());
		assert!(e.delete_node(&"scale".into()).is_empty());
	}

	#[test]
	fn tapping_another_node_switches_the_attribute_editor() {
		let mut e = editor();
		tap(&mut e, Point::new(90.0, 60.0));
		assert_eq!(
			tap(&mut e, Point::new(860.0, 60.0)),
			vec![
				EditorEvent::CloseAttributeEditor("load".into()),
				EditorEvent::OpenAttributeEditor("save".into()),
			]
		);
		assert!(tap(&mut e, Point::new(860.0, 60.0)).is_empty());
		assert_eq!(tap(&mut e, EMPTY), vec![EditorEvent::CloseAttributeEditor("save".into())]);
	}

	#[test]
	fn double_taps_open_rename_dialogs_or_fit() {
		let mut g = pipeline();
		g.add_note(Note::new("memo", Point::new(0.0, 300.0), 160.0));
		let mut group = Group::new("g", "Inputs", Point::ZERO);
		group.nodes.push("load".into());
		g.add_group(group);
		let mut e = editor_with(g);

		assert_eq!(
			e.handle(Gesture::DoubleTap(Point::new(40.0, 15.0))),
			vec![EditorEvent::RenameNode("load".into())]
		);
		assert_eq!(
			e.handle(Gesture::DoubleTap(Point::new(50.0, -30.0))),
			vec![EditorEvent::RenameGroup("g".into())]
		);
		assert_eq!(
			e.handle(Gesture::DoubleTap(Point::new(50.0, 320.0))),
			vec![EditorEvent::EditNote("memo".into())]
		);

		let events = e.handle(Gesture::DoubleTap(Point::new(700.0, 500.0)));
		assert!(matches!(events.as_slice(), [EditorEvent::ViewportChanged(_)]));
		assert!(e.state().transform.scale < 1.0);
		assert!(e.is_animating());
	}

	#[test]
	fn reload_animates_survivors_and_drops_stale_references() {
		let mut e = editor();
		tap(&mut e, Point::new(490.0, 85.0));

		let mut next = pipeline();
		next.remove_node(&"scale".into());
		next.move_node(&"load".into(), Point::new(100.0, 0.0));
		let events = e.replace_graph(next);
		assert_eq!(events, vec![EditorEvent::CloseAttributeEditor("scale".into())]);

		e.tick(0.15);
		let shown = e.layout().node(&"load".into()).unwrap().rect.x;
		assert!(shown > 0.0 && shown < 100.0);
		assert_eq!(e.model_layout().node(&"load".into()).unwrap().rect.x, 100.0);

		e.tick(1.0);
		assert_eq!(e.layout().node(&"load".into()).unwrap().rect.x, 100.0);
		assert!(!e.is_animating());
	}

	#[test]
	fn dragging_mid_animation_stays_in_sync() {
		let mut e = editor();
		e.move_node(&"load".into(), Point::new(100.0, 0.0));
		e.tick(0.15);
		let shown = e.layout().node(&"load".into()).unwrap().rect.origin();
		let grab = shown + Point::new(90.0, 60.0);

		e.handle(Gesture::DragStart(grab));
		e.handle(Gesture::DragMove(grab + Point::new(10.0, 0.0)));
		let model = e.graph().node(&"load".into()).unwrap().position;
		assert_eq!(model, shown + Point::new(10.0, 0.0));
		assert_eq!(e.layout().node(&"load".into()).unwrap().rect.origin(), model);
		e.handle(Gesture::DragEnd);

		e.tick(5.0);
		assert_eq!(e.layout().node(&"load".into()).unwrap().rect.origin(), model);
	}

	#[test]
	fn pinch_zoom_is_clamped_and_anchored() {
		let mut e = editor();
		let centroid = Point::new(400.0, 300.0);
		let anchored = e.transform().screen_to_graph(centroid);
		for _ in 0..20 {
			e.handle(Gesture::Transform {
				centroid,
				pan: Point::ZERO,
				zoom: 0.5,
			});
		}
		assert_eq!(e.transform().scale, 0.2);
		assert!(approx_point(e.transform().screen_to_graph(centroid), anchored));

		e.apply_view_command(ViewCommand::Reset);
		e.tick(10.0);
		assert!(approx(e.transform().scale, 1.0));
		assert!(approx_point(e.transform().offset, Point::ZERO));
	}

	#[test]
	fn catalog_nodes_start_with_defaults() {
		let mut e = editor();
		let catalog = catalog();
		assert!(e.add_node_from_definition(&catalog, "k", "KSampler", Point::new(0.0, 400.0)));
		assert!(!e.add_node_from_definition(&catalog, "x", "Unknown", Point::ZERO));
		let node = e.graph().node(&"k".into()).unwrap();
		assert_eq!(node.title, "KSampler");
		assert_eq!(node.inputs.len(), 4);
		assert!(!node.inputs[0].value.is_literal());
		assert!(node.inputs[1].value.is_literal());
		assert!(e.layout().node(&"k".into()).is_some());

		let scaled = e.add_node_from_definition(&catalog, "u", "ImageScale", Point::new(0.0, 600.0));
		assert!(scaled);
		assert_eq!(e.graph().node(&"u".into()).unwrap().title, "Upscale Image");
	}
}

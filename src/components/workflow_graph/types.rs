//! Workflow graph data structures: nodes, edges, groups and notes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};

/// Unique node identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Unique note identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

/// Unique group identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

/// Edge identifier, allocated by the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

macro_rules! string_id {
	($($ty:ident),*) => {$(
		impl From<&str> for $ty {
			fn from(s: &str) -> Self {
				Self(s.to_string())
			}
		}

		impl From<String> for $ty {
			fn from(s: String) -> Self {
				Self(s)
			}
		}

		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl $ty {
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
	)*};
}

string_id!(NodeId, NoteId, GroupId);

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Declared type of a slot (e.g. `IMAGE`, `MODEL`). Drives wire colour and
/// connection compatibility. `*` accepts anything.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SlotType(String);

impl SlotType {
	pub const WILDCARD: &'static str = "*";

	pub fn new(name: impl AsRef<str>) -> Self {
		Self(name.as_ref().trim().to_ascii_uppercase())
	}

	pub fn wildcard() -> Self {
		Self(Self::WILDCARD.to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_wildcard(&self) -> bool {
		self.0 == Self::WILDCARD
	}

	/// Types are compatible when equal or when either side is the wildcard.
	pub fn accepts(&self, other: &SlotType) -> bool {
		self.is_wildcard() || other.is_wildcard() || self == other
	}
}

impl From<String> for SlotType {
	fn from(s: String) -> Self {
		SlotType::new(s)
	}
}

impl From<&str> for SlotType {
	fn from(s: &str) -> Self {
		SlotType::new(s)
	}
}

impl From<SlotType> for String {
	fn from(t: SlotType) -> Self {
		t.0
	}
}

impl fmt::Display for SlotType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A literal input value, normalised to one typed representation at ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}

impl Primitive {
	/// Convert a raw JSON literal into a typed value using the declared slot type.
	///
	/// Workflow documents store numbers both as JSON numbers and as strings; both
	/// forms of `INT`, `FLOAT` and `BOOLEAN` end up in the same variant here so
	/// later comparisons never need to coerce.
	pub fn normalize(raw: &serde_json::Value, declared: Option<&SlotType>) -> Option<Primitive> {
		use serde_json::Value;

		let declared = declared.map(SlotType::as_str);
		match (raw, declared) {
			(Value::Null, _) | (Value::Array(_), _) | (Value::Object(_), _) => None,
			(Value::Bool(b), _) => Some(Primitive::Bool(*b)),
			(Value::Number(n), Some("FLOAT")) => n.as_f64().map(Primitive::Float),
			(Value::Number(n), Some("INT")) => n
				.as_i64()
				.or_else(|| n.as_f64().map(|f| f.round() as i64))
				.map(Primitive::Int),
			(Value::Number(n), _) => n
				.as_i64()
				.map(Primitive::Int)
				.or_else(|| n.as_f64().map(Primitive::Float)),
			(Value::String(s), Some("INT")) => Some(
				s.trim()
					.parse::<i64>()
					.map(Primitive::Int)
					.or_else(|_| s.trim().parse::<f64>().map(|f| Primitive::Int(f.round() as i64)))
					.unwrap_or_else(|_| Primitive::Text(s.clone())),
			),
			(Value::String(s), Some("FLOAT")) => Some(
				s.trim()
					.parse::<f64>()
					.map(Primitive::Float)
					.unwrap_or_else(|_| Primitive::Text(s.clone())),
			),
			(Value::String(s), Some("BOOLEAN")) => match s.trim().to_ascii_lowercase().as_str() {
				"true" => Some(Primitive::Bool(true)),
				"false" => Some(Primitive::Bool(false)),
				_ => Some(Primitive::Text(s.clone())),
			},
			(Value::String(s), _) => Some(Primitive::Text(s.clone())),
		}
	}

	/// The value as raw JSON, for re-typing against a declared slot type.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Primitive::Bool(b) => serde_json::Value::Bool(*b),
			Primitive::Int(i) => serde_json::Value::from(*i),
			Primitive::Float(f) => serde_json::Value::from(*f),
			Primitive::Text(s) => serde_json::Value::String(s.clone()),
		}
	}

	/// Slot type implied by the value itself.
	pub fn implied_type(&self) -> SlotType {
		match self {
			Primitive::Bool(_) => SlotType::new("BOOLEAN"),
			Primitive::Int(_) => SlotType::new("INT"),
			Primitive::Float(_) => SlotType::new("FLOAT"),
			Primitive::Text(_) => SlotType::new("STRING"),
		}
	}

	pub fn is_empty_text(&self) -> bool {
		matches!(self, Primitive::Text(s) if s.trim().is_empty())
	}
}

impl fmt::Display for Primitive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Primitive::Bool(b) => write!(f, "{b}"),
			Primitive::Int(i) => write!(f, "{i}"),
			Primitive::Float(v) => {
				if v.fract() == 0.0 && v.abs() < 1e15 {
					write!(f, "{v:.1}")
				} else {
					let s = format!("{v:.4}");
					f.write_str(s.trim_end_matches('0'))
				}
			}
			Primitive::Text(s) => f.write_str(s),
		}
	}
}

/// What feeds a node input. Exactly one variant at any time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputValue {
	/// A literal value edited in place.
	Literal { value: Primitive },
	/// Fed by an edge.
	Connection { edge: EdgeId, slot_type: SlotType },
	/// A slot waiting for a connection.
	UnconnectedSlot { slot_type: SlotType },
}

impl InputValue {
	pub fn literal(value: Primitive) -> Self {
		InputValue::Literal { value }
	}

	pub fn slot(slot_type: impl Into<SlotType>) -> Self {
		InputValue::UnconnectedSlot {
			slot_type: slot_type.into(),
		}
	}

	pub fn is_literal(&self) -> bool {
		matches!(self, InputValue::Literal { .. })
	}

	pub fn is_connected(&self) -> bool {
		matches!(self, InputValue::Connection { .. })
	}

	/// Slot type of this input (for literals, the type implied by the value).
	pub fn slot_type(&self) -> SlotType {
		match self {
			InputValue::Literal { value } => value.implied_type(),
			InputValue::Connection { slot_type, .. } | InputValue::UnconnectedSlot { slot_type } => {
				slot_type.clone()
			}
		}
	}

	pub fn edge(&self) -> Option<EdgeId> {
		match self {
			InputValue::Connection { edge, .. } => Some(*edge),
			_ => None,
		}
	}
}

/// Node category, used to pick header/body colours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
	Loader,
	Model,
	Conditioning,
	Sampling,
	Latent,
	Image,
	Mask,
	Video,
	Utility,
	Output,
	#[default]
	Other,
}

/// A named node input, kept in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
	pub name: String,
	pub value: InputValue,
}

/// A node output slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
	/// Display name; defaults to the type name.
	#[serde(default)]
	pub name: Option<String>,
	pub slot_type: SlotType,
}

impl NodeOutput {
	pub fn new(slot_type: impl Into<SlotType>) -> Self {
		Self {
			name: None,
			slot_type: slot_type.into(),
		}
	}

	pub fn label(&self) -> &str {
		self.name.as_deref().unwrap_or(self.slot_type.as_str())
	}
}

/// A processing node. Its size is derived by the layout pass and never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	pub position: Point,
	pub title: String,
	#[serde(default)]
	pub category: NodeCategory,
	pub class_type: String,
	#[serde(default)]
	pub inputs: Vec<NodeInput>,
	#[serde(default)]
	pub outputs: Vec<NodeOutput>,
	#[serde(default)]
	pub bypass: bool,
}

impl Node {
	pub fn new(id: impl Into<NodeId>, class_type: impl Into<String>, position: Point) -> Self {
		let class_type = class_type.into();
		Self {
			id: id.into(),
			position,
			title: class_type.clone(),
			category: NodeCategory::Other,
			class_type,
			inputs: Vec::new(),
			outputs: Vec::new(),
			bypass: false,
		}
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	pub fn with_category(mut self, category: NodeCategory) -> Self {
		self.category = category;
		self
	}

	pub fn with_input(mut self, name: impl Into<String>, value: InputValue) -> Self {
		self.inputs.push(NodeInput {
			name: name.into(),
			value,
		});
		self
	}

	pub fn with_output(mut self, slot_type: impl Into<SlotType>) -> Self {
		self.outputs.push(NodeOutput::new(slot_type));
		self
	}

	pub fn input(&self, name: &str) -> Option<&NodeInput> {
		self.inputs.iter().find(|i| i.name == name)
	}

	pub fn input_mut(&mut self, name: &str) -> Option<&mut NodeInput> {
		self.inputs.iter_mut().find(|i| i.name == name)
	}

	pub fn literal_count(&self) -> usize {
		self.inputs.iter().filter(|i| i.value.is_literal()).count()
	}

	pub fn slot_input_count(&self) -> usize {
		self.inputs.len() - self.literal_count()
	}
}

/// A directed connection from an output to an input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub id: EdgeId,
	pub source: NodeId,
	pub source_output: usize,
	pub target: NodeId,
	pub target_input: String,
	#[serde(default)]
	pub slot_type: Option<SlotType>,
}

/// A visual container. Bounds are derived from members every layout pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
	pub id: GroupId,
	pub title: String,
	/// Optional colour override (`#rrggbb`).
	#[serde(default)]
	pub color: Option<String>,
	/// Anchor used only to place an empty group.
	#[serde(default)]
	pub origin: Point,
	#[serde(default)]
	pub nodes: Vec<NodeId>,
	#[serde(default)]
	pub notes: Vec<NoteId>,
}

impl Group {
	pub fn new(id: impl Into<GroupId>, title: impl Into<String>, origin: Point) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			color: None,
			origin,
			nodes: Vec::new(),
			notes: Vec::new(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.notes.is_empty()
	}
}

/// A free-text note on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
	pub id: NoteId,
	pub position: Point,
	pub width: f64,
	pub title: String,
	#[serde(default)]
	pub content: String,
}

impl Note {
	pub fn new(id: impl Into<NoteId>, position: Point, width: f64) -> Self {
		Self {
			id: id.into(),
			position,
			width,
			title: String::from("Note"),
			content: String::new(),
		}
	}

	pub fn with_content(mut self, content: impl Into<String>) -> Self {
		self.content = content.into();
		self
	}
}

/// The editor's aggregate root.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	#[serde(default)]
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub edges: Vec<Edge>,
	#[serde(default)]
	pub groups: Vec<Group>,
	#[serde(default)]
	pub notes: Vec<Note>,
	#[serde(default)]
	pub(crate) next_edge_id: u64,
}

/// A graph as it arrives from the host: the model plus the persisted group
/// rectangles used once to derive group membership.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
	pub graph: Graph,
	#[serde(default)]
	pub group_bounds: Vec<(GroupId, Rect)>,
}

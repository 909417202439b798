//! Text measurement, truncation and literal value formatting.

use super::types::Primitive;

pub const ELLIPSIS: &str = "...";

/// Measures rendered text width in graph units.
pub trait TextMeasure {
	fn measure(&self, text: &str, font_size: f64) -> f64;
}

/// Fixed advance per character. Used when no platform font metrics exist
/// (tests, headless layout).
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMetric {
	pub char_width_ratio: f64,
}

impl Default for MonospaceMetric {
	fn default() -> Self {
		Self {
			char_width_ratio: 0.6,
		}
	}
}

impl TextMeasure for MonospaceMetric {
	fn measure(&self, text: &str, font_size: f64) -> f64 {
		text.chars().count() as f64 * font_size * self.char_width_ratio
	}
}

/// Fit `text` into `max_width`, trimming trailing characters and appending an
/// ellipsis. Degrades to `"..."` when not even one character fits.
pub fn truncate_to_width(
	text: &str,
	max_width: f64,
	font_size: f64,
	measure: &dyn TextMeasure,
) -> String {
	if measure.measure(text, font_size) <= max_width {
		return text.to_string();
	}
	let candidate = |end: usize| format!("{}{ELLIPSIS}", text[..end].trim_end());
	// Byte offsets ending each proper, non-empty prefix. Candidate width only
	// grows with the prefix, so the fitting ones form a leading run.
	let ends: Vec<usize> = text.char_indices().skip(1).map(|(i, _)| i).collect();
	let fitting =
		ends.partition_point(|&end| measure.measure(&candidate(end), font_size) <= max_width);
	match fitting {
		0 => ELLIPSIS.to_string(),
		n => candidate(ends[n - 1]),
	}
}

/// Keep the head and tail of a long string: `"abcdefghij"` → `"abc…hij"`.
pub fn middle_elide(text: &str, max_chars: usize) -> String {
	let chars: Vec<char> = text.chars().collect();
	if chars.len() <= max_chars || max_chars < 2 {
		return text.to_string();
	}
	let budget = max_chars - 1;
	let head = budget.div_ceil(2);
	let tail = budget - head;
	let mut out: String = chars[..head].iter().collect();
	out.push('…');
	out.extend(&chars[chars.len() - tail..]);
	out
}

/// Resolves `{{identifier}}` placeholders to display names.
pub trait PlaceholderResolver {
	fn display_name(&self, identifier: &str) -> Option<String>;
}

/// Resolver that knows no names; placeholders render as their identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPlaceholders;

impl PlaceholderResolver for NoPlaceholders {
	fn display_name(&self, _identifier: &str) -> Option<String> {
		None
	}
}

impl PlaceholderResolver for std::collections::HashMap<String, String> {
	fn display_name(&self, identifier: &str) -> Option<String> {
		self.get(identifier).cloned()
	}
}

/// Returns the identifier when `text` is exactly `{{identifier}}`.
pub fn placeholder_identifier(text: &str) -> Option<&str> {
	let inner = text.trim().strip_prefix("{{")?.strip_suffix("}}")?.trim();
	let valid = !inner.is_empty()
		&& inner
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-');
	valid.then_some(inner)
}

/// How a literal value is displayed in its row.
#[derive(Clone, Debug, PartialEq)]
pub enum FormattedValue {
	Text(String),
	/// Booleans render as a toggle glyph.
	Toggle(bool),
}

pub fn format_value(
	value: &Primitive,
	resolver: &dyn PlaceholderResolver,
	long_value_chars: usize,
) -> FormattedValue {
	match value {
		Primitive::Bool(b) => FormattedValue::Toggle(*b),
		Primitive::Text(s) => match placeholder_identifier(s) {
			Some(id) => FormattedValue::Text(
				resolver
					.display_name(id)
					.unwrap_or_else(|| id.to_string()),
			),
			None => FormattedValue::Text(middle_elide(&s.replace('\n', " "), long_value_chars)),
		},
		other => FormattedValue::Text(other.to_string()),
	}
}

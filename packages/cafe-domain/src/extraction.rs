use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::constraint::Constraint;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)```(?:json)?").unwrap_or_else(|err| panic!("Invalid code fence pattern: {err}"))
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
	/// The model call failed before returning any text.
	Provider(String),
	/// The model call exceeded its time budget.
	Timeout,
	/// The model answered, but no JSON value could be recovered from its text.
	Unparsable,
}
impl fmt::Display for ExtractionFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Provider(message) => write!(f, "provider error: {message}"),
			Self::Timeout => write!(f, "timed out"),
			Self::Unparsable => write!(f, "output is not JSON"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
	Parsed(Constraint),
	Failed(ExtractionFailure),
}
impl ExtractionOutcome {
	/// Interprets raw model text as a constraint object.
	pub fn from_model_output(text: &str) -> Self {
		match salvage_json(text) {
			Some(value) => Self::Parsed(Constraint::from_value(&value)),
			None => Self::Failed(ExtractionFailure::Unparsable),
		}
	}

	pub fn into_constraint(self) -> Constraint {
		match self {
			Self::Parsed(constraint) => constraint,
			Self::Failed(_) => Constraint::default(),
		}
	}
}

/// Recovers a JSON value from model text that may be fenced or wrapped in prose.
///
/// Tries the fence-stripped text as a whole, then the span from the first `{` to the last `}`.
pub fn salvage_json(text: &str) -> Option<Value> {
	let stripped = CODE_FENCE.replace_all(text, "");
	let stripped = stripped.trim();

	if let Ok(value) = serde_json::from_str(stripped) {
		return Some(value);
	}

	let start = stripped.find('{')?;
	let end = stripped.rfind('}')?;

	if end <= start {
		return None;
	}

	serde_json::from_str(&stripped[start..=end]).ok()
}

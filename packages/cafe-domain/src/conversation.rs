use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}
impl Role {
	pub fn label(self) -> &'static str {
		match self {
			Self::User => "User",
			Self::Assistant => "Assistant",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
	pub role: Role,
	pub content: String,
}
impl ConversationTurn {
	pub fn user(content: impl Into<String>) -> Self {
		Self { role: Role::User, content: content.into() }
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self { role: Role::Assistant, content: content.into() }
	}
}

/// Keeps only the most recent `max_turns` entries, in their original order.
///
/// Trimming counts raw entries, so a user turn can lose its assistant reply at the boundary.
pub fn retain_recent(turns: &mut Vec<ConversationTurn>, max_turns: usize) {
	if turns.len() > max_turns {
		let excess = turns.len() - max_turns;

		turns.drain(..excess);
	}
}

pub fn trailing(turns: &[ConversationTurn], count: usize) -> &[ConversationTurn] {
	&turns[turns.len().saturating_sub(count)..]
}

/// Renders turns as `Role: content` lines for prompt context.
pub fn transcript(turns: &[ConversationTurn]) -> String {
	let mut out = String::new();

	for turn in turns {
		out.push_str(turn.role.label());
		out.push_str(": ");
		out.push_str(&turn.content);
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn numbered(count: usize) -> Vec<ConversationTurn> {
		(0..count)
			.map(|i| {
				if i % 2 == 0 {
					ConversationTurn::user(format!("u{i}"))
				} else {
					ConversationTurn::assistant(format!("a{i}"))
				}
			})
			.collect()
	}

	#[test]
	fn retains_most_recent_entries_in_order() {
		let mut turns = numbered(23);

		retain_recent(&mut turns, 20);

		assert_eq!(turns.len(), 20);
		assert_eq!(turns.first().map(|t| t.content.as_str()), Some("a3"));
		assert_eq!(turns.last().map(|t| t.content.as_str()), Some("u22"));
		// Odd excess splits a pair: the log now starts with an assistant turn.
		assert_eq!(turns[0].role, Role::Assistant);
	}

	#[test]
	fn short_logs_are_untouched() {
		let mut turns = numbered(4);

		retain_recent(&mut turns, 20);

		assert_eq!(turns, numbered(4));
	}

	#[test]
	fn trailing_window_is_bounded() {
		let turns = numbered(6);

		assert_eq!(trailing(&turns, 4).len(), 4);
		assert_eq!(trailing(&turns, 4)[0].content, "u2");
		assert_eq!(trailing(&turns, 10).len(), 6);
		assert!(trailing(&[], 4).is_empty());
	}

	#[test]
	fn transcript_labels_roles() {
		let turns = vec![ConversationTurn::user("Budget 200"), ConversationTurn::assistant("Sure")];

		assert_eq!(transcript(&turns), "User: Budget 200\nAssistant: Sure\n");
	}
}

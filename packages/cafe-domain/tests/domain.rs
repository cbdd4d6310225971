use serde_json::json;

use cafe_domain::{
	constraint::{Constraint, Diet, Milk, Temperature},
	conversation::{self, ConversationTurn, Role},
	extraction::{ExtractionFailure, ExtractionOutcome},
	grounding,
	menu::{MenuItem, NO_MATCHES_MESSAGE, SearchResult},
};

fn beverage(vector_id: u64, name: &str, price: i64, group_id: &str) -> SearchResult {
	SearchResult {
		item: MenuItem {
			vector_id,
			item_id: format!("item-{vector_id}"),
			name: name.to_string(),
			price: Some(price),
			in_stock: true,
			category_id: Some("beverages".to_string()),
			sub_category_id: None,
			group_id: Some(group_id.to_string()),
		},
		score: 1.0 - vector_id as f32 * 0.01,
	}
}

#[test]
fn malformed_extractor_outputs_yield_default_constraint() {
	let outputs = [
		"I think the user wants something cheap.",
		"{\"max_price\": 200, \"diet\": [\"veg",
		"```json\n\n```",
		"",
		"   ",
		"[1, 2, 3]",
		"null",
	];

	for output in outputs {
		let constraint = ExtractionOutcome::from_model_output(output).into_constraint();

		assert!(constraint.is_unconstrained(), "{output:?} must collapse to the default");
	}
}

#[test]
fn fenced_output_is_parsed_and_validated() {
	let output = "```json\n{\"max_price\": 200, \"diet\": [\"vegan\"], \"temperature\": [\"iced\"], \"milk\": \"non-milk\", \"category_hint\": \"beverages\"}\n```";
	let outcome = ExtractionOutcome::from_model_output(output);
	let ExtractionOutcome::Parsed(constraint) = outcome else {
		panic!("Expected a parsed outcome.");
	};

	assert_eq!(constraint.max_price, Some(200));
	assert!(constraint.wants(Diet::Vegan));
	assert!(!constraint.wants(Diet::Vegetarian));
	assert!(constraint.temperature.is_empty());
	assert_eq!(constraint.milk, Some(Milk::NonMilk));
	assert_eq!(constraint.category_hint.as_deref(), Some("beverages"));
}

#[test]
fn extraction_failures_describe_their_cause() {
	assert_eq!(ExtractionFailure::Timeout.to_string(), "timed out");
	assert_eq!(
		ExtractionFailure::Provider("connection refused".to_string()).to_string(),
		"provider error: connection refused"
	);
	assert_eq!(
		ExtractionOutcome::Failed(ExtractionFailure::Timeout).into_constraint(),
		Constraint::default()
	);
}

#[test]
fn constraint_round_trips_through_json() {
	let constraint = Constraint {
		max_price: Some(250),
		min_price: None,
		diet: vec![Diet::Vegetarian],
		temperature: vec![Temperature::Hot, Temperature::Cold],
		milk: Some(Milk::Milk),
		category_hint: None,
	};
	let value = serde_json::to_value(&constraint).expect("serialize failed");

	assert_eq!(value["temperature"], json!(["hot", "cold"]));
	assert_eq!(Constraint::from_value(&value), constraint);
}

#[test]
fn retention_exposes_the_most_recent_twenty_turns() {
	let mut turns = Vec::new();

	for exchange in 0..15 {
		turns.push(ConversationTurn::user(format!("question {exchange}")));
		turns.push(ConversationTurn::assistant(format!("answer {exchange}")));
		conversation::retain_recent(&mut turns, 20);
	}

	assert_eq!(turns.len(), 20);
	assert_eq!(turns[0], ConversationTurn::user("question 5"));
	assert_eq!(turns[19], ConversationTurn::assistant("answer 14"));

	for pair in turns.chunks(2) {
		assert_eq!(pair[0].role, Role::User);
		assert_eq!(pair[1].role, Role::Assistant);
	}
}

#[test]
fn turns_serialize_with_lowercase_roles() {
	let value = serde_json::to_value(ConversationTurn::assistant("Hi")).expect("serialize failed");

	assert_eq!(value, json!({ "role": "assistant", "content": "Hi" }));
}

#[test]
fn fallback_for_vegan_beverages_is_grounded() {
	let items: Vec<SearchResult> = (0..11)
		.map(|i| {
			let letter = char::from(b'A' + i as u8);

			beverage(i, &format!("Tea Blend {letter}"), 100 + i as i64 * 5, "nonmilk-tea")
		})
		.collect();
	let fallback = grounding::fallback_answer(&items);

	assert!(fallback.starts_with("You can choose from: Tea Blend A (₹100), "));
	assert!(fallback.ends_with("Tea Blend K (₹150)"));
	assert!(grounding::is_grounded(&fallback, &items));
	assert!(items.iter().all(|result| result.item.is_vegan_group()));
}

#[test]
fn invented_price_is_flagged_but_name_mismatch_is_not() {
	let items = vec![beverage(0, "Masala Chai", 90, "milk-based")];

	assert!(!grounding::is_grounded("Masala Chai is only 45 today", &items));
	assert!(grounding::is_grounded("Masala Chai, Mystery Brew for 90", &items));
	assert_eq!(grounding::fallback_answer(&[]), NO_MATCHES_MESSAGE);
}

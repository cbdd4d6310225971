use serde_json::{Value, json};

use cafe_domain::{
	constraint::{Constraint, Diet, Milk, Temperature},
	conversation::{self, ConversationTurn},
	menu::{CURRENCY_SYMBOL, SearchResult},
};

pub const EXTRACTOR_INSTRUCTIONS: &str = "\
You turn a cafe customer's message into search filters. Reply with one JSON object and nothing else.

Schema:
{\"max_price\": integer or null, \"min_price\": integer or null, \"diet\": [\"vegan\" | \"vegetarian\"], \
\"temperature\": [\"hot\" | \"cold\"], \"milk\": \"milk\" | \"non-milk\" | null, \"category_hint\": string or null}

Rules:
- Prices are whole rupees. Use null when the customer gives no budget.
- category_hint is a short menu phrase such as \"iced tea\" or \"sandwiches\", or null.
- Follow-up messages keep the budget and category from earlier turns unless the customer changes \
topic or states a new value, which replaces the old one.
- Moods such as \"I'm tired\" carry no hard filters; leave fields null or empty.";

pub const GENERATOR_INSTRUCTIONS: &str = "\
You are a friendly cafe assistant. Answer only from the MENU DATA in the user message. Never invent \
items or prices, and always write prices in rupees exactly as listed.

Reasoning:
- Diet tags: work them out from the item when the menu data does not say. Vegan means no milk, \
meat, cheese or honey; black coffee and plain tea are usually vegan. Vegetarian means no meat or \
egg; milk and cheese are fine.
- Physical state comes before flavour words. For \"tired\", \"sleepy\" or \"energizing\", put \
caffeine first. For \"hungry\", put food first. For \"refreshing\", prefer cold, fruity or fizzy items.

Response shape:
- Hard constraints (a budget, a diet, or \"list all\"): enumerate EVERY listed item that meets them. \
If 11 items fit a budget of 200, list all 11.
- Open-ended moods or preferences (\"I'm tired\", \"something refreshing\"): curate roughly 5-7 of the \
most relevant items, fewer for narrow moods, each with a two or three word reason. Leave out weak matches.

Style: short and direct, one item per line, no general claims about the menu.";

pub fn extractor_messages(message: &str, history: &[ConversationTurn]) -> Vec<Value> {
	let mut user = String::new();

	if !history.is_empty() {
		user.push_str("Recent conversation:\n");
		user.push_str(&conversation::transcript(history));
		user.push('\n');
	}

	user.push_str("Customer message: ");
	user.push_str(message);

	vec![
		json!({ "role": "system", "content": EXTRACTOR_INSTRUCTIONS }),
		json!({ "role": "user", "content": user }),
	]
}

/// Numbered item list handed to the generator as the only source of truth.
pub fn manifest(items: &[SearchResult]) -> String {
	let mut out = String::new();

	for (idx, result) in items.iter().enumerate() {
		let price = match result.item.price {
			Some(price) => format!("{CURRENCY_SYMBOL}{price}"),
			None => "price unavailable".to_string(),
		};

		out.push_str(&format!("{}. {} - {price}\n", idx + 1, result.item.name));
	}

	out
}

/// Soft preferences the retrieval filters do not enforce, as one line for the model.
pub fn preferences(constraint: &Constraint) -> Option<String> {
	let mut parts = Vec::new();

	if !constraint.diet.is_empty() {
		let diet: Vec<&str> = constraint
			.diet
			.iter()
			.map(|diet| match diet {
				Diet::Vegan => "vegan",
				Diet::Vegetarian => "vegetarian",
			})
			.collect();

		parts.push(format!("diet {}", diet.join(" and ")));
	}
	if !constraint.temperature.is_empty() {
		let temperature: Vec<&str> = constraint
			.temperature
			.iter()
			.map(|temperature| match temperature {
				Temperature::Hot => "hot",
				Temperature::Cold => "cold",
			})
			.collect();

		parts.push(format!("served {}", temperature.join(" or ")));
	}
	if let Some(milk) = constraint.milk {
		parts.push(
			match milk {
				Milk::Milk => "with milk",
				Milk::NonMilk => "without milk",
			}
			.to_string(),
		);
	}

	if parts.is_empty() { None } else { Some(format!("CUSTOMER WANTS: {}.", parts.join(", "))) }
}

pub fn generator_messages(
	query: &str,
	constraint: &Constraint,
	items: &[SearchResult],
	history: &[ConversationTurn],
) -> Vec<Value> {
	let mut messages = vec![json!({ "role": "system", "content": GENERATOR_INSTRUCTIONS })];

	for turn in history {
		messages.push(json!({ "role": turn.role, "content": turn.content }));
	}

	let mut user = format!(
		"MENU DATA (authoritative, use nothing else):\n{}\nMention item names and prices explicitly.\n\n",
		manifest(items)
	);

	if let Some(line) = preferences(constraint) {
		user.push_str(&line);
		user.push('\n');
	}

	user.push_str("QUESTION: ");
	user.push_str(query);

	messages.push(json!({ "role": "user", "content": user }));

	messages
}

use std::collections::HashSet;

use crate::menu::{NO_MATCHES_MESSAGE, SearchResult};

/// Result of checking a finished answer against the items it was generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingReport {
	/// Standalone numeric tokens that match no listed price.
	pub unknown_prices: Vec<String>,
	/// Comma-separated segments that name no listed item. Recorded only; never rejects.
	pub unmatched_segments: usize,
}
impl GroundingReport {
	pub fn is_grounded(&self) -> bool {
		self.unknown_prices.is_empty()
	}
}

pub fn check(answer: &str, items: &[SearchResult]) -> GroundingReport {
	let allowed_prices: HashSet<String> =
		items.iter().filter_map(|result| result.item.price).map(|price| price.to_string()).collect();
	let allowed_names: HashSet<String> =
		items.iter().map(|result| result.item.name.to_lowercase()).collect();
	let lowered = answer.to_lowercase();
	let mut report = GroundingReport::default();

	for word in lowered.split_whitespace() {
		if word.chars().all(|c| c.is_ascii_digit()) && !allowed_prices.contains(word) {
			report.unknown_prices.push(word.to_string());
		}
	}

	for segment in lowered.split(',') {
		let segment = segment.trim();

		if segment.chars().any(char::is_alphabetic) && !allowed_names.contains(segment) {
			report.unmatched_segments += 1;
		}
	}

	report
}

pub fn is_grounded(answer: &str, items: &[SearchResult]) -> bool {
	check(answer, items).is_grounded()
}

/// Deterministic answer built only from the authoritative items.
pub fn fallback_answer(items: &[SearchResult]) -> String {
	if items.is_empty() {
		return NO_MATCHES_MESSAGE.to_string();
	}

	let labels: Vec<String> = items.iter().map(|result| result.item.label()).collect();

	format!("You can choose from: {}", labels.join(", "))
}

#[cfg(test)]
mod tests {
	use crate::menu::MenuItem;

	use super::*;

	fn result(name: &str, price: Option<i64>) -> SearchResult {
		SearchResult {
			item: MenuItem {
				vector_id: 0,
				item_id: name.to_string(),
				name: name.to_string(),
				price,
				in_stock: true,
				category_id: None,
				sub_category_id: None,
				group_id: None,
			},
			score: 1.0,
		}
	}

	#[test]
	fn accepts_listed_prices() {
		let items = vec![result("Lemon Iced Tea", Some(150)), result("Espresso", Some(120))];

		assert!(is_grounded("Try Lemon Iced Tea for 150 or Espresso at 120 rupees.", &items));
	}

	#[test]
	fn rejects_invented_prices() {
		let items = vec![result("Espresso", Some(120))];
		let report = check("Espresso costs 99 today", &items);

		assert!(!report.is_grounded());
		assert_eq!(report.unknown_prices, vec!["99".to_string()]);
	}

	#[test]
	fn attached_currency_and_punctuation_are_not_standalone_numbers() {
		let items = vec![result("Espresso", Some(120))];

		assert!(is_grounded("Espresso (₹999), 42% stronger, 7up.", &items));
	}

	#[test]
	fn fractions_and_superscripts_are_not_prices() {
		let items = vec![result("Espresso", Some(120))];
		let report = check("Espresso (₹120) with ½ shot extra, served at 65° in a 2² cup ²", &items);

		assert!(report.is_grounded(), "{report:?}");
		assert!(!is_grounded("Espresso with ½ shot for 130", &items));
	}

	#[test]
	fn unknown_names_alone_do_not_reject() {
		let items = vec![result("Espresso", Some(120))];
		let report = check("Unicorn Latte, Dragon Mocha", &items);

		assert!(report.is_grounded());
		assert_eq!(report.unmatched_segments, 2);
	}

	#[test]
	fn fallback_lists_every_item_with_price() {
		let items = vec![result("Espresso", Some(120)), result("Water", None)];
		let fallback = fallback_answer(&items);

		assert_eq!(fallback, "You can choose from: Espresso (₹120), Water");
		assert!(is_grounded(&fallback, &items));
	}

	#[test]
	fn fallback_without_items_apologizes() {
		assert_eq!(fallback_answer(&[]), NO_MATCHES_MESSAGE);
	}
}

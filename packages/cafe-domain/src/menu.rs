use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

pub const CURRENCY_SYMBOL: &str = "₹";
pub const NO_MATCHES_MESSAGE: &str = "Sorry, I couldn't find any matching items on the menu.";
/// Case-folded group id fragments that mark an item group as free of animal products.
pub const VEGAN_GROUP_MARKERS: [&str; 4] = ["nonmilk", "tea", "black", "manual"];

/// One catalog record as written to the metadata ledger by the index build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
	pub vector_id: u64,
	pub item_id: String,
	pub name: String,
	#[serde(default, deserialize_with = "deserialize_price")]
	pub price: Option<i64>,
	#[serde(rename = "inStock", default)]
	pub in_stock: bool,
	#[serde(rename = "categoryId", default)]
	pub category_id: Option<String>,
	#[serde(rename = "subCategoryId", default)]
	pub sub_category_id: Option<String>,
	#[serde(rename = "groupId", default)]
	pub group_id: Option<String>,
}
impl MenuItem {
	pub fn is_vegan_group(&self) -> bool {
		self.group_id.as_deref().map(is_vegan_group).unwrap_or(false)
	}

	/// `Name (₹price)`, or the bare name when the price is unknown.
	pub fn label(&self) -> String {
		match self.price {
			Some(price) => format!("{} ({CURRENCY_SYMBOL}{price})", self.name),
			None => self.name.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	#[serde(flatten)]
	pub item: MenuItem,
	pub score: f32,
}

pub fn is_vegan_group(group_id: &str) -> bool {
	let folded = group_id.to_lowercase();

	VEGAN_GROUP_MARKERS.iter().any(|marker| folded.contains(marker))
}

// Ledgers exported from document stores sometimes carry `180.0` for integral prices.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;

	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => {
			if let Some(price) = number.as_i64() {
				return Ok(Some(price));
			}

			match number.as_f64() {
				Some(price) if price.fract() == 0.0 && price.is_finite() => Ok(Some(price as i64)),
				_ => Err(D::Error::custom(format!("price {number} is not an integer amount"))),
			}
		},
		Some(other) => Err(D::Error::custom(format!("price must be a number, got {other}"))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vegan_markers_are_case_folded_substrings() {
		assert!(is_vegan_group("nonmilk-tea"));
		assert!(is_vegan_group("Manual-Brew"));
		assert!(is_vegan_group("BLACK_COFFEE"));
		assert!(!is_vegan_group("milk-based"));
		assert!(!is_vegan_group(""));
	}

	#[test]
	fn ledger_record_uses_catalog_field_names() {
		let item: MenuItem = serde_json::from_str(
			r#"{"vector_id":3,"item_id":"a1","name":"Cold Brew","price":180.0,"inStock":true,"categoryId":"c","subCategoryId":"s","groupId":"black-coffee"}"#,
		)
		.expect("parse failed");

		assert_eq!(item.price, Some(180));
		assert!(item.in_stock);
		assert_eq!(item.group_id.as_deref(), Some("black-coffee"));
		assert!(item.is_vegan_group());
		assert_eq!(item.label(), "Cold Brew (₹180)");
	}

	#[test]
	fn missing_fields_fall_back_to_unknown() {
		let item: MenuItem =
			serde_json::from_str(r#"{"vector_id":0,"item_id":"a","name":"Water","price":null}"#)
				.expect("parse failed");

		assert_eq!(item.price, None);
		assert!(!item.in_stock);
		assert!(!item.is_vegan_group());
		assert_eq!(item.label(), "Water");
	}

	#[test]
	fn fractional_price_is_rejected() {
		let parsed = serde_json::from_str::<MenuItem>(
			r#"{"vector_id":0,"item_id":"a","name":"Water","price":12.5}"#,
		);

		assert!(parsed.is_err());
	}
}

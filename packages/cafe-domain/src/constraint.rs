use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Exclusive upper bound for prices accepted from model output.
pub const PRICE_BOUND: f64 = 5_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
	Vegan,
	Vegetarian,
}
impl Diet {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"vegan" => Some(Self::Vegan),
			"vegetarian" => Some(Self::Vegetarian),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
	Hot,
	Cold,
}
impl Temperature {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"hot" => Some(Self::Hot),
			"cold" => Some(Self::Cold),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Milk {
	#[serde(rename = "milk")]
	Milk,
	#[serde(rename = "non-milk")]
	NonMilk,
}
impl Milk {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"milk" => Some(Self::Milk),
			"non-milk" => Some(Self::NonMilk),
			_ => None,
		}
	}
}

/// Structured filters for one request. Every field is always present; absent constraints are
/// `None` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
	pub max_price: Option<u32>,
	pub min_price: Option<u32>,
	pub diet: Vec<Diet>,
	pub temperature: Vec<Temperature>,
	pub milk: Option<Milk>,
	pub category_hint: Option<String>,
}
impl Constraint {
	/// Builds a constraint from untrusted model output, keeping only enumerated safe values.
	///
	/// Anything that is not a JSON object yields the default constraint.
	pub fn from_value(value: &Value) -> Self {
		let Some(obj) = value.as_object() else {
			return Self::default();
		};

		Self {
			max_price: obj.get("max_price").and_then(bounded_price),
			min_price: obj.get("min_price").and_then(bounded_price),
			diet: enum_list(obj, "diet", Diet::parse),
			temperature: enum_list(obj, "temperature", Temperature::parse),
			milk: obj.get("milk").and_then(Value::as_str).and_then(Milk::parse),
			category_hint: obj
				.get("category_hint")
				.and_then(Value::as_str)
				.map(str::trim)
				.filter(|hint| !hint.is_empty())
				.map(str::to_string),
		}
	}

	pub fn wants(&self, diet: Diet) -> bool {
		self.diet.contains(&diet)
	}

	pub fn is_unconstrained(&self) -> bool {
		self == &Self::default()
	}
}

fn bounded_price(value: &Value) -> Option<u32> {
	let number = value.as_f64()?;

	if number > 0.0 && number < PRICE_BOUND { Some(number.trunc() as u32) } else { None }
}

fn enum_list<T>(obj: &Map<String, Value>, key: &str, parse: fn(&str) -> Option<T>) -> Vec<T>
where
	T: PartialEq,
{
	let Some(entries) = obj.get(key).and_then(Value::as_array) else {
		return Vec::new();
	};
	let mut out = Vec::with_capacity(entries.len());

	for parsed in entries.iter().filter_map(Value::as_str).filter_map(parse) {
		if !out.contains(&parsed) {
			out.push(parsed);
		}
	}

	out
}

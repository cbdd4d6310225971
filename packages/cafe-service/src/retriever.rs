use cafe_config::{Config, Retrieval};
use cafe_domain::{
	constraint::{Constraint, Diet},
	menu::SearchResult,
};
use cafe_storage::{MenuIndex, descriptor::IndexDescriptor, menu_index::ArtifactPaths};

use crate::{Error, Providers, Result};

/// Parameters of one retrieval call. Filters apply in field order after the vector search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
	pub top_k: usize,
	pub require_in_stock: bool,
	pub max_price: Option<u32>,
	pub diet: Vec<Diet>,
	pub min_price: Option<u32>,
	pub category_ids: Option<Vec<String>>,
	pub subcategory_ids: Option<Vec<String>>,
	pub group_ids: Option<Vec<String>>,
}
impl SearchOptions {
	pub fn new(retrieval: &Retrieval) -> Self {
		Self {
			top_k: retrieval.top_k as usize,
			require_in_stock: retrieval.require_in_stock,
			max_price: None,
			diet: Vec::new(),
			min_price: None,
			category_ids: None,
			subcategory_ids: None,
			group_ids: None,
		}
	}

	/// The pipeline forwards only the price ceiling and diet of a constraint.
	pub fn for_constraint(retrieval: &Retrieval, constraint: &Constraint) -> Self {
		Self { max_price: constraint.max_price, diet: constraint.diet.clone(), ..Self::new(retrieval) }
	}
}

pub struct Retriever {
	index: MenuIndex,
}
impl Retriever {
	/// Opens the artifacts named by `cfg.storage` and checks them against the embedding config.
	pub fn load(cfg: &Config) -> Result<Self> {
		let index = MenuIndex::open(&ArtifactPaths::from_config(&cfg.storage))?;

		Self::from_index(cfg, index)
	}

	pub fn from_index(cfg: &Config, index: MenuIndex) -> Result<Self> {
		let embedding = &cfg.providers.embedding;
		let descriptor = index.descriptor();

		if embedding.model != descriptor.embedding_model {
			return Err(Error::StorageIntegrity {
				message: format!(
					"Configured embedding model {} differs from index model {}.",
					embedding.model, descriptor.embedding_model
				),
			});
		}
		if embedding.dimensions != index.dimension() {
			return Err(Error::StorageIntegrity {
				message: format!(
					"Configured embedding dimension {} differs from index dimension {}.",
					embedding.dimensions,
					index.dimension()
				),
			});
		}

		Ok(Self { index })
	}

	pub fn descriptor(&self) -> &IndexDescriptor {
		self.index.descriptor()
	}

	pub fn len(&self) -> usize {
		self.index.len()
	}

	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	/// Embeds `query`, takes the `top_k` nearest items, then filters them without reordering.
	pub async fn search(
		&self,
		providers: &Providers,
		cfg: &Config,
		query: &str,
		options: &SearchOptions,
	) -> Result<Vec<SearchResult>> {
		let texts = vec![query.to_string()];
		let embeddings = providers.embedding.embed(&cfg.providers.embedding, &texts).await?;
		let Some(vector) = embeddings.into_iter().next() else {
			return Err(Error::Retrieval {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};
		let vector = normalize(vector)?;
		let candidates = self
			.index
			.search(&vector, options.top_k)
			.map_err(|err| Error::Retrieval { message: err.to_string() })?;
		let candidate_count = candidates.len();
		let results = apply_filters(candidates, options);

		tracing::debug!(
			candidates = candidate_count,
			survivors = results.len(),
			"Menu search finished."
		);

		Ok(results)
	}
}

/// Scales `vector` to unit length so inner product equals cosine similarity.
pub fn normalize(mut vector: Vec<f32>) -> Result<Vec<f32>> {
	let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

	if !norm.is_finite() || norm == 0.0 {
		return Err(Error::Retrieval {
			message: "Query embedding has zero or non-finite norm.".to_string(),
		});
	}

	for x in &mut vector {
		*x /= norm;
	}

	Ok(vector)
}

/// Applies the post-filter chain in its fixed order, preserving score order.
pub fn apply_filters(candidates: Vec<SearchResult>, options: &SearchOptions) -> Vec<SearchResult> {
	let wants_vegan = options.diet.contains(&Diet::Vegan);

	candidates
		.into_iter()
		.filter(|result| !options.require_in_stock || result.item.in_stock)
		.filter(|result| match options.max_price {
			Some(max) => result.item.price.is_some_and(|price| price <= i64::from(max)),
			None => true,
		})
		.filter(|result| !wants_vegan || result.item.is_vegan_group())
		.filter(|result| match options.min_price {
			Some(min) => result.item.price.is_some_and(|price| price >= i64::from(min)),
			None => true,
		})
		.filter(|result| {
			allowed(options.category_ids.as_deref(), result.item.category_id.as_deref())
		})
		.filter(|result| {
			allowed(options.subcategory_ids.as_deref(), result.item.sub_category_id.as_deref())
		})
		.filter(|result| allowed(options.group_ids.as_deref(), result.item.group_id.as_deref()))
		.collect()
}

fn allowed(allow_list: Option<&[String]>, value: Option<&str>) -> bool {
	match allow_list {
		Some(list) => value.is_some_and(|value| list.iter().any(|entry| entry == value)),
		None => true,
	}
}

#[cfg(test)]
mod tests {
	use cafe_domain::menu::MenuItem;

	use super::*;

	fn candidate(
		name: &str,
		price: Option<i64>,
		in_stock: bool,
		group: &str,
		score: f32,
	) -> SearchResult {
		SearchResult {
			item: MenuItem {
				vector_id: 0,
				item_id: name.to_string(),
				name: name.to_string(),
				price,
				in_stock,
				category_id: Some("drinks".to_string()),
				sub_category_id: Some("cold".to_string()),
				group_id: Some(group.to_string()),
			},
			score,
		}
	}

	fn options() -> SearchOptions {
		SearchOptions::new(&Retrieval::default())
	}

	fn names(results: &[SearchResult]) -> Vec<&str> {
		results.iter().map(|result| result.item.name.as_str()).collect()
	}

	fn candidates() -> Vec<SearchResult> {
		vec![
			candidate("Cafe Latte", Some(220), true, "milk-based", 0.9),
			candidate("Lemon Iced Tea", Some(150), true, "nonmilk-tea", 0.8),
			candidate("Seasonal Special", None, true, "black-coffee", 0.7),
			candidate("Pour Over", Some(190), false, "manual-brew", 0.6),
			candidate("Americano", Some(140), true, "BLACK_COFFEE", 0.5),
		]
	}

	#[test]
	fn stock_filter_drops_unavailable_items() {
		let results = apply_filters(candidates(), &options());

		assert!(results.iter().all(|result| result.item.in_stock));
		assert_eq!(results.len(), 4);

		let results =
			apply_filters(candidates(), &SearchOptions { require_in_stock: false, ..options() });

		assert_eq!(results.len(), 5);
	}

	#[test]
	fn price_ceiling_drops_unknown_and_expensive_items() {
		let results =
			apply_filters(candidates(), &SearchOptions { max_price: Some(200), ..options() });

		assert_eq!(names(&results), vec!["Lemon Iced Tea", "Americano"]);
	}

	#[test]
	fn vegan_filter_uses_group_markers_and_keeps_order() {
		let results =
			apply_filters(candidates(), &SearchOptions { diet: vec![Diet::Vegan], ..options() });

		assert_eq!(names(&results), vec!["Lemon Iced Tea", "Seasonal Special", "Americano"]);
	}

	#[test]
	fn vegetarian_alone_filters_nothing() {
		let results =
			apply_filters(candidates(), &SearchOptions { diet: vec![Diet::Vegetarian], ..options() });

		assert_eq!(results.len(), 4);
	}

	#[test]
	fn extra_filters_apply_after_diet() {
		let results = apply_filters(
			candidates(),
			&SearchOptions {
				min_price: Some(145),
				group_ids: Some(vec!["nonmilk-tea".to_string(), "milk-based".to_string()]),
				..options()
			},
		);

		assert_eq!(names(&results), vec!["Cafe Latte", "Lemon Iced Tea"]);

		let results = apply_filters(
			candidates(),
			&SearchOptions { category_ids: Some(vec!["food".to_string()]), ..options() },
		);

		assert!(results.is_empty());
	}

	#[test]
	fn for_constraint_forwards_ceiling_and_diet_only() {
		let constraint = Constraint {
			max_price: Some(200),
			min_price: Some(50),
			diet: vec![Diet::Vegan],
			..Constraint::default()
		};
		let options = SearchOptions::for_constraint(&Retrieval::default(), &constraint);

		assert_eq!(options.top_k, 50);
		assert_eq!(options.max_price, Some(200));
		assert_eq!(options.min_price, None);
		assert_eq!(options.diet, vec![Diet::Vegan]);
	}

	#[test]
	fn normalize_rejects_zero_vectors() {
		let unit = normalize(vec![3.0, 4.0]).expect("normalize failed");

		assert!((unit[0] - 0.6).abs() < 1e-6 && (unit[1] - 0.8).abs() < 1e-6);
		assert!(matches!(normalize(vec![0.0, 0.0]), Err(Error::Retrieval { .. })));
	}
}

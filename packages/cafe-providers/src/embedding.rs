use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
	index: Option<usize>,
	embedding: Vec<f32>,
}

pub async fn embed(
	cfg: &cafe_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = crate::client(cfg.timeout_ms)?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embeddings(json, texts.len(), cfg.dimensions)
}

/// Places each returned vector at its input position.
///
/// The response must hold exactly one vector of `dimensions` components per input. Rows without
/// an `index` take their position in the array.
pub fn parse_embeddings(json: Value, inputs: usize, dimensions: u32) -> Result<Vec<Vec<f32>>> {
	let response: EmbeddingResponse =
		serde_json::from_value(json).map_err(|err| Error::InvalidResponse {
			message: format!("Embedding response is malformed: {err}."),
		})?;

	if response.data.len() != inputs {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response holds {} vectors for {inputs} inputs.",
				response.data.len()
			),
		});
	}

	let mut slots: Vec<Option<Vec<f32>>> = vec![None; inputs];

	for (position, row) in response.data.into_iter().enumerate() {
		let index = row.index.unwrap_or(position);

		if row.embedding.len() != dimensions as usize {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding {index} has {} components, expected {dimensions}.",
					row.embedding.len()
				),
			});
		}

		let Some(slot) = slots.get_mut(index) else {
			return Err(Error::InvalidResponse {
				message: format!("Embedding index {index} is out of range for {inputs} inputs."),
			});
		};

		if slot.is_some() {
			return Err(Error::InvalidResponse {
				message: format!("Embedding index {index} appears more than once."),
			});
		}

		*slot = Some(row.embedding);
	}

	// Every slot is filled: `inputs` rows landed on distinct in-range indices.
	Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn rows_land_at_their_index() {
		let json = json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});

		assert_eq!(
			parse_embeddings(json, 2, 2).expect("parse failed"),
			vec![vec![0.5, 1.5], vec![2.0, 3.0]]
		);
	}

	#[test]
	fn rejects_malformed_rows() {
		let bad_component = json!({ "data": [{ "embedding": [0.1, "x"] }] });
		let duplicate = json!({
			"data": [{ "index": 0, "embedding": [1.0] }, { "index": 0, "embedding": [2.0] }]
		});

		assert!(matches!(parse_embeddings(bad_component, 1, 2), Err(Error::InvalidResponse { .. })));
		assert!(matches!(parse_embeddings(duplicate, 2, 1), Err(Error::InvalidResponse { .. })));
		assert!(parse_embeddings(json!({}), 1, 2).is_err());
	}
}

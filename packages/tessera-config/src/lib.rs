mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Fusion, GraphSearch, HopWeights, Keyword, LlmProviderConfig,
	Postgres, Providers, Qdrant, Search, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_extractor", &cfg.providers.llm_extractor.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "search.candidate_multiplier must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.score_threshold.is_finite() || !(0.0..1.0).contains(&cfg.search.score_threshold)
	{
		return Err(Error::Validation {
			message: "search.score_threshold must be in the range 0.0..1.0.".to_string(),
		});
	}
	if cfg.search.store_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.store_timeout_ms must be greater than zero.".to_string(),
		});
	}

	let graph = &cfg.search.graph;

	if graph.max_depth == 0 {
		return Err(Error::Validation {
			message: "search.graph.max_depth must be greater than zero.".to_string(),
		});
	}
	if graph.entity_match_limit == 0 {
		return Err(Error::Validation {
			message: "search.graph.entity_match_limit must be greater than zero.".to_string(),
		});
	}
	if graph.related_chunk_limit == 0 {
		return Err(Error::Validation {
			message: "search.graph.related_chunk_limit must be greater than zero.".to_string(),
		});
	}

	let weights = &graph.hop_weights;

	for (label, weight) in [
		("direct", weights.direct),
		("adjacent", weights.adjacent),
		("extended", weights.extended),
		("beyond", weights.beyond),
	] {
		if !weight.is_finite() || !(0.0..=1.0).contains(&weight) || weight == 0.0 {
			return Err(Error::Validation {
				message: format!(
					"search.graph.hop_weights.{label} must be in the range 0.0 (exclusive) to 1.0."
				),
			});
		}
	}
	if !(weights.direct > weights.adjacent
		&& weights.adjacent > weights.extended
		&& weights.extended > weights.beyond)
	{
		return Err(Error::Validation {
			message: "search.graph.hop_weights must decay strictly with hop distance.".to_string(),
		});
	}

	let fusion = &cfg.search.fusion;

	for (label, weight) in [
		("vector_weight", fusion.vector_weight),
		("graph_weight", fusion.graph_weight),
		("keyword_weight", fusion.keyword_weight),
	] {
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::Validation {
				message: format!("search.fusion.{label} must be a finite non-negative number."),
			});
		}
	}
	if fusion.vector_weight == 0.0 {
		return Err(Error::Validation {
			message: "search.fusion.vector_weight must be greater than zero.".to_string(),
		});
	}

	if cfg.search.keyword.max_query_terms == 0 {
		return Err(Error::Validation {
			message: "search.keyword.max_query_terms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.keyword.max_text_terms == 0 {
		return Err(Error::Validation {
			message: "search.keyword.max_text_terms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.storage.qdrant.api_key = None;
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}

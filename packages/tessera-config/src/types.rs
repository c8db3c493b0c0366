use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_extractor: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub top_k: u32,
	/// Vector candidate pool size as a multiple of `top_k`, leaving room for
	/// graph filtering and fusion.
	pub candidate_multiplier: u32,
	/// Minimum cosine similarity for vector hits. Deliberately permissive: a
	/// strict threshold silently drops valid results before fusion can rank
	/// them.
	pub score_threshold: f32,
	/// Applied to each store call on the search path; an elapsed timeout
	/// degrades that signal rather than failing the query.
	pub store_timeout_ms: u64,
	#[serde(default)]
	pub graph: GraphSearch,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub keyword: Keyword,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphSearch {
	pub max_depth: u32,
	pub entity_match_limit: u32,
	pub related_chunk_limit: u32,
	pub hop_weights: HopWeights,
}
impl Default for GraphSearch {
	fn default() -> Self {
		Self {
			max_depth: 2,
			entity_match_limit: 10,
			related_chunk_limit: 20,
			hop_weights: HopWeights::default(),
		}
	}
}

/// Relevance assigned to a chunk by how far its entity sits from a matched
/// entity. Must decay strictly with distance.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HopWeights {
	pub direct: f32,
	pub adjacent: f32,
	pub extended: f32,
	pub beyond: f32,
}
impl Default for HopWeights {
	fn default() -> Self {
		Self { direct: 1.0, adjacent: 0.8, extended: 0.5, beyond: 0.3 }
	}
}

/// Signal weights for score fusion. Normalized by their sum at use, so only
/// the ratios matter.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
	pub vector_weight: f32,
	pub graph_weight: f32,
	pub keyword_weight: f32,
}
impl Default for Fusion {
	fn default() -> Self {
		Self { vector_weight: 0.5, graph_weight: 0.3, keyword_weight: 0.2 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Keyword {
	pub max_query_terms: u32,
	pub max_text_terms: u32,
}
impl Default for Keyword {
	fn default() -> Self {
		Self { max_query_terms: 16, max_text_terms: 1_024 }
	}
}

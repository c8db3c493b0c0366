use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use tessera_domain::modality::Modality;
use tessera_storage::qdrant::{ChunkRecord, ScoredChunk};

use crate::{
	Error, Result, SearchService,
	fusion::{self, Candidate, FusionWeights},
	graph_search::{self, GraphSignal},
	keyword,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub top_k: Option<u32>,
	pub modality: Option<Modality>,
}

/// Which retrieval signals contributed to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
	Vector,
	Graph,
	Keyword,
}

/// Per-signal score breakdown behind a result's fused score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchExplain {
	pub vector_score: Option<f32>,
	pub graph_weight: Option<f32>,
	pub keyword_score: f32,
	pub final_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
	pub chunk_id: Uuid,
	pub content: String,
	pub modality: Modality,
	pub metadata: serde_json::Value,
	pub score: f32,
	pub sources: Vec<Signal>,
	pub explain: SearchExplain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
}

impl SearchService {
	/// Runs one hybrid query: vector similarity and graph traversal in
	/// parallel, the graph-derived entity filter, a keyword overlap pass,
	/// and weighted fusion into a deduplicated, deterministically ordered
	/// top-K list.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.query.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must not be empty.".to_string() });
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k).max(1);
		let candidate_k = top_k.saturating_mul(self.cfg.search.candidate_multiplier);
		let store_timeout = Duration::from_millis(self.cfg.search.store_timeout_ms);

		info!(%query, top_k, "Running hybrid search.");

		let vector_branch = async {
			let vector = self.embed_query(&query).await?;

			tokio::time::timeout(
				store_timeout,
				self.backends.vector.similarity_search(
					vector,
					candidate_k,
					self.cfg.search.score_threshold,
					req.modality,
				),
			)
			.await
			.map_err(|_| Error::VectorIndex { message: "Similarity search timed out.".to_string() })?
			.map_err(|err| Error::VectorIndex { message: err.to_string() })
		};
		let (vector_hits, graph_outcome) =
			tokio::join!(vector_branch, graph_search::signal(self, &query));
		// The vector index is the only store whose absence is fatal; without
		// it there is nothing to rank.
		let vector_hits: Vec<ScoredChunk> = vector_hits?;
		let graph_signal = match graph_outcome {
			Ok(signal) => signal,
			Err(err) => {
				warn!(error = %err, "Graph search degraded; skipping the entity filter.");

				GraphSignal::NoEntityIntent
			},
		};

		let (pool, graph_weights) = match graph_signal {
			GraphSignal::EntityUnmatched => {
				// The query named something specific that the knowledge base
				// does not hold. Similar-but-unrelated content would be wrong
				// here, so no fallback to the unfiltered vector hits.
				info!("Named entity not found in the graph; returning no results.");

				return Ok(SearchResponse { items: Vec::new() });
			},
			GraphSignal::NoEntityIntent => {
				let pool: Vec<(ChunkRecord, Option<f32>)> =
					vector_hits.into_iter().map(|hit| (hit.chunk, Some(hit.score))).collect();

				(pool, HashMap::new())
			},
			GraphSignal::Related(related) => {
				let graph_weights: HashMap<Uuid, f32> =
					related.iter().map(|chunk| (chunk.chunk_id, chunk.weight)).collect();
				let before = vector_hits.len();
				let mut pool: Vec<(ChunkRecord, Option<f32>)> = vector_hits
					.into_iter()
					.filter(|hit| graph_weights.contains_key(&hit.chunk.chunk_id))
					.map(|hit| (hit.chunk, Some(hit.score)))
					.collect();

				info!(
					kept = pool.len(),
					excluded = before - pool.len(),
					"Applied the graph entity filter."
				);

				let missing: Vec<Uuid> = graph_weights
					.keys()
					.filter(|chunk_id| {
						!pool.iter().any(|(chunk, _)| chunk.chunk_id == **chunk_id)
					})
					.copied()
					.collect();

				if !missing.is_empty() {
					// Graph-only chunks enter the pool without a similarity
					// score. Orphaned references simply come back missing.
					match tokio::time::timeout(
						store_timeout,
						self.backends.vector.retrieve_by_ids(&missing),
					)
					.await
					{
						Ok(Ok(chunks)) => {
							pool.extend(chunks.into_iter().map(|chunk| (chunk, None)));
						},
						Ok(Err(err)) => {
							warn!(error = %err, "Graph chunk retrieval degraded.");
						},
						Err(_) => {
							warn!("Graph chunk retrieval timed out.");
						},
					}
				}

				(pool, graph_weights)
			},
		};

		let keyword_cfg = &self.cfg.search.keyword;
		let query_tokens = keyword::tokenize(&query, keyword_cfg.max_query_terms as usize);
		let weights = FusionWeights::normalized(&self.cfg.search.fusion);
		let candidates: Vec<Candidate> = pool
			.into_iter()
			.map(|(chunk, vector_score)| {
				let keyword_score = keyword::overlap_score(
					&query_tokens,
					&chunk.content,
					keyword_cfg.max_text_terms as usize,
				);

				Candidate {
					vector_score,
					graph_weight: graph_weights.get(&chunk.chunk_id).copied(),
					keyword_score,
					chunk,
				}
			})
			.collect();
		let items = fusion::fuse(candidates, weights, top_k as usize);

		info!(results = items.len(), "Hybrid search complete.");

		Ok(SearchResponse { items })
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let embeddings = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&query.to_string()))
			.await?;
		let vector = embeddings.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}

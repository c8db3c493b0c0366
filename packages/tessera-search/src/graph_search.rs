use std::{collections::HashSet, time::Duration};

use tracing::debug;
use uuid::Uuid;

use tessera_config::HopWeights;
use tessera_domain::query_terms;

use crate::{Error, Result, SearchService};

/// A chunk reachable from an entity named in the query, with its traversal
/// relevance already resolved from the hop distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelatedChunk {
	pub chunk_id: Uuid,
	pub weight: f32,
}

/// Outcome of the graph side of a query. The three states drive different
/// downstream behavior and must not be collapsed: an absent entity yields an
/// empty result set, while an entity-free query skips filtering entirely.
#[derive(Debug, Clone)]
pub enum GraphSignal {
	/// The query names nothing graph-shaped; no filter applies.
	NoEntityIntent,
	/// Candidate names were extracted but none resolved to retrievable
	/// chunks in the knowledge base.
	EntityUnmatched,
	/// Matched entities and the chunks connected to them.
	Related(Vec<RelatedChunk>),
}

pub(crate) async fn signal(service: &SearchService, query: &str) -> Result<GraphSignal> {
	let candidates = query_terms::entity_candidates(query);

	if candidates.is_empty() {
		return Ok(GraphSignal::NoEntityIntent);
	}

	debug!(?candidates, "Graph lookup candidates.");

	let graph_cfg = &service.cfg.search.graph;
	let timeout = Duration::from_millis(service.cfg.search.store_timeout_ms);
	let entities = tokio::time::timeout(
		timeout,
		service.backends.graph.find_entities_by_name(&candidates, graph_cfg.entity_match_limit),
	)
	.await
	.map_err(|_| Error::GraphIndex { message: "Entity lookup timed out.".to_string() })?
	.map_err(|err| Error::GraphIndex { message: err.to_string() })?;

	if entities.is_empty() {
		return Ok(GraphSignal::EntityUnmatched);
	}

	let mut seen = HashSet::new();
	let entity_ids: Vec<Uuid> = entities
		.iter()
		.map(|entity| entity.entity_id)
		.filter(|entity_id| seen.insert(*entity_id))
		.collect();

	debug!(matched = entity_ids.len(), "Matched graph entities.");

	let related_rows = tokio::time::timeout(
		timeout,
		service.backends.graph.find_related_chunks(
			&entity_ids,
			graph_cfg.max_depth,
			graph_cfg.related_chunk_limit,
		),
	)
	.await
	.map_err(|_| Error::GraphIndex { message: "Graph traversal timed out.".to_string() })?
	.map_err(|err| Error::GraphIndex { message: err.to_string() })?;

	if related_rows.is_empty() {
		return Ok(GraphSignal::EntityUnmatched);
	}

	let related = related_rows
		.into_iter()
		.map(|row| RelatedChunk {
			chunk_id: row.chunk_id,
			weight: hop_weight(&graph_cfg.hop_weights, row.hop_distance),
		})
		.collect();

	Ok(GraphSignal::Related(related))
}

/// Maps a hop distance to its relevance tier. The store reports the minimum
/// distance per chunk, which under strict decay is also the maximum weight.
pub fn hop_weight(weights: &HopWeights, distance: u32) -> f32 {
	match distance {
		0 => weights.direct,
		1 => weights.adjacent,
		2 => weights.extended,
		_ => weights.beyond,
	}
}

use std::{cmp::Ordering, collections::HashMap};

use uuid::Uuid;

use tessera_config::Fusion;
use tessera_storage::qdrant::ChunkRecord;

use crate::search::{SearchExplain, SearchItem, Signal};

/// Signal weights normalized to sum to one, so configured weights only
/// express ratios and fused scores stay comparable across policies.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
	pub vector: f32,
	pub graph: f32,
	pub keyword: f32,
}
impl FusionWeights {
	pub fn normalized(cfg: &Fusion) -> Self {
		let total = cfg.vector_weight + cfg.graph_weight + cfg.keyword_weight;

		Self {
			vector: cfg.vector_weight / total,
			graph: cfg.graph_weight / total,
			keyword: cfg.keyword_weight / total,
		}
	}
}

/// One chunk with its per-signal scores, ready for fusion. A `None` signal
/// contributed nothing and is distinguishable from a zero score in the
/// result's provenance.
#[derive(Debug, Clone)]
pub struct Candidate {
	pub chunk: ChunkRecord,
	pub vector_score: Option<f32>,
	pub graph_weight: Option<f32>,
	pub keyword_score: f32,
}

/// Fuses candidates into the final ranked list: weighted sum per chunk, best
/// score wins on duplicates, deterministic order (score descending, chunk id
/// ascending on ties), truncated to `top_k`.
pub fn fuse(candidates: Vec<Candidate>, weights: FusionWeights, top_k: usize) -> Vec<SearchItem> {
	let mut best: HashMap<Uuid, SearchItem> = HashMap::new();

	for candidate in candidates {
		let item = score(candidate, weights);

		match best.get(&item.chunk_id) {
			Some(existing) if existing.score >= item.score => {},
			_ => {
				best.insert(item.chunk_id, item);
			},
		}
	}

	let mut items: Vec<SearchItem> = best.into_values().collect();

	items.sort_by(|a, b| {
		b.score
			.partial_cmp(&a.score)
			.unwrap_or(Ordering::Equal)
			.then_with(|| a.chunk_id.cmp(&b.chunk_id))
	});
	items.truncate(top_k);

	items
}

fn score(candidate: Candidate, weights: FusionWeights) -> SearchItem {
	let final_score = weights.vector * candidate.vector_score.unwrap_or(0.0)
		+ weights.graph * candidate.graph_weight.unwrap_or(0.0)
		+ weights.keyword * candidate.keyword_score;
	let mut sources = Vec::new();

	if candidate.vector_score.is_some() {
		sources.push(Signal::Vector);
	}
	if candidate.graph_weight.is_some() {
		sources.push(Signal::Graph);
	}
	if candidate.keyword_score > 0.0 {
		sources.push(Signal::Keyword);
	}

	SearchItem {
		chunk_id: candidate.chunk.chunk_id,
		content: candidate.chunk.content,
		modality: candidate.chunk.modality,
		metadata: candidate.chunk.metadata,
		score: final_score,
		sources,
		explain: SearchExplain {
			vector_score: candidate.vector_score,
			graph_weight: candidate.graph_weight,
			keyword_score: candidate.keyword_score,
			final_score,
		},
	}
}

use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use uuid::Uuid;

use tessera_config::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Qdrant, Search, Service, Storage,
};
use tessera_domain::modality::Modality;
use tessera_search::{
	Backends, BoxFuture, EmbeddingProvider, GraphIndex, Providers, SearchRequest, SearchService,
	Signal, VectorIndex,
};
use tessera_storage::{
	models::{GraphEntityRow, RelatedChunkRow},
	qdrant::{ChunkRecord, ScoredChunk},
};

const VECTOR_DIM: u32 = 4;

struct StubEmbedding;

impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		let vectors = texts.iter().map(|_| vec![0.1; VECTOR_DIM as usize]).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Vector index fake: each chunk carries a fixed similarity score that stands
/// in for the cosine of its stored vector against any query.
#[derive(Default)]
struct FakeVectorIndex {
	chunks: Vec<(ChunkRecord, f32)>,
}
impl FakeVectorIndex {
	fn with_chunk(mut self, chunk: ChunkRecord, similarity: f32) -> Self {
		self.chunks.push((chunk, similarity));

		self
	}
}
impl VectorIndex for FakeVectorIndex {
	fn similarity_search<'a>(
		&'a self,
		_vector: Vec<f32>,
		limit: u32,
		score_threshold: f32,
		modality: Option<Modality>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunk>>> {
		let mut hits: Vec<ScoredChunk> = self
			.chunks
			.iter()
			.filter(|(_, similarity)| *similarity >= score_threshold)
			.filter(|(chunk, _)| modality.is_none_or(|wanted| chunk.modality == wanted))
			.map(|(chunk, similarity)| ScoredChunk { chunk: chunk.clone(), score: *similarity })
			.collect();

		hits.sort_by(|a, b| {
			b.score
				.partial_cmp(&a.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.chunk.chunk_id.cmp(&b.chunk.chunk_id))
		});
		hits.truncate(limit as usize);

		Box::pin(async move { Ok(hits) })
	}

	fn retrieve_by_ids<'a>(
		&'a self,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>> {
		let wanted: HashSet<Uuid> = ids.iter().copied().collect();
		let chunks: Vec<ChunkRecord> = self
			.chunks
			.iter()
			.filter(|(chunk, _)| wanted.contains(&chunk.chunk_id))
			.map(|(chunk, _)| chunk.clone())
			.collect();

		Box::pin(async move { Ok(chunks) })
	}
}

struct FailingVectorIndex;

impl VectorIndex for FailingVectorIndex {
	fn similarity_search<'a>(
		&'a self,
		_vector: Vec<f32>,
		_limit: u32,
		_score_threshold: f32,
		_modality: Option<Modality>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunk>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("vector store unreachable")) })
	}

	fn retrieve_by_ids<'a>(
		&'a self,
		_ids: &'a [Uuid],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("vector store unreachable")) })
	}
}

/// Graph index fake: substring entity matching plus breadth-first traversal
/// over undirected edges, minimum hop distance per chunk.
#[derive(Default)]
struct FakeGraphIndex {
	entities: Vec<GraphEntityRow>,
	edges: Vec<(Uuid, Uuid)>,
}
impl FakeGraphIndex {
	fn with_entity(mut self, entity_id: Uuid, name: &str, source_chunk_id: Uuid) -> Self {
		self.entities.push(GraphEntityRow {
			entity_id,
			name: name.to_string(),
			kind: "person".to_string(),
			description: None,
			confidence: 1.0,
			modality: "text".to_string(),
			source_chunk_id,
		});

		self
	}

	fn with_edge(mut self, source: Uuid, target: Uuid) -> Self {
		self.edges.push((source, target));

		self
	}
}
impl GraphIndex for FakeGraphIndex {
	fn find_entities_by_name<'a>(
		&'a self,
		names: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphEntityRow>>> {
		let patterns: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
		let mut seen = HashSet::new();
		let mut matched: Vec<GraphEntityRow> = self
			.entities
			.iter()
			.filter(|entity| {
				let name = entity.name.to_lowercase();

				patterns.iter().any(|pattern| name.contains(pattern))
			})
			.filter(|entity| seen.insert(entity.entity_id))
			.cloned()
			.collect();

		matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.entity_id.cmp(&b.entity_id)));
		matched.truncate(limit as usize);

		Box::pin(async move { Ok(matched) })
	}

	fn find_related_chunks<'a>(
		&'a self,
		entity_ids: &'a [Uuid],
		max_depth: u32,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RelatedChunkRow>>> {
		let chunk_by_entity: HashMap<Uuid, Uuid> = self
			.entities
			.iter()
			.map(|entity| (entity.entity_id, entity.source_chunk_id))
			.collect();
		let mut visited: HashSet<Uuid> = entity_ids
			.iter()
			.copied()
			.filter(|entity_id| chunk_by_entity.contains_key(entity_id))
			.collect();
		let mut chunk_distance: HashMap<Uuid, u32> = HashMap::new();

		for entity_id in &visited {
			chunk_distance.entry(chunk_by_entity[entity_id]).or_insert(0);
		}

		let mut frontier: Vec<Uuid> = visited.iter().copied().collect();

		for depth in 1..=max_depth {
			let mut next = Vec::new();

			for (source, target) in &self.edges {
				for (from, to) in [(source, target), (target, source)] {
					if frontier.contains(from) && visited.insert(*to) {
						next.push(*to);
					}
				}
			}

			if next.is_empty() {
				break;
			}

			for entity_id in &next {
				if let Some(chunk_id) = chunk_by_entity.get(entity_id) {
					chunk_distance.entry(*chunk_id).or_insert(depth);
				}
			}

			frontier = next;
		}

		let mut related: Vec<RelatedChunkRow> = chunk_distance
			.into_iter()
			.map(|(chunk_id, hop_distance)| RelatedChunkRow { chunk_id, hop_distance })
			.collect();

		related.sort_by(|a, b| {
			a.hop_distance.cmp(&b.hop_distance).then_with(|| a.chunk_id.cmp(&b.chunk_id))
		});
		related.truncate(limit as usize);

		Box::pin(async move { Ok(related) })
	}
}

struct FailingGraphIndex;

impl GraphIndex for FailingGraphIndex {
	fn find_entities_by_name<'a>(
		&'a self,
		_names: &'a [String],
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphEntityRow>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("graph store unreachable")) })
	}

	fn find_related_chunks<'a>(
		&'a self,
		_entity_ids: &'a [Uuid],
		_max_depth: u32,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RelatedChunkRow>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("graph store unreachable")) })
	}
}

fn test_config(score_threshold: f32) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres {
				dsn: "postgres://localhost/unused".to_string(),
				pool_max_conns: 1,
			},
			qdrant: Qdrant {
				url: "http://localhost:6334".to_string(),
				collection: "unused".to_string(),
				vector_dim: VECTOR_DIM,
				api_key: None,
			},
		},
		providers: tessera_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "stub".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "stub".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "stub".to_string(),
				dimensions: VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			llm_extractor: LlmProviderConfig {
				provider_id: "stub".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "stub".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "stub".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
		},
		search: Search {
			top_k: 10,
			candidate_multiplier: 4,
			score_threshold,
			store_timeout_ms: 1_000,
			graph: Default::default(),
			fusion: Default::default(),
			keyword: Default::default(),
		},
	}
}

struct Fixture {
	andrew_chunk: Uuid,
	feifei_chunk: Uuid,
	stanford_chunk: Uuid,
	elon_chunk: Uuid,
	photo_chunk: Uuid,
	vector: FakeVectorIndex,
	graph: FakeGraphIndex,
}

/// A small knowledge base: chunks about two AI researchers at Stanford, one
/// about Stanford itself, one about Elon Musk, and one image chunk. Andrew Ng
/// is linked to the Stanford entity; Fei-Fei Li is deliberately not, so an
/// Andrew-scoped query must never surface her chunk.
fn fixture() -> Fixture {
	let andrew_chunk = Uuid::from_u128(0xA1);
	let feifei_chunk = Uuid::from_u128(0xB2);
	let stanford_chunk = Uuid::from_u128(0xC3);
	let elon_chunk = Uuid::from_u128(0xD4);
	let photo_chunk = Uuid::from_u128(0xE5);
	let vector = FakeVectorIndex::default()
		.with_chunk(
			text_chunk(
				andrew_chunk,
				"Andrew Ng is a computer scientist who teaches machine learning at Stanford.",
			),
			0.9,
		)
		.with_chunk(
			text_chunk(
				feifei_chunk,
				"Fei-Fei Li is a professor working on computer vision at Stanford.",
			),
			0.85,
		)
		.with_chunk(
			text_chunk(stanford_chunk, "Stanford University hosts leading AI research labs."),
			0.7,
		)
		.with_chunk(
			text_chunk(elon_chunk, "Elon Musk shared his opinion about AI safety."),
			0.8,
		)
		.with_chunk(
			ChunkRecord {
				chunk_id: photo_chunk,
				content: "A photo of Andrew Ng giving a lecture.".to_string(),
				modality: Modality::Image,
				metadata: serde_json::Value::Null,
			},
			0.6,
		);
	let andrew = Uuid::from_u128(0x11);
	let feifei = Uuid::from_u128(0x12);
	let stanford = Uuid::from_u128(0x13);
	let elon = Uuid::from_u128(0x14);
	let graph = FakeGraphIndex::default()
		.with_entity(andrew, "Andrew Ng", andrew_chunk)
		.with_entity(feifei, "Fei-Fei Li", feifei_chunk)
		.with_entity(stanford, "Stanford University", stanford_chunk)
		.with_entity(elon, "Elon Musk", elon_chunk)
		.with_edge(andrew, stanford);

	Fixture { andrew_chunk, feifei_chunk, stanford_chunk, elon_chunk, photo_chunk, vector, graph }
}

fn text_chunk(chunk_id: Uuid, content: &str) -> ChunkRecord {
	ChunkRecord {
		chunk_id,
		content: content.to_string(),
		modality: Modality::Text,
		metadata: serde_json::Value::Null,
	}
}

fn service_with(vector: impl VectorIndex + 'static, graph: impl GraphIndex + 'static) -> SearchService {
	service_with_config(test_config(0.3), vector, graph)
}

fn service_with_config(
	cfg: Config,
	vector: impl VectorIndex + 'static,
	graph: impl GraphIndex + 'static,
) -> SearchService {
	SearchService::with_backends(
		cfg,
		Backends::new(Arc::new(vector), Arc::new(graph)),
		Providers::new(Arc::new(StubEmbedding)),
	)
}

fn request(query: &str) -> SearchRequest {
	SearchRequest { query: query.to_string(), top_k: None, modality: None }
}

#[tokio::test]
async fn entity_query_filters_out_unconnected_chunks() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response = service
		.search(request("What is Andrew Ng's work in AI?"))
		.await
		.expect("Search must succeed.");

	assert!(!response.items.is_empty());
	assert_eq!(response.items[0].chunk_id, fixture.andrew_chunk);

	for item in &response.items {
		assert!(!item.content.contains("Fei-Fei"), "Unconnected chunk leaked: {}", item.content);
	}
}

#[tokio::test]
async fn entity_free_query_spans_the_whole_base() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response =
		service.search(request("Who talked about AI?")).await.expect("Search must succeed.");
	let ids: HashSet<Uuid> = response.items.iter().map(|item| item.chunk_id).collect();

	assert!(ids.contains(&fixture.andrew_chunk));
	assert!(ids.contains(&fixture.feifei_chunk));
	assert!(ids.contains(&fixture.elon_chunk));
}

#[tokio::test]
async fn absent_entity_returns_empty_not_similar_content() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response = service
		.search(request("What is Geoffrey Hinton's work in AI?"))
		.await
		.expect("Search must succeed.");

	assert!(response.items.is_empty());
}

#[tokio::test]
async fn possessive_query_resolves_the_entity() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response = service
		.search(request("What is Elon's opinion about AI"))
		.await
		.expect("Search must succeed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].chunk_id, fixture.elon_chunk);
	assert_eq!(response.items[0].explain.graph_weight, Some(1.0));
}

#[tokio::test]
async fn one_hop_chunks_carry_the_adjacent_weight() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response = service
		.search(request("What is Andrew Ng's work in AI?"))
		.await
		.expect("Search must succeed.");
	let weights: HashMap<Uuid, Option<f32>> = response
		.items
		.iter()
		.map(|item| (item.chunk_id, item.explain.graph_weight))
		.collect();

	assert_eq!(weights[&fixture.andrew_chunk], Some(1.0));
	assert_eq!(weights[&fixture.stanford_chunk], Some(0.8));
}

#[tokio::test]
async fn results_are_deduplicated_and_idempotent() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let first =
		service.search(request("Who talked about AI?")).await.expect("Search must succeed.");
	let second =
		service.search(request("Who talked about AI?")).await.expect("Search must succeed.");

	let mut seen = HashSet::new();

	for item in &first.items {
		assert!(seen.insert(item.chunk_id), "Duplicate chunk id in results.");
	}

	let first_json = serde_json::to_value(&first.items).expect("Items must serialize.");
	let second_json = serde_json::to_value(&second.items).expect("Items must serialize.");

	assert_eq!(first_json, second_json);
}

#[tokio::test]
async fn lowering_the_threshold_never_drops_results() {
	let strict = {
		let fixture = fixture();

		service_with_config(test_config(0.75), fixture.vector, fixture.graph)
			.search(request("Who talked about AI?"))
			.await
			.expect("Search must succeed.")
	};
	let permissive = {
		let fixture = fixture();

		service_with_config(test_config(0.3), fixture.vector, fixture.graph)
			.search(request("Who talked about AI?"))
			.await
			.expect("Search must succeed.")
	};
	let strict_ids: HashSet<Uuid> = strict.items.iter().map(|item| item.chunk_id).collect();
	let permissive_ids: HashSet<Uuid> =
		permissive.items.iter().map(|item| item.chunk_id).collect();

	assert!(strict_ids.is_subset(&permissive_ids));
	assert!(permissive_ids.len() > strict_ids.len());
}

#[tokio::test]
async fn orphaned_entity_reference_yields_empty_results() {
	let fixture = fixture();
	let orphan_entity = Uuid::from_u128(0x99);
	let orphan_chunk = Uuid::from_u128(0xF9);
	let graph = fixture.graph.with_entity(orphan_entity, "Orphan Corp", orphan_chunk);
	let service = service_with(fixture.vector, graph);
	let response = service
		.search(request("Tell me about Orphan Corp"))
		.await
		.expect("Orphaned references must not be errors.");

	assert!(response.items.is_empty());
}

#[tokio::test]
async fn graph_failure_degrades_to_unfiltered_search() {
	let fixture = fixture();
	let service = service_with(fixture.vector, FailingGraphIndex);
	let response = service
		.search(request("What is Andrew Ng's work in AI?"))
		.await
		.expect("Graph failure must not fail the query.");
	let ids: HashSet<Uuid> = response.items.iter().map(|item| item.chunk_id).collect();

	// Without the graph signal the entity filter cannot apply.
	assert!(ids.contains(&fixture.andrew_chunk));
	assert!(ids.contains(&fixture.feifei_chunk));
}

#[tokio::test]
async fn vector_failure_fails_the_query() {
	let fixture = fixture();
	let service = service_with(FailingVectorIndex, fixture.graph);

	assert!(service.search(request("Who talked about AI?")).await.is_err());
}

#[tokio::test]
async fn keyword_overlap_contributes_to_provenance() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response =
		service.search(request("machine learning lectures")).await.expect("Search must succeed.");
	let andrew = response
		.items
		.iter()
		.find(|item| item.chunk_id == fixture.andrew_chunk)
		.expect("Expected the machine learning chunk.");

	assert!(andrew.sources.contains(&Signal::Keyword));
	assert!(andrew.explain.keyword_score > 0.0);
}

#[tokio::test]
async fn modality_filter_narrows_the_pool() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response = service
		.search(SearchRequest {
			query: "Who talked about AI?".to_string(),
			top_k: None,
			modality: Some(Modality::Image),
		})
		.await
		.expect("Search must succeed.");

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].chunk_id, fixture.photo_chunk);
}

#[tokio::test]
async fn top_k_bounds_the_result_list() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);
	let response = service
		.search(SearchRequest {
			query: "Who talked about AI?".to_string(),
			top_k: Some(2),
			modality: None,
		})
		.await
		.expect("Search must succeed.");

	assert_eq!(response.items.len(), 2);
}

#[tokio::test]
async fn empty_query_is_rejected() {
	let fixture = fixture();
	let service = service_with(fixture.vector, fixture.graph);

	assert!(service.search(request("   ")).await.is_err());
}

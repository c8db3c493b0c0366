pub mod fusion;
pub mod graph_search;
pub mod keyword;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use search::{SearchExplain, SearchItem, SearchRequest, SearchResponse, Signal};

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use tessera_config::{Config, EmbeddingProviderConfig};
use tessera_domain::modality::Modality;
use tessera_providers::embedding;
use tessera_storage::{
	db::Db,
	graph,
	models::{GraphEntityRow, RelatedChunkRow},
	qdrant::{ChunkRecord, QdrantStore, ScoredChunk},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Read contract of the vector store. Unknown ids passed to
/// `retrieve_by_ids` must be omitted from the result, not errors.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn similarity_search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u32,
		score_threshold: f32,
		modality: Option<Modality>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunk>>>;

	fn retrieve_by_ids<'a>(&'a self, ids: &'a [Uuid])
	-> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>>;
}

/// Read contract of the graph store. `find_related_chunks` reports each
/// reachable chunk once with its minimum hop distance, distance 0 being a
/// matched entity's own source chunk.
pub trait GraphIndex
where
	Self: Send + Sync,
{
	fn find_entities_by_name<'a>(
		&'a self,
		names: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphEntityRow>>>;

	fn find_related_chunks<'a>(
		&'a self,
		entity_ids: &'a [Uuid],
		max_depth: u32,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RelatedChunkRow>>>;
}

struct DefaultEmbedding;

impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl VectorIndex for QdrantStore {
	fn similarity_search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u32,
		score_threshold: f32,
		modality: Option<Modality>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<ScoredChunk>>> {
		Box::pin(async move {
			Ok(QdrantStore::similarity_search(self, vector, limit, score_threshold, modality)
				.await?)
		})
	}

	fn retrieve_by_ids<'a>(
		&'a self,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ChunkRecord>>> {
		Box::pin(async move { Ok(QdrantStore::retrieve_by_ids(self, ids).await?) })
	}
}

impl GraphIndex for Db {
	fn find_entities_by_name<'a>(
		&'a self,
		names: &'a [String],
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<GraphEntityRow>>> {
		Box::pin(async move { Ok(graph::find_entities_by_name(&self.pool, names, limit).await?) })
	}

	fn find_related_chunks<'a>(
		&'a self,
		entity_ids: &'a [Uuid],
		max_depth: u32,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RelatedChunkRow>>> {
		Box::pin(async move {
			Ok(graph::find_related_chunks(&self.pool, entity_ids, max_depth, limit).await?)
		})
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultEmbedding) }
	}
}

#[derive(Clone)]
pub struct Backends {
	pub vector: Arc<dyn VectorIndex>,
	pub graph: Arc<dyn GraphIndex>,
}
impl Backends {
	pub fn new(vector: Arc<dyn VectorIndex>, graph: Arc<dyn GraphIndex>) -> Self {
		Self { vector, graph }
	}
}

/// The hybrid search engine. Policy lives in the config; stores and the
/// embedding provider sit behind trait seams so engines with different
/// policies and backends can coexist.
pub struct SearchService {
	pub cfg: Config,
	pub backends: Backends,
	pub providers: Providers,
}
impl SearchService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		Self {
			cfg,
			backends: Backends::new(Arc::new(qdrant), Arc::new(db)),
			providers: Providers::default(),
		}
	}

	pub fn with_backends(cfg: Config, backends: Backends, providers: Providers) -> Self {
		Self { cfg, backends, providers }
	}
}

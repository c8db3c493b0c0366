use std::collections::HashMap;

use qdrant_client::{
	Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, Distance, Filter, GetPointsBuilder, PointId,
		PointStruct, Query, QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
		point_id::PointIdOptions, value::Kind,
	},
};
use tessera_domain::modality::Modality;
use uuid::Uuid;

use crate::Result;

pub const CONTENT_KEY: &str = "content";
pub const MODALITY_KEY: &str = "modality";
pub const METADATA_KEY: &str = "metadata";

/// A chunk as stored in (or read back from) the vector index payload.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
	pub chunk_id: Uuid,
	pub content: String,
	pub modality: Modality,
	pub metadata: serde_json::Value,
}

/// A similarity-search hit: the chunk plus its cosine score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
	pub chunk: ChunkRecord,
	pub score: f32,
}

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &tessera_config::Qdrant) -> Result<Self> {
		let mut builder = qdrant_client::Qdrant::from_url(&cfg.url);

		if let Some(api_key) = cfg.api_key.as_deref() {
			builder = builder.api_key(api_key);
		}

		let client = builder.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		Ok(())
	}

	pub async fn upsert_chunk(&self, chunk: &ChunkRecord, vector: Vec<f32>) -> Result<()> {
		let mut payload = Payload::new();

		payload.insert(CONTENT_KEY, chunk.content.clone());
		payload.insert(MODALITY_KEY, chunk.modality.as_str());
		payload.insert(METADATA_KEY, chunk.metadata.clone());

		let point = PointStruct::new(chunk.chunk_id.to_string(), vector, payload);

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true))
			.await?;

		Ok(())
	}

	/// Nearest-neighbor search above `score_threshold`, optionally narrowed
	/// to one modality. Hits without a readable payload are dropped.
	pub async fn similarity_search(
		&self,
		vector: Vec<f32>,
		limit: u32,
		score_threshold: f32,
		modality: Option<Modality>,
	) -> Result<Vec<ScoredChunk>> {
		let mut query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(u64::from(limit))
			.score_threshold(score_threshold)
			.with_payload(true);

		if let Some(modality) = modality {
			query = query.filter(Filter::must([Condition::matches(
				MODALITY_KEY,
				modality.as_str().to_string(),
			)]));
		}

		let response = self.client.query(query).await?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(chunk_id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				continue;
			};
			let Some(chunk) = chunk_from_payload(chunk_id, &point.payload) else {
				continue;
			};

			out.push(ScoredChunk { chunk, score: point.score });
		}

		Ok(out)
	}

	/// Direct lookup. Unknown ids are omitted from the result, not errors;
	/// a graph entity may reference a chunk that was never indexed or has
	/// been cleaned up.
	pub async fn retrieve_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ChunkRecord>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let point_ids: Vec<PointId> = ids.iter().map(|id| PointId::from(id.to_string())).collect();
		let response = self
			.client
			.get_points(
				GetPointsBuilder::new(self.collection.clone(), point_ids)
					.with_payload(true)
					.with_vectors(false),
			)
			.await?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(chunk_id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				continue;
			};
			let Some(chunk) = chunk_from_payload(chunk_id, &point.payload) else {
				continue;
			};

			out.push(chunk);
		}

		Ok(out)
	}
}

fn chunk_from_payload(chunk_id: Uuid, payload: &HashMap<String, Value>) -> Option<ChunkRecord> {
	let content = payload_str(payload, CONTENT_KEY)?;
	let modality = payload_str(payload, MODALITY_KEY)
		.and_then(|value| Modality::parse(&value))
		.unwrap_or_default();
	let metadata =
		payload.get(METADATA_KEY).map(value_to_json).unwrap_or(serde_json::Value::Null);

	Some(ChunkRecord { chunk_id, content, modality, metadata })
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn value_to_json(value: &Value) -> serde_json::Value {
	match &value.kind {
		None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
		Some(Kind::BoolValue(inner)) => serde_json::Value::Bool(*inner),
		Some(Kind::IntegerValue(inner)) => serde_json::Value::from(*inner),
		Some(Kind::DoubleValue(inner)) => serde_json::Value::from(*inner),
		Some(Kind::StringValue(inner)) => serde_json::Value::String(inner.clone()),
		Some(Kind::ListValue(list)) =>
			serde_json::Value::Array(list.values.iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => serde_json::Value::Object(
			object.fields.iter().map(|(key, value)| (key.clone(), value_to_json(value))).collect(),
		),
	}
}

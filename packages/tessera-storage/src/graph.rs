use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{GraphEntityRow, NewEntity, NewRelation, RelatedChunkRow},
};
use tessera_domain::{modality::Modality, properties};

pub fn normalize_entity_name(input: &str) -> String {
	input.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub async fn upsert_entity(
	executor: &mut PgConnection,
	chunk_id: Uuid,
	modality: Modality,
	entity: &NewEntity,
) -> Result<Uuid> {
	let name = entity.name.trim();

	if name.is_empty() {
		return Err(Error::InvalidArgument("graph entity name must not be empty".to_string()));
	}

	let name_norm = normalize_entity_name(name);
	let entity_properties =
		serde_json::Value::Object(properties::to_json_map(entity.properties.clone()));
	let row: (Uuid,) = sqlx::query_as(
		"\
INSERT INTO graph_entities (
	entity_id,
	name,
	name_norm,
	kind,
	description,
	confidence,
	modality,
	source_chunk_id,
	properties,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
ON CONFLICT (name_norm, kind, source_chunk_id)
DO UPDATE
SET
	name = EXCLUDED.name,
	description = COALESCE(EXCLUDED.description, graph_entities.description),
	confidence = GREATEST(EXCLUDED.confidence, graph_entities.confidence),
	properties = graph_entities.properties || EXCLUDED.properties,
	updated_at = now()
RETURNING entity_id",
	)
	.bind(Uuid::new_v4())
	.bind(name)
	.bind(&name_norm)
	.bind(entity.kind.as_str())
	.bind(entity.description.as_deref())
	.bind(entity.confidence)
	.bind(modality.as_str())
	.bind(chunk_id)
	.bind(&entity_properties)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row.0)
}

pub async fn insert_relationship(
	executor: &mut PgConnection,
	chunk_id: Uuid,
	modality: Modality,
	source_entity_id: Uuid,
	target_entity_id: Uuid,
	relation: &NewRelation,
) -> Result<Uuid> {
	let relation_properties =
		serde_json::Value::Object(properties::to_json_map(relation.properties.clone()));
	let row: (Uuid,) = sqlx::query_as(
		"\
INSERT INTO graph_relationships (
	relationship_id,
	source_entity_id,
	target_entity_id,
	kind,
	confidence,
	modality,
	source_chunk_id,
	properties,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
ON CONFLICT (source_entity_id, target_entity_id, kind)
DO UPDATE
SET
	confidence = GREATEST(EXCLUDED.confidence, graph_relationships.confidence),
	properties = graph_relationships.properties || EXCLUDED.properties
RETURNING relationship_id",
	)
	.bind(Uuid::new_v4())
	.bind(source_entity_id)
	.bind(target_entity_id)
	.bind(relation.kind.as_str())
	.bind(relation.confidence)
	.bind(modality.as_str())
	.bind(chunk_id)
	.bind(&relation_properties)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row.0)
}

/// Persists one chunk's extraction output. Relationships referencing an
/// entity name that is not part of the same extraction are skipped; the
/// extractor occasionally invents endpoints and a dangling edge is worse than
/// a missing one.
pub async fn store_extraction(
	executor: &mut PgConnection,
	chunk_id: Uuid,
	modality: Modality,
	entities: &[NewEntity],
	relations: &[NewRelation],
) -> Result<(usize, usize)> {
	let mut ids_by_name: HashMap<String, Uuid> = HashMap::new();
	let mut stored_entities = 0;

	for entity in entities {
		let entity_id = upsert_entity(&mut *executor, chunk_id, modality, entity).await?;

		stored_entities += 1;

		ids_by_name.entry(normalize_entity_name(&entity.name)).or_insert(entity_id);
	}

	let mut stored_relations = 0;

	for relation in relations {
		let source = ids_by_name.get(&normalize_entity_name(&relation.source_name));
		let target = ids_by_name.get(&normalize_entity_name(&relation.target_name));
		let (Some(&source), Some(&target)) = (source, target) else {
			continue;
		};

		if source == target {
			continue;
		}

		insert_relationship(&mut *executor, chunk_id, modality, source, target, relation).await?;

		stored_relations += 1;
	}

	Ok((stored_entities, stored_relations))
}

/// Case-insensitive substring match of candidate names against entity names,
/// merged across candidates, bounded, and deterministically ordered.
pub async fn find_entities_by_name(
	pool: &PgPool,
	names: &[String],
	limit: u32,
) -> Result<Vec<GraphEntityRow>> {
	let patterns: Vec<String> = names
		.iter()
		.map(|name| escape_like(&normalize_entity_name(name)))
		.filter(|pattern| !pattern.is_empty())
		.collect();

	if patterns.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, GraphEntityRow>(
		"\
SELECT
	entity_id,
	name,
	kind,
	description,
	confidence,
	modality,
	source_chunk_id
FROM graph_entities
WHERE EXISTS (
	SELECT 1
	FROM UNNEST($1::text[]) AS candidate(pattern)
	WHERE graph_entities.name_norm LIKE '%' || candidate.pattern || '%'
)
ORDER BY name_norm, entity_id
LIMIT $2",
	)
	.bind(&patterns)
	.bind(i64::from(limit))
	.fetch_all(pool)
	.await?;

	Ok(rows)
}

/// Collects chunks reachable from the given entities within `max_depth`
/// relationship hops, following edges in either direction. Hop distance 0 is
/// the entity's own source chunk; where a chunk is reachable through several
/// paths the shortest distance wins. Orphaned chunk references are returned
/// as-is; the vector store drops them on retrieval.
pub async fn find_related_chunks(
	pool: &PgPool,
	entity_ids: &[Uuid],
	max_depth: u32,
	limit: u32,
) -> Result<Vec<RelatedChunkRow>> {
	if entity_ids.is_empty() {
		return Ok(Vec::new());
	}

	let seed_ids: Vec<Uuid> = entity_ids.to_vec();
	let seeds: Vec<(Uuid, Uuid)> = sqlx::query_as(
		"SELECT entity_id, source_chunk_id FROM graph_entities WHERE entity_id = ANY($1)",
	)
	.bind(&seed_ids)
	.fetch_all(pool)
	.await?;
	let mut visited: HashSet<Uuid> = seeds.iter().map(|(entity_id, _)| *entity_id).collect();
	let mut chunk_distance: HashMap<Uuid, u32> = HashMap::new();

	for (_, chunk_id) in &seeds {
		chunk_distance.entry(*chunk_id).or_insert(0);
	}

	let mut frontier: Vec<Uuid> = seeds.into_iter().map(|(entity_id, _)| entity_id).collect();

	for depth in 1..=max_depth {
		if frontier.is_empty() {
			break;
		}

		let edges: Vec<(Uuid, Uuid)> = sqlx::query_as(
			"\
SELECT source_entity_id, target_entity_id
FROM graph_relationships
WHERE source_entity_id = ANY($1) OR target_entity_id = ANY($1)",
		)
		.bind(&frontier)
		.fetch_all(pool)
		.await?;
		let mut next: Vec<Uuid> = Vec::new();

		for (source, target) in edges {
			for neighbor in [source, target] {
				if visited.insert(neighbor) {
					next.push(neighbor);
				}
			}
		}

		if next.is_empty() {
			break;
		}

		let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
			"SELECT entity_id, source_chunk_id FROM graph_entities WHERE entity_id = ANY($1)",
		)
		.bind(&next)
		.fetch_all(pool)
		.await?;

		for (_, chunk_id) in &rows {
			chunk_distance.entry(*chunk_id).or_insert(depth);
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

	Ok(related)
}

/// Explicit cleanup: removes every entity (and, via cascade, every
/// relationship) extracted from the given chunk.
pub async fn delete_by_chunk(executor: &mut PgConnection, chunk_id: Uuid) -> Result<u64> {
	let relationships =
		sqlx::query("DELETE FROM graph_relationships WHERE source_chunk_id = $1")
			.bind(chunk_id)
			.execute(&mut *executor)
			.await?;
	let entities = sqlx::query("DELETE FROM graph_entities WHERE source_chunk_id = $1")
		.bind(chunk_id)
		.execute(&mut *executor)
		.await?;

	Ok(relationships.rows_affected() + entities.rows_affected())
}

fn escape_like(input: &str) -> String {
	let mut out = String::with_capacity(input.len());

	for ch in input.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

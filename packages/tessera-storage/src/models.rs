use std::collections::BTreeMap;

use tessera_domain::{
	kinds::{EntityKind, RelationKind},
	properties::PropertyValue,
};
use uuid::Uuid;

/// A graph entity as read back for search. Properties stay in the store; the
/// search path only needs the identity and the chunk back-reference.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GraphEntityRow {
	pub entity_id: Uuid,
	pub name: String,
	pub kind: String,
	pub description: Option<String>,
	pub confidence: f32,
	pub modality: String,
	pub source_chunk_id: Uuid,
}

/// A chunk reached by graph traversal, with the number of relationship hops
/// taken from the nearest matched entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedChunkRow {
	pub chunk_id: Uuid,
	pub hop_distance: u32,
}

/// An entity to persist, produced by the extraction collaborator. The kind is
/// already enumeration-resolved and the properties already flattened.
#[derive(Debug, Clone)]
pub struct NewEntity {
	pub name: String,
	pub kind: EntityKind,
	pub description: Option<String>,
	pub confidence: f32,
	pub properties: BTreeMap<String, PropertyValue>,
}

/// A relationship to persist, referencing its endpoints by extracted name.
#[derive(Debug, Clone)]
pub struct NewRelation {
	pub source_name: String,
	pub target_name: String,
	pub kind: RelationKind,
	pub confidence: f32,
	pub properties: BTreeMap<String, PropertyValue>,
}

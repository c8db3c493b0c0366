use std::{collections::BTreeMap, time::Duration};

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tessera_domain::{
	kinds::{EntityKind, RelationKind},
	properties::{self, PropertyValue},
};

/// An entity proposed by the extraction model, with its kind already resolved
/// against the enumeration and its properties flattened to primitives.
#[derive(Clone, Debug)]
pub struct ExtractedEntity {
	pub name: String,
	pub kind: EntityKind,
	pub description: Option<String>,
	pub confidence: f32,
	pub properties: BTreeMap<String, PropertyValue>,
}

/// A relationship between two extracted entities, referenced by name. The
/// kind is fallback-mapped here so nothing downstream handles raw strings.
#[derive(Clone, Debug)]
pub struct ExtractedRelation {
	pub source: String,
	pub target: String,
	pub kind: RelationKind,
	pub confidence: f32,
}

#[derive(Clone, Debug, Default)]
pub struct ExtractedGraph {
	pub entities: Vec<ExtractedEntity>,
	pub relations: Vec<ExtractedRelation>,
}

#[derive(Debug, Deserialize)]
struct RawGraph {
	#[serde(default)]
	entities: Vec<RawEntity>,
	#[serde(default)]
	relationships: Vec<RawRelation>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
	name: String,
	#[serde(default, rename = "type")]
	kind: String,
	#[serde(default)]
	description: Option<String>,
	#[serde(default = "default_confidence")]
	confidence: f32,
	#[serde(default)]
	properties: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawRelation {
	source: String,
	target: String,
	#[serde(default, rename = "type")]
	kind: String,
	#[serde(default = "default_confidence")]
	confidence: f32,
}

fn default_confidence() -> f32 {
	1.0
}

pub async fn extract_graph(
	cfg: &tessera_config::LlmProviderConfig,
	text: &str,
) -> Result<ExtractedGraph> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let messages = build_extraction_messages(text);

	for _ in 0..3 {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		if let Ok(graph) = parse_extraction_response(json) {
			return Ok(graph);
		}
	}

	Err(eyre::eyre!("Extractor response is not valid graph JSON."))
}

fn build_extraction_messages(text: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"entities": [{ "name": "string", "type": "string", "description": "string", "properties": {} }],
		"relationships": [{ "source": "string", "target": "string", "type": "string" }]
	});
	let schema_text = serde_json::to_string_pretty(&schema)
		.unwrap_or_else(|_| "{\"entities\": [], \"relationships\": []}".to_string());
	let system_prompt = "You are an entity and relationship extraction engine for a knowledge \
graph. Output must be valid JSON only and must match the provided schema exactly. Use \
UPPER_SNAKE_CASE relationship types such as WORKS_FOR or FOUNDER_OF. Do not add explanations \
or extra fields.";
	let user_prompt =
		format!("Return JSON matching this exact schema:\n{schema_text}\nText:\n{text}");

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_extraction_response(json: Value) -> Result<ExtractedGraph> {
	let raw: RawGraph = if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		serde_json::from_str(content)
			.map_err(|_| eyre::eyre!("Extractor content is not valid graph JSON."))?
	} else if json.is_object() {
		serde_json::from_value(json)
			.map_err(|_| eyre::eyre!("Extractor response is not valid graph JSON."))?
	} else {
		return Err(eyre::eyre!("Extractor response is missing JSON content."));
	};

	Ok(resolve_graph(raw))
}

fn resolve_graph(raw: RawGraph) -> ExtractedGraph {
	let mut entities = Vec::with_capacity(raw.entities.len());

	for entity in raw.entities {
		let name = entity.name.trim().to_string();

		if name.is_empty() {
			continue;
		}

		entities.push(ExtractedEntity {
			name,
			kind: EntityKind::parse(&entity.kind),
			description: entity
				.description
				.map(|value| value.trim().to_string())
				.filter(|value| !value.is_empty()),
			confidence: entity.confidence.clamp(0.0, 1.0),
			properties: properties::flatten(&entity.properties),
		});
	}

	let mut relations = Vec::with_capacity(raw.relationships.len());

	for relation in raw.relationships {
		let source = relation.source.trim().to_string();
		let target = relation.target.trim().to_string();

		if source.is_empty() || target.is_empty() {
			continue;
		}

		relations.push(ExtractedRelation {
			source,
			target,
			kind: RelationKind::parse(&relation.kind),
			confidence: relation.confidence.clamp(0.0, 1.0),
		});
	}

	ExtractedGraph { entities, relations }
}

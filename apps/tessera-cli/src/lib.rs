use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use tessera_domain::modality::Modality;
use tessera_providers::{embedding, extractor};
use tessera_search::{SearchRequest, SearchService};
use tessera_storage::{
	db::Db,
	graph,
	models::{NewEntity, NewRelation},
	qdrant::{ChunkRecord, QdrantStore},
};

#[derive(Debug, Parser)]
#[command(version, about = "Hybrid search over a multimodal knowledge base.", rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the graph schema and the vector collection.
	Init,
	/// Embed and index one chunk of content, then extract its entities and
	/// relationships into the graph.
	Add {
		text: String,
		#[arg(long, default_value = "text")]
		modality: String,
		#[arg(long)]
		source: Option<String>,
	},
	/// Run a hybrid query and print the ranked results as JSON.
	Search {
		query: String,
		#[arg(long)]
		top_k: Option<u32>,
		#[arg(long)]
		modality: Option<String>,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = tessera_config::load(&args.config)?;

	init_tracing(&cfg);

	let db = Db::connect(&cfg.storage.postgres).await?;
	let qdrant = QdrantStore::new(&cfg.storage.qdrant)?;

	match args.command {
		Command::Init => {
			db.ensure_schema().await?;
			qdrant.ensure_collection().await?;

			println!("Initialized graph schema and vector collection.");
		},
		Command::Add { text, modality, source } => {
			let modality = parse_modality(&modality)?;
			let chunk_id = uuid::Uuid::new_v4();
			let vectors =
				embedding::embed(&cfg.providers.embedding, std::slice::from_ref(&text)).await?;
			let Some(vector) = vectors.into_iter().next() else {
				return Err(eyre::eyre!("Embedding provider returned no vectors."));
			};
			let metadata = serde_json::json!({ "source": source });
			let chunk = ChunkRecord { chunk_id, content: text.clone(), modality, metadata };

			qdrant.upsert_chunk(&chunk, vector).await?;

			let extracted = extractor::extract_graph(&cfg.providers.llm_extractor, &text).await?;
			let entities: Vec<NewEntity> = extracted
				.entities
				.into_iter()
				.map(|entity| NewEntity {
					name: entity.name,
					kind: entity.kind,
					description: entity.description,
					confidence: entity.confidence,
					properties: entity.properties,
				})
				.collect();
			let relations: Vec<NewRelation> = extracted
				.relations
				.into_iter()
				.map(|relation| NewRelation {
					source_name: relation.source,
					target_name: relation.target,
					kind: relation.kind,
					confidence: relation.confidence,
					properties: Default::default(),
				})
				.collect();
			let mut tx = db.pool.begin().await?;
			let (entity_count, relation_count) =
				graph::store_extraction(&mut tx, chunk_id, modality, &entities, &relations)
					.await?;

			tx.commit().await?;

			println!(
				"Indexed chunk {chunk_id} with {entity_count} entities and {relation_count} relationships."
			);
		},
		Command::Search { query, top_k, modality } => {
			let modality = modality.as_deref().map(parse_modality).transpose()?;
			let service = SearchService::new(cfg, db, qdrant);
			let response = service.search(SearchRequest { query, top_k, modality }).await?;

			println!("{}", serde_json::to_string_pretty(&response)?);
		},
	}

	Ok(())
}

fn parse_modality(value: &str) -> color_eyre::Result<Modality> {
	Modality::parse(value)
		.ok_or_else(|| eyre::eyre!("Unknown modality {value:?}; use text, image, audio, or video."))
}

fn init_tracing(cfg: &tessera_config::Config) {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, put, web};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use rs_markov_core::io::tokenize;
use rs_markov_core::model::generate_options::{GenerateOptions, StartSeed};
use rs_markov_core::model::generator::StopReason;
use rs_markov_core::store::protocol::{IncrementRequest, IncrementResponse, KeyQuery, PrefixQuery};
use rs_markov_core::store::MemoryStore;
use rs_markov_core::{ChainError, MarkovConfig, MarkovEngine, Store};

/// Struct representing query parameters for the `/v1/chains/{prefix}/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	max_words: Option<usize>,
	quality_floor: Option<f64>,
	relevant: Option<String>,
	seed: Option<String> // -> random, custom:<words> or none
}

#[derive(Deserialize)]
struct ScoreQuery {
	text: String
}

#[derive(Serialize, Deserialize)]
struct ScoreResponse {
	score: f64
}

#[derive(Serialize)]
struct GenerateResponse {
	text: String,
	stop: StopReason
}

struct SharedData {
	engine: MarkovEngine<Arc<MemoryStore>>,
	snapshot_path: PathBuf
}

impl GenerateParams {
	/// Determines the starting seed strategy for sequence generation.
	fn start_seed(&self) -> Result<StartSeed<String>, String> {
		match &self.seed {
			None => Ok(StartSeed::Start),
			Some(s) if s.to_lowercase() == "none" => Ok(StartSeed::Start),
			Some(s) if s.to_lowercase() == "random" => Ok(StartSeed::Random),
			Some(s) if s.to_lowercase().starts_with("custom:") => {
				let value = tokenize(&s["custom:".len()..]);
				if value.is_empty() {
					Err("Custom seed cannot be empty".into())
				} else {
					Ok(StartSeed::Custom(value))
				}
			}
			Some(_) => Err("Seed must be 'none', 'random' or start with 'custom:'".into()),
		}
	}

	/// Builds generation options on top of the configured defaults.
	fn options(&self, defaults: GenerateOptions<String>) -> Result<GenerateOptions<String>, String> {
		let mut options = defaults.with_seed(self.start_seed()?);
		if let Some(max_words) = self.max_words {
			options.max_words = max_words;
		}
		if let Some(quality_floor) = self.quality_floor {
			options.set_quality_floor(quality_floor).map_err(|e| e.to_string())?;
		}
		if let Some(relevant) = &self.relevant {
			options.relevant_terms = relevant.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect();
		}
		Ok(options)
	}
}

/// Maps a chain error onto an HTTP response.
fn error_response(error: &ChainError) -> HttpResponse {
	let status = match error {
		ChainError::InvalidToken(_) | ChainError::InvalidWindow { .. } | ChainError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
		ChainError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
		_ => StatusCode::INTERNAL_SERVER_ERROR,
	};
	if status.is_server_error() {
		tracing::warn!(%error, "request failed");
	}
	HttpResponse::build(status).body(error.to_string())
}

#[post("/v1/store/increment")]
async fn post_increment(data: web::Data<SharedData>, body: web::Json<IncrementRequest>) -> impl Responder {
	match data.engine.store().increment(&body.key, &body.field, body.by) {
		Ok(value) => HttpResponse::Ok().json(IncrementResponse { value }),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/store/hash")]
async fn get_hash(data: web::Data<SharedData>, query: web::Query<KeyQuery>) -> impl Responder {
	match data.engine.store().get_all(&query.key) {
		Ok(row) => HttpResponse::Ok().json(row),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/store/exists")]
async fn get_exists(data: web::Data<SharedData>, query: web::Query<KeyQuery>) -> impl Responder {
	match data.engine.store().exists(&query.key) {
		Ok(found) => HttpResponse::Ok().json(found),
		Err(e) => error_response(&e),
	}
}

#[get("/v1/store/keys")]
async fn get_keys(data: web::Data<SharedData>, query: web::Query<PrefixQuery>) -> impl Responder {
	match data.engine.store().keys(&query.prefix) {
		Ok(keys) => HttpResponse::Ok().json(keys),
		Err(e) => error_response(&e),
	}
}

/// HTTP PUT endpoint `/v1/chains/{prefix}/sequences`
///
/// Indexes the request body, one whitespace-separated sequence per line.
/// Returns the number of sequences indexed.
#[put("/v1/chains/{prefix}/sequences")]
async fn put_sequences(data: web::Data<SharedData>, prefix: web::Path<String>, body: String) -> impl Responder {
	let prefix = prefix.into_inner();
	let lines: Vec<String> = body.lines().map(str::to_owned).collect();

	// Bulk indexing spawns its own worker threads; keep it off the async executor
	let indexed = web::block(move || data.engine.index_lines(&lines, &prefix)).await;
	match indexed {
		Ok(Ok(count)) => HttpResponse::Ok().json(count),
		Ok(Err(e)) => error_response(&e),
		Err(_) => HttpResponse::InternalServerError().body("Indexing task failed"),
	}
}

#[get("/v1/chains/{prefix}/score")]
async fn get_score(data: web::Data<SharedData>, prefix: web::Path<String>, query: web::Query<ScoreQuery>) -> impl Responder {
	let tokens = tokenize(&query.text);
	match data.engine.score(&tokens, &prefix) {
		Ok(score) => HttpResponse::Ok().json(ScoreResponse { score }),
		Err(e) => error_response(&e),
	}
}

/// HTTP GET endpoint `/v1/chains/{prefix}/generate`
///
/// Generates a sequence from the chain based on query parameters.
/// Returns the generated text and the reason the walk stopped.
#[get("/v1/chains/{prefix}/generate")]
async fn get_generated(data: web::Data<SharedData>, prefix: web::Path<String>, query: web::Query<GenerateParams>) -> impl Responder {
	let options = match query.options(data.engine.generate_options()) {
		Ok(options) => options,
		Err(e) => return HttpResponse::BadRequest().body(e)
	};

	match data.engine.generate_with(&prefix, &options) {
		Ok(generation) => HttpResponse::Ok().json(GenerateResponse {
			text: generation.tokens.join(" "),
			stop: generation.stop,
		}),
		Err(e) => error_response(&e),
	}
}

/// HTTP POST endpoint `/v1/snapshot`
///
/// Writes the whole store to the configured snapshot path.
#[post("/v1/snapshot")]
async fn post_snapshot(data: web::Data<SharedData>) -> impl Responder {
	match data.engine.store().save(&data.snapshot_path) {
		Ok(()) => HttpResponse::Ok().body("Snapshot saved"),
		Err(e) => error_response(&e),
	}
}

/// Registers every route of the service.
fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(post_increment)
		.service(get_hash)
		.service(get_exists)
		.service(get_keys)
		.service(put_sequences)
		.service(get_score)
		.service(get_generated)
		.service(post_snapshot);
}

/// Main entry point for the server.
///
/// Loads the configuration (first argument, default `markov.toml`), opens
/// the store snapshot and starts an Actix-web HTTP server sharing one store
/// between all workers. The store is saved again on shutdown.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config_path = std::env::args().nth(1).unwrap_or_else(|| "markov.toml".to_owned());
	let config = MarkovConfig::load(&config_path).with_context(|| format!("loading {}", config_path))?;

	let store = Arc::new(MemoryStore::open(&config.store.snapshot_path)
		.with_context(|| format!("opening snapshot {}", config.store.snapshot_path.display()))?);
	let engine = MarkovEngine::new(Arc::clone(&store), config.chain.clone())?;
	let shared_data = web::Data::new(SharedData {
		engine,
		snapshot_path: config.store.snapshot_path.clone(),
	});

	tracing::info!(host = %config.server.host, port = config.server.port, order = config.chain.order, "starting server");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.configure(routes)
	})
		.bind((config.server.host.as_str(), config.server.port))?
		.run()
		.await?;

	store.save(&config.store.snapshot_path).context("saving snapshot on shutdown")?;
	Ok(())
}

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, put, web};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use babble_core::io::{list_files, resolve_data_dir, train_from_file};
use babble_core::{BabbleError, GenerationInput, NgramGraph, State};

/// Upper bound on the number of sentences returned by one request.
const MAX_COUNT: usize = 100;

/// Server settings, read from the command line or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "babble-server")]
#[command(about = "HTTP front-end for the word n-gram babbler")]
struct ServerConfig {
	/// Address to bind
	#[arg(long, env = "BABBLE_HOST", default_value = "127.0.0.1")]
	host: String,

	/// Port to bind
	#[arg(long, env = "BABBLE_PORT", default_value_t = 5000)]
	port: u16,

	/// Directory holding the `.txt` corpora
	#[arg(long, env = "BABBLE_DATA_DIR", default_value = "./data")]
	data_dir: String,

	/// Number of words per state for every model built by the server
	#[arg(short, long, env = "BABBLE_ORDER", default_value_t = 2)]
	n: usize,

	/// Seed for reproducible output
	#[arg(long, env = "BABBLE_SEED")]
	seed: Option<u64>,

	/// Hard limit on the words of a generated sentence
	#[arg(long, env = "BABBLE_MAX_WORDS", default_value_t = 200)]
	max_words: usize,

	/// Corpora to train on at startup (comma separated names)
	#[arg(long, env = "BABBLE_CORPORA", value_delimiter = ',')]
	corpora: Vec<String>,
}

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	max_words: Option<usize>,
	nb_try: Option<usize>,
}

#[derive(Deserialize)]
struct SuccessorQuery {
	state: Option<String>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
}

/// Summary returned by `/v1/stats`
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Stats {
	n: usize,
	states: usize,
	starters: usize,
	stoppers: usize,
}

struct SharedData {
	config: ServerConfig,
	graph: NgramGraph,
	corpora: Vec<String>,
}

impl SharedData {
	/// Builds the generation parameters for a request.
	///
	/// The configured `max_words` always applies so a request cannot walk
	/// forever; a smaller per-request limit is honored.
	fn generation_input(&self, params: &GenerateParams) -> Result<GenerationInput, BabbleError> {
		let max_words = params
			.max_words
			.map_or(self.config.max_words, |m| m.min(self.config.max_words));
		Ok(GenerationInput::new()
			.with_max_words(max_words)?
			.with_nb_try(params.nb_try.unwrap_or(0)))
	}
}

impl ServerConfig {
	fn corpus_path(&self, name: &str) -> PathBuf {
		resolve_data_dir(&self.data_dir).join(format!("{name}.txt"))
	}

	/// Builds a fresh graph trained on the named corpora, in order.
	fn train(&self, names: &[String]) -> Result<NgramGraph, BabbleError> {
		let mut graph = NgramGraph::with_seed(self.n, self.seed)?;
		for name in names {
			train_from_file(&mut graph, self.corpus_path(name))?;
		}
		Ok(graph)
	}
}

/// Splits a comma separated list of corpus names.
///
/// Names are plain file stems; anything that could leave the data
/// directory is rejected.
fn parse_names(raw: &str) -> Result<Vec<String>, String> {
	let names: Vec<String> = raw
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect();

	if names.is_empty() {
		return Err("Missing or empty corpus name".to_owned());
	}
	if let Some(bad) = names.iter().find(|n| n.contains(['/', '\\']) || n.starts_with('.')) {
		return Err(format!("Invalid corpus name: {bad}"));
	}
	Ok(names)
}

/// HTTP GET endpoint `/v1/generate`
///
/// Returns `count` generated sentences (default 1), one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(1);
	if count > MAX_COUNT {
		return HttpResponse::BadRequest().body(format!("count must be <= {MAX_COUNT}"));
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let input = match shared_data.generation_input(&query) {
		Ok(input) => input,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};

	let sentences: Vec<String> = (0..count).map(|_| shared_data.graph.generate_from(&input)).collect();
	HttpResponse::Ok().body(sentences.join("\n"))
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let graph = &shared_data.graph;
	HttpResponse::Ok().json(Stats {
		n: graph.order(),
		states: graph.len(),
		starters: graph.get_starters().len(),
		stoppers: graph.get_stoppers().len(),
	})
}

#[get("/v1/successors")]
async fn get_successors(data: web::Data<Mutex<SharedData>>, query: web::Query<SuccessorQuery>) -> impl Responder {
	let state = match &query.state {
		Some(s) if !s.trim().is_empty() => State::parse(s),
		_ => return HttpResponse::BadRequest().body("Missing or empty state"),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(shared_data.graph.get_successors(&state))
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let data_dir = match data.lock() {
		Ok(m) => m.config.data_dir.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match list_files(resolve_data_dir(&data_dir), "txt") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/trained_corpora")]
async fn get_trained_corpora(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.corpora.join("\n"))
}

/// HTTP PUT endpoint `/v1/train`
///
/// Replaces the model with a new one trained on the named corpora.
/// The current model is kept if any corpus fails to load.
#[put("/v1/train")]
async fn put_train(data: web::Data<Mutex<SharedData>>, query: web::Query<CorpusQuery>) -> impl Responder {
	let names = match parse_names(query.names.as_deref().unwrap_or_default()) {
		Ok(names) => names,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let config = match data.lock() {
		Ok(m) => m.config.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	// Corpora are read without the lock; it is only taken again to swap the graph
	let graph = match config.train(&names) {
		Ok(graph) => graph,
		Err(e) => {
			warn!("training on {:?} failed: {}", names, e);
			return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}"));
		}
	};
	info!("trained on {:?}: {} states", names, graph.len());

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.graph = graph;
	shared_data.corpora = names;
	HttpResponse::Ok().body("Corpora loaded successfully")
}

/// Main entry point for the server.
///
/// Builds the initial model from `--corpora` (empty if none), wraps it in
/// a `Mutex` and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let config = ServerConfig::parse();

	if config.max_words == 0 {
		return Err(io::Error::new(io::ErrorKind::InvalidInput, "max_words must be >= 1"));
	}
	let graph = config
		.train(&config.corpora)
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	info!("model ready: n={}, {} states", graph.order(), graph.len());

	let bind = (config.host.clone(), config.port);
	let shared_data = SharedData {
		corpora: config.corpora.clone(),
		config,
		graph,
	};
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", bind.0, bind.1);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(get_stats)
			.service(get_successors)
			.service(get_corpora)
			.service(get_trained_corpora)
			.service(put_train)
	})
		.bind(bind)?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test as actix_test;
	use babble_core::Token;

	fn config(data_dir: &str) -> ServerConfig {
		ServerConfig {
			host: "127.0.0.1".to_owned(),
			port: 0,
			data_dir: data_dir.to_owned(),
			n: 2,
			seed: Some(7),
			max_words: 50,
			corpora: Vec::new(),
		}
	}

	fn shared(data_dir: &str, lines: &[&str]) -> web::Data<Mutex<SharedData>> {
		let config = config(data_dir);
		let mut graph = NgramGraph::with_seed(config.n, config.seed).unwrap();
		graph.ingest_lines(lines);
		web::Data::new(Mutex::new(SharedData { config, graph, corpora: Vec::new() }))
	}

	#[actix_web::test]
	async fn generate_returns_one_line_per_sentence() {
		let data = shared(".", &["the dog runs fast"]);
		let app = actix_test::init_service(App::new().app_data(data.clone()).service(get_generated)).await;

		let req = actix_test::TestRequest::get().uri("/v1/generate?count=3").to_request();
		let body = actix_test::call_and_read_body(&app, req).await;
		let text = std::str::from_utf8(&body).unwrap();
		assert_eq!(text.lines().collect::<Vec<_>>(), ["the dog runs fast"; 3]);
	}

	#[actix_web::test]
	async fn generate_honors_word_limit() {
		let data = shared(".", &["one two three four five six"]);
		let app = actix_test::init_service(App::new().app_data(data.clone()).service(get_generated)).await;

		let req = actix_test::TestRequest::get().uri("/v1/generate?max_words=3").to_request();
		let body = actix_test::call_and_read_body(&app, req).await;
		assert_eq!(std::str::from_utf8(&body).unwrap(), "one two three");
	}

	#[actix_web::test]
	async fn generate_rejects_bad_parameters() {
		let data = shared(".", &["the dog runs fast"]);
		let app = actix_test::init_service(App::new().app_data(data.clone()).service(get_generated)).await;

		for uri in ["/v1/generate?max_words=0", "/v1/generate?count=1000"] {
			let req = actix_test::TestRequest::get().uri(uri).to_request();
			let resp = actix_test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
	}

	#[actix_web::test]
	async fn stats_and_successors() {
		let data = shared(".", &["the dog runs fast", "hi"]);
		let app = actix_test::init_service(
			App::new()
				.app_data(data.clone())
				.service(get_stats)
				.service(get_successors),
		)
		.await;

		let req = actix_test::TestRequest::get().uri("/v1/stats").to_request();
		let stats: Stats = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats, Stats { n: 2, states: 3, starters: 1, stoppers: 1 });

		let req = actix_test::TestRequest::get().uri("/v1/successors?state=The%20Dog").to_request();
		let tokens: Vec<Token> = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(tokens, [Token::Word("runs".to_owned())]);

		let req = actix_test::TestRequest::get().uri("/v1/successors?state=runs%20fast").to_request();
		let tokens: Vec<Token> = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(tokens, [Token::Stop]);

		let req = actix_test::TestRequest::get().uri("/v1/successors").to_request();
		let resp = actix_test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn train_replaces_the_model() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("alpha.txt"), "the cat sleeps\nthe cat runs away\n").unwrap();
		std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

		let data = shared(dir.path().to_str().unwrap(), &["the dog runs fast"]);
		let app = actix_test::init_service(
			App::new()
				.app_data(data.clone())
				.service(put_train)
				.service(get_corpora)
				.service(get_trained_corpora)
				.service(get_stats),
		)
		.await;

		let req = actix_test::TestRequest::get().uri("/v1/corpora").to_request();
		assert_eq!(actix_test::call_and_read_body(&app, req).await, "alpha");

		let req = actix_test::TestRequest::put().uri("/v1/train?names=alpha").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = actix_test::TestRequest::get().uri("/v1/trained_corpora").to_request();
		assert_eq!(actix_test::call_and_read_body(&app, req).await, "alpha");

		let req = actix_test::TestRequest::get().uri("/v1/stats").to_request();
		let stats: Stats = actix_test::call_and_read_body_json(&app, req).await;
		assert_eq!(stats, Stats { n: 2, states: 4, starters: 2, stoppers: 2 });
	}

	#[actix_web::test]
	async fn failed_training_keeps_the_model() {
		let dir = tempfile::tempdir().unwrap();
		let data = shared(dir.path().to_str().unwrap(), &["the dog runs fast"]);
		let app = actix_test::init_service(App::new().app_data(data.clone()).service(put_train)).await;

		let req = actix_test::TestRequest::put().uri("/v1/train?names=missing").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::INTERNAL_SERVER_ERROR);

		for uri in ["/v1/train", "/v1/train?names=..%2Fsecret", "/v1/train?names=%20,%20"] {
			let req = actix_test::TestRequest::put().uri(uri).to_request();
			assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST, "{uri}");
		}

		assert_eq!(data.lock().unwrap().graph.len(), 3);
	}

	#[actix_web::test]
	async fn train_builds_from_a_config_snapshot() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("alpha.txt"), "the cat sleeps\n").unwrap();

		let data = shared(dir.path().to_str().unwrap(), &["the dog runs fast"]);
		data.lock().unwrap().config.n = 1;
		let app = actix_test::init_service(App::new().app_data(data.clone()).service(put_train)).await;

		let req = actix_test::TestRequest::put().uri("/v1/train?names=alpha").to_request();
		assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

		let shared_data = data.lock().unwrap();
		assert_eq!(shared_data.graph.order(), 1);
		assert_eq!(shared_data.graph.len(), 3);
		assert_eq!(shared_data.corpora, ["alpha"]);
		// The lock was released after the swap
		drop(shared_data);
		assert!(data.try_lock().is_ok());
	}

	#[test]
	fn names_are_plain_stems() {
		assert_eq!(parse_names(" a, b ,,c").unwrap(), ["a", "b", "c"]);
		assert!(parse_names("").is_err());
		assert!(parse_names("a,../b").is_err());
		assert!(parse_names(".hidden").is_err());
	}
}

// ---------------------------------------------------------------------------
// RecommendServer -- JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to the engine.
// The server keeps the raw catalog and interaction records loaded by the
// caller; every scoring request recomputes from those inputs.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::error::RecommendError;
use crate::protocol::*;
use crate::store::MemoryStore;
use crate::strategy::{recommend_for_learner, CatalogSource, RecommendEngine};
use crate::transport::NdjsonTransport;
use crate::types::{AnalyticsSummary, HistoryEntry, InteractionRecord, Question};

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub struct RecommendServer {
	transport: NdjsonTransport,
	engine: RecommendEngine,
	store: MemoryStore,
	rng: StdRng,
}

impl RecommendServer {
	pub fn new(transport: NdjsonTransport, engine: RecommendEngine, seed: Option<u64>) -> Self {
		let rng = match seed {
			Some(s) => StdRng::seed_from_u64(s),
			None => StdRng::from_entropy(),
		};
		Self {
			transport,
			engine,
			store: MemoryStore::default(),
			rng,
		}
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), RecommendError> {
		let stdin = io::stdin();
		let reader = stdin.lock();

		for line_result in reader.lines() {
			let line = line_result?;
			if line.trim().is_empty() {
				continue;
			}

			let request: JsonRpcRequest = match serde_json::from_str(&line) {
				Ok(r) => r,
				Err(e) => {
					tracing::error!("Failed to parse request: {}", e);
					continue;
				}
			};

			self.dispatch(request);
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		let result = match req.method.as_str() {
			// -- Collaborator data ---------------------------------------
			"catalog/load" => self.handle_catalog_load(req.params),
			"interactions/load" => self.handle_interactions_load(req.params),

			// -- Recommendation ------------------------------------------
			"recommend/rank" => self.handle_rank(req.params),
			"recommend/generateSet" => self.handle_generate_set(req.params),

			// -- Profile -------------------------------------------------
			"profile/build" => self.handle_profile_build(req.params),
			"profile/rank" => self.handle_profile_rank(req.params),

			// -- Unknown -------------------------------------------------
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => {
				let code = match &e {
					RecommendError::InvalidParams(_) => INVALID_PARAMS,
					_ => RECOMMEND_ERROR,
				};
				self.transport
					.write_error(id, code, e.to_string(), Some(e.to_json_rpc_error()))
			}
		}
	}

	// ── Handlers ──────────────────────────────────────────────────────────

	fn handle_catalog_load(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, RecommendError> {
		let p: CatalogLoadParams = parse_params(params)?;
		let count = self.store.replace_catalog(p.questions);
		tracing::info!(questions = count, "catalog loaded");
		Ok(serde_json::json!({ "count": count }))
	}

	fn handle_interactions_load(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, RecommendError> {
		let p: InteractionsLoadParams = parse_params(params)?;
		let count = p.records.len();
		for record in p.records {
			self.store.upsert_record(record);
		}
		tracing::info!(records = count, learners = self.store.record_count(), "interactions loaded");
		Ok(serde_json::json!({ "count": count }))
	}

	fn handle_rank(&self, params: serde_json::Value) -> Result<serde_json::Value, RecommendError> {
		let p: RankParams = parse_params(params)?;
		let top_k = p.top_k.unwrap_or(self.engine.config().default_top_k);
		let ids = recommend_for_learner(&self.engine, &self.store, &self.store, &p.learner_id, top_k)?;
		Ok(serde_json::json!({ "questionIds": ids }))
	}

	fn handle_generate_set(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, RecommendError> {
		let p: GenerateSetParams = parse_params(params)?;
		let analytics = p.analytics.unwrap_or_default();
		let set = match p.seed {
			Some(seed) => self
				.engine
				.generate_set(&analytics, &mut StdRng::seed_from_u64(seed)),
			None => self.engine.generate_set(&analytics, &mut self.rng),
		};
		serde_json::to_value(set).map_err(|e| RecommendError::Serialization(e.to_string()))
	}

	fn handle_profile_build(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, RecommendError> {
		let p: HistoryParams = parse_params(params)?;
		let profile = self.engine.build_profile(&p.history)?;
		Ok(serde_json::json!({ "profile": profile }))
	}

	fn handle_profile_rank(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, RecommendError> {
		let p: HistoryParams = parse_params(params)?;
		let top_k = p.top_k.unwrap_or(self.engine.config().default_top_k);
		let catalog = self.store.fetch_catalog()?;
		let ids = self.engine.rank_by_profile(&p.history, &catalog, top_k)?;
		Ok(serde_json::json!({ "questionIds": ids }))
	}
}

// ---------------------------------------------------------------------------
// Param types
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, RecommendError> {
	serde_json::from_value(params).map_err(|e| RecommendError::InvalidParams(e.to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogLoadParams {
	questions: Vec<Question>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionsLoadParams {
	records: Vec<InteractionRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankParams {
	learner_id: String,
	top_k: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSetParams {
	analytics: Option<AnalyticsSummary>,
	seed: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams {
	#[serde(default)]
	history: Vec<HistoryEntry>,
	top_k: Option<usize>,
}

// ---------------------------------------------------------------------------
// RecommendEngine -- entry points and strategy selection
// ---------------------------------------------------------------------------
//
// Callers pick a strategy explicitly:
//
// - ContentCollaborative: catalog + interaction record -> ranked ids
//   (similarity, factorization, fusion).
// - HeuristicProficiency: analytics summary -> synthesized practice set.
// - ProfileHeuristic: raw history + catalog -> ranked ids by profile fit.
//
// The engine holds only immutable configuration; every call allocates its
// own matrices and score tables.
// ---------------------------------------------------------------------------

use rand::Rng;

use crate::config::EngineConfig;
use crate::error::RecommendError;
use crate::factorization::InteractionFactorizer;
use crate::fusion::fuse;
use crate::heuristic::HeuristicGenerator;
use crate::profile::{ProfileBuilder, ProfileScorer};
use crate::similarity::{index_catalog, ContentSimilarityEngine};
use crate::types::{
	AnalyticsSummary, GeneratedSet, HistoryEntry, InteractionRecord, LearnerProfile, Question,
};

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// Supplies the question catalog for a request.
pub trait CatalogSource {
	fn fetch_catalog(&self) -> Result<Vec<Question>, RecommendError>;
}

/// Supplies a learner's interaction record, if one exists.
pub trait InteractionSource {
	fn fetch_interaction_record(
		&self,
		learner_id: &str,
	) -> Result<Option<InteractionRecord>, RecommendError>;
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

pub enum RecommendationStrategy<'a> {
	ContentCollaborative {
		learner_id: &'a str,
		catalog: &'a [Question],
		record: &'a InteractionRecord,
		top_k: usize,
	},
	HeuristicProficiency {
		analytics: &'a AnalyticsSummary,
	},
	ProfileHeuristic {
		history: &'a [HistoryEntry],
		catalog: &'a [Question],
		top_k: usize,
	},
}

#[derive(Debug, Clone)]
pub enum Recommendation {
	Ranked(Vec<String>),
	Generated(GeneratedSet),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct RecommendEngine {
	config: EngineConfig,
}

impl RecommendEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Run the selected strategy.
	pub fn recommend<R: Rng + ?Sized>(
		&self,
		strategy: RecommendationStrategy<'_>,
		rng: &mut R,
	) -> Result<Recommendation, RecommendError> {
		match strategy {
			RecommendationStrategy::ContentCollaborative {
				learner_id,
				catalog,
				record,
				top_k,
			} => self
				.rank(learner_id, catalog, record, top_k)
				.map(Recommendation::Ranked),
			RecommendationStrategy::HeuristicProficiency { analytics } => {
				Ok(Recommendation::Generated(self.generate_set(analytics, rng)))
			}
			RecommendationStrategy::ProfileHeuristic {
				history,
				catalog,
				top_k,
			} => self
				.rank_by_profile(history, catalog, top_k)
				.map(Recommendation::Ranked),
		}
	}

	/// Rank the catalog for one learner by fused similarity and affinity.
	///
	/// Returns `min(top_k, catalog.len())` unique ids. An empty catalog or
	/// duplicate ids abort the call; a factorization breakdown only removes
	/// the affinity signal.
	pub fn rank(
		&self,
		learner_id: &str,
		catalog: &[Question],
		record: &InteractionRecord,
		top_k: usize,
	) -> Result<Vec<String>, RecommendError> {
		let similarity = ContentSimilarityEngine::new(&self.config.similarity).compute(catalog)?;
		let affinity =
			InteractionFactorizer::new(&self.config.factorization).affinities(record, catalog);
		let table = fuse(&similarity, &affinity, &record.entries, &self.config.fusion);

		let ranked = table.into_ranked(top_k);
		tracing::debug!(
			learner = learner_id,
			catalog = catalog.len(),
			interactions = record.entries.len(),
			returned = ranked.len(),
			"ranked catalog"
		);
		Ok(ranked)
	}

	/// Synthesize a practice set from summary analytics.
	pub fn generate_set<R: Rng + ?Sized>(
		&self,
		analytics: &AnalyticsSummary,
		rng: &mut R,
	) -> GeneratedSet {
		HeuristicGenerator::new(&self.config.heuristic).generate(analytics, rng)
	}

	pub fn build_profile(&self, history: &[HistoryEntry]) -> Result<LearnerProfile, RecommendError> {
		ProfileBuilder::new(&self.config.profile).build(history)
	}

	/// Rank the catalog by how well each question fits the learner profile
	/// derived from `history`.
	pub fn rank_by_profile(
		&self,
		history: &[HistoryEntry],
		catalog: &[Question],
		top_k: usize,
	) -> Result<Vec<String>, RecommendError> {
		if catalog.is_empty() {
			return Err(RecommendError::EmptyCatalog);
		}
		index_catalog(catalog)?;
		let profile = self.build_profile(history)?;
		Ok(ProfileScorer::new(&profile).rank(catalog, top_k))
	}
}

/// Fetch the learner's record and catalog, then rank.
///
/// A learner without a record gets an empty list; the engine is not
/// invoked and the catalog is not fetched.
pub fn recommend_for_learner<C, I>(
	engine: &RecommendEngine,
	catalog_source: &C,
	interaction_source: &I,
	learner_id: &str,
	top_k: usize,
) -> Result<Vec<String>, RecommendError>
where
	C: CatalogSource + ?Sized,
	I: InteractionSource + ?Sized,
{
	let Some(record) = interaction_source.fetch_interaction_record(learner_id)? else {
		tracing::debug!(learner = learner_id, "no interaction record, nothing to rank");
		return Ok(Vec::new());
	};
	let catalog = catalog_source.fetch_catalog()?;
	engine.rank(learner_id, &catalog, &record, top_k)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------
//
// CLI arguments for the binary plus the immutable configuration structs
// injected into `RecommendEngine`. Every default reproduces the constants
// of the scoring formulas; nothing here is mutated after construction.
// ---------------------------------------------------------------------------

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "recommend-engine", about = "Hybrid practice-question recommender over JSON-RPC / NDJSON")]
pub struct CliArgs {
	/// Default number of question ids returned by rank requests
	#[arg(long, default_value = "5", env = "RECOMMEND_ENGINE_TOP_K")]
	pub top_k: usize,

	/// Term-frequency boost applied to topic tokens in label documents
	#[arg(long, default_value = "2.0", env = "RECOMMEND_ENGINE_TOPIC_BOOST")]
	pub topic_boost: f64,

	/// Seed for difficulty sampling (entropy-seeded when absent)
	#[arg(long, env = "RECOMMEND_ENGINE_SEED")]
	pub seed: Option<u64>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info", env = "RECOMMEND_ENGINE_LOG_LEVEL")]
	pub log_level: String,
}

impl CliArgs {
	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			default_top_k: self.top_k,
			similarity: SimilarityConfig {
				topic_boost: self.topic_boost,
				..SimilarityConfig::default()
			},
			..EngineConfig::default()
		}
	}
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineConfig {
	pub default_top_k: usize,
	pub similarity: SimilarityConfig,
	pub factorization: FactorizationConfig,
	pub fusion: FusionWeights,
	pub profile: ProfileConfig,
	pub heuristic: HeuristicConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			default_top_k: 5,
			similarity: SimilarityConfig::default(),
			factorization: FactorizationConfig::default(),
			fusion: FusionWeights::default(),
			profile: ProfileConfig::default(),
			heuristic: HeuristicConfig::default(),
		}
	}
}

/// Term boosts for the two token sources of a label document.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
	pub topic_boost: f64,
	pub difficulty_boost: f64,
}

impl Default for SimilarityConfig {
	fn default() -> Self {
		Self {
			topic_boost: 2.0,
			difficulty_boost: 1.0,
		}
	}
}

/// Limits for the power-iteration SVD.
#[derive(Debug, Clone)]
pub struct FactorizationConfig {
	pub max_iterations: usize,
	pub tolerance: f64,
	/// Singular values at or below this are treated as degenerate.
	pub min_singular_value: f64,
}

impl Default for FactorizationConfig {
	fn default() -> Self {
		Self {
			max_iterations: 200,
			tolerance: 1e-9,
			min_singular_value: 1e-10,
		}
	}
}

#[derive(Debug, Clone)]
pub struct FusionWeights {
	pub similarity: f64,
	pub affinity: f64,
	pub pending: f64,
	pub other: f64,
}

impl Default for FusionWeights {
	fn default() -> Self {
		Self {
			similarity: 0.7,
			affinity: 0.3,
			pending: 0.6,
			other: 0.4,
		}
	}
}

#[derive(Debug, Clone)]
pub struct ProfileConfig {
	/// Floor for a topic's average time spent.
	pub min_avg_time_spent: f64,
	/// Success rate a difficulty bucket must exceed to promote.
	pub promotion_rate: f64,
	pub fast_pace_per_day: f64,
	pub slow_pace_per_day: f64,
	pub default_active_hour: u32,
}

impl Default for ProfileConfig {
	fn default() -> Self {
		Self {
			min_avg_time_spent: 1e-3,
			promotion_rate: 0.7,
			fast_pace_per_day: 5.0,
			slow_pace_per_day: 2.0,
			default_active_hour: 12,
		}
	}
}

#[derive(Debug, Clone)]
pub struct HeuristicConfig {
	/// Ordered base weights; order breaks ties when picking the top topic.
	pub base_topic_weights: Vec<(String, f64)>,
	/// Base weight for topics that only appear in the analytics summary.
	pub default_topic_weight: f64,
	pub minutes_per_question: u32,
	pub max_questions: usize,
	pub weak_mastery: f64,
	pub strong_mastery: f64,
	pub weak_multiplier: f64,
	pub strong_multiplier: f64,
	pub diversity_decay: f64,
	pub streak_bonus_per_day: f64,
	pub max_streak_bonus: f64,
	pub max_proficiency: f64,
}

impl Default for HeuristicConfig {
	fn default() -> Self {
		let base = [
			("arrays", 1.2),
			("linked_lists", 1.1),
			("trees", 1.3),
			("graphs", 1.4),
			("dynamic_programming", 1.5),
			("sorting", 1.0),
			("searching", 1.0),
			("recursion", 1.2),
		];
		Self {
			base_topic_weights: base.iter().map(|(t, w)| (t.to_string(), *w)).collect(),
			default_topic_weight: 1.0,
			minutes_per_question: 20,
			max_questions: 10,
			weak_mastery: 0.6,
			strong_mastery: 0.8,
			weak_multiplier: 1.5,
			strong_multiplier: 0.8,
			diversity_decay: 0.8,
			streak_bonus_per_day: 0.1,
			max_streak_bonus: 0.5,
			max_proficiency: 10.0,
		}
	}
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordinal difficulty label of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
	#[serde(alias = "easy", alias = "EASY")]
	Easy,
	#[serde(alias = "medium", alias = "MEDIUM")]
	Medium,
	#[serde(alias = "hard", alias = "HARD")]
	Hard,
}

impl Difficulty {
	pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

	pub fn label(&self) -> &'static str {
		match self {
			Self::Easy => "Easy",
			Self::Medium => "Medium",
			Self::Hard => "Hard",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
	#[serde(alias = "_id")]
	pub id: String,
	pub topic: String,
	#[serde(alias = "difficultyLevel", alias = "difficultylevel")]
	pub difficulty: Difficulty,
}

impl Question {
	pub fn new(id: impl Into<String>, topic: impl Into<String>, difficulty: Difficulty) -> Self {
		Self {
			id: id.into(),
			topic: topic.into(),
			difficulty,
		}
	}
}

// ---------------------------------------------------------------------------
// Interaction record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
	Completed,
	Pending,
	Skipped,
	Attempted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEntry {
	#[serde(alias = "question_id")]
	pub question_id: String,
	pub status: InteractionStatus,
	#[serde(default)]
	pub attempts: u32,
	#[serde(default)]
	pub skips: u32,
	#[serde(default)]
	pub time_spent: Option<f64>,
	#[serde(default)]
	pub difficulty: Option<Difficulty>,
	#[serde(default)]
	pub last_attempted: Option<String>,
}

impl InteractionEntry {
	pub fn new(question_id: impl Into<String>, status: InteractionStatus) -> Self {
		Self {
			question_id: question_id.into(),
			status,
			attempts: 0,
			skips: 0,
			time_spent: None,
			difficulty: None,
			last_attempted: None,
		}
	}

	pub fn with_skips(mut self, skips: u32) -> Self {
		self.skips = skips;
		self
	}
}

/// Stored history of one learner. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
	#[serde(alias = "user_id", alias = "userId")]
	pub learner_id: String,
	#[serde(default, alias = "questions")]
	pub entries: Vec<InteractionEntry>,
}

impl InteractionRecord {
	pub fn new(learner_id: impl Into<String>, entries: Vec<InteractionEntry>) -> Self {
		Self {
			learner_id: learner_id.into(),
			entries,
		}
	}
}

// ---------------------------------------------------------------------------
// Learner history and profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
	pub topic: String,
	pub completed: bool,
	pub time_spent: f64,
	pub difficulty: Difficulty,
	/// ISO-8601 timestamp of the attempt.
	pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningPace {
	Slow,
	Normal,
	Fast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
	pub topic_preferences: BTreeMap<String, f64>,
	pub difficulty_level: Difficulty,
	pub learning_pace: LearningPace,
	pub success_rate: f64,
	pub active_hour: u32,
}

impl Default for LearnerProfile {
	fn default() -> Self {
		Self {
			topic_preferences: BTreeMap::new(),
			difficulty_level: Difficulty::Easy,
			learning_pace: LearningPace::Normal,
			success_rate: 0.0,
			active_hour: 12,
		}
	}
}

// ---------------------------------------------------------------------------
// Analytics summary and generated sets
// ---------------------------------------------------------------------------

fn default_success_rate() -> f64 {
	0.7
}

fn default_daily_time() -> f64 {
	120.0
}

/// Precomputed analytics consumed by the heuristic generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
	#[serde(default)]
	pub questions_completed: u32,
	#[serde(default = "default_success_rate")]
	pub success_rate: f64,
	#[serde(default)]
	pub current_streak: u32,
	/// topic -> mastery in [0, 1]
	#[serde(default)]
	pub topic_distribution: BTreeMap<String, f64>,
	/// Minutes available per day.
	#[serde(default = "default_daily_time")]
	pub daily_time_available: f64,
}

impl Default for AnalyticsSummary {
	fn default() -> Self {
		Self {
			questions_completed: 0,
			success_rate: default_success_rate(),
			current_streak: 0,
			topic_distribution: BTreeMap::new(),
			daily_time_available: default_daily_time(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyDistribution {
	pub easy: f64,
	pub medium: f64,
	pub hard: f64,
}

impl DifficultyDistribution {
	pub fn as_weights(&self) -> [f64; 3] {
		[self.easy, self.medium, self.hard]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
	pub topic: String,
	pub difficulty: Difficulty,
	pub estimated_time: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSet {
	pub questions: Vec<GeneratedQuestion>,
	pub proficiency: f64,
	pub difficulty_distribution: DifficultyDistribution,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn question_accepts_stored_field_names() {
		let q: Question = serde_json::from_value(serde_json::json!({
			"_id": "q1",
			"topic": "arrays",
			"difficultylevel": "easy",
		}))
		.unwrap();
		assert_eq!(q.id, "q1");
		assert_eq!(q.difficulty, Difficulty::Easy);
	}

	#[test]
	fn interaction_entry_defaults() {
		let e: InteractionEntry = serde_json::from_value(serde_json::json!({
			"questionId": "q1",
			"status": "pending",
		}))
		.unwrap();
		assert_eq!(e.status, InteractionStatus::Pending);
		assert_eq!(e.skips, 0);
		assert!(e.time_spent.is_none());
	}

	#[test]
	fn analytics_summary_applies_defaults() {
		let a: AnalyticsSummary = serde_json::from_value(serde_json::json!({})).unwrap();
		assert_eq!(a.questions_completed, 0);
		assert!((a.success_rate - 0.7).abs() < 1e-10);
		assert!((a.daily_time_available - 120.0).abs() < 1e-10);
	}

	#[test]
	fn default_profile_matches_cold_start() {
		let p = LearnerProfile::default();
		assert_eq!(p.learning_pace, LearningPace::Normal);
		assert_eq!(p.difficulty_level, Difficulty::Easy);
		assert_eq!(p.active_hour, 12);
		assert_eq!(p.success_rate, 0.0);
	}
}

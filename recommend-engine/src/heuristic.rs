// ---------------------------------------------------------------------------
// Heuristic Generator -- proficiency-driven practice sets
// ---------------------------------------------------------------------------
//
// Synthesizes a practice set from summary analytics rather than ranking a
// catalog: a proficiency scalar picks the difficulty distribution, mastery
// reshapes the topic weights, and a greedy loop emits one descriptor per
// 20-minute slot, decaying the chosen topic each time for variety.
// ---------------------------------------------------------------------------

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::HeuristicConfig;
use crate::types::{AnalyticsSummary, Difficulty, DifficultyDistribution, GeneratedQuestion, GeneratedSet};

/// Ordered topic weights. Order decides ties when picking the maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicWeights(Vec<(String, f64)>);

impl TopicWeights {
	pub fn get(&self, topic: &str) -> Option<f64> {
		self.0.iter().find(|(t, _)| t == topic).map(|(_, w)| *w)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Index of the first topic holding the highest weight.
	fn argmax(&self) -> Option<usize> {
		let mut best: Option<(usize, f64)> = None;
		for (i, (_, w)) in self.0.iter().enumerate() {
			if best.map_or(true, |(_, bw)| *w > bw) {
				best = Some((i, *w));
			}
		}
		best.map(|(i, _)| i)
	}
}

pub struct HeuristicGenerator<'a> {
	config: &'a HeuristicConfig,
}

impl<'a> HeuristicGenerator<'a> {
	pub fn new(config: &'a HeuristicConfig) -> Self {
		Self { config }
	}

	/// `min(completed * success_rate + min(streak * 0.1, 0.5), 10)`.
	pub fn proficiency(&self, analytics: &AnalyticsSummary) -> f64 {
		let base = analytics.questions_completed as f64 * analytics.success_rate;
		let streak_bonus = (analytics.current_streak as f64 * self.config.streak_bonus_per_day)
			.min(self.config.max_streak_bonus);
		(base + streak_bonus).min(self.config.max_proficiency)
	}

	pub fn difficulty_distribution(&self, proficiency: f64) -> DifficultyDistribution {
		if proficiency < 3.0 {
			DifficultyDistribution { easy: 0.7, medium: 0.2, hard: 0.1 }
		} else if proficiency < 7.0 {
			DifficultyDistribution { easy: 0.3, medium: 0.5, hard: 0.2 }
		} else {
			DifficultyDistribution { easy: 0.1, medium: 0.3, hard: 0.6 }
		}
	}

	/// Base weights reshaped by mastery: weak topics (< 0.6) are boosted,
	/// mastered ones (> 0.8) damped. Topics missing from the base table
	/// start at the default weight and are appended in ascending name order
	/// (the order of `topic_distribution`), so equal weights among them
	/// break ties alphabetically. Non-finite mastery leaves the weight
	/// unchanged.
	pub fn topic_weights(&self, analytics: &AnalyticsSummary) -> TopicWeights {
		let mut weights = self.config.base_topic_weights.clone();
		for (topic, &mastery) in &analytics.topic_distribution {
			let idx = match weights.iter().position(|(t, _)| t == topic) {
				Some(i) => i,
				None => {
					weights.push((topic.clone(), self.config.default_topic_weight));
					weights.len() - 1
				}
			};
			if mastery < self.config.weak_mastery {
				weights[idx].1 *= self.config.weak_multiplier;
			} else if mastery > self.config.strong_mastery {
				weights[idx].1 *= self.config.strong_multiplier;
			}
		}
		TopicWeights(weights)
	}

	/// `min(floor(daily_time / 20), 10)`; non-positive time gives 0.
	pub fn question_count(&self, analytics: &AnalyticsSummary) -> usize {
		let minutes = analytics.daily_time_available;
		if !minutes.is_finite() || minutes <= 0.0 {
			return 0;
		}
		let slots = (minutes / self.config.minutes_per_question as f64).floor() as usize;
		slots.min(self.config.max_questions)
	}

	/// Generate a practice set. Difficulty draws are independent samples
	/// from the distribution; topics are picked greedily by weight.
	pub fn generate<R: Rng + ?Sized>(&self, analytics: &AnalyticsSummary, rng: &mut R) -> GeneratedSet {
		let proficiency = self.proficiency(analytics);
		let distribution = self.difficulty_distribution(proficiency);
		let mut weights = self.topic_weights(analytics);
		let count = self.question_count(analytics);

		let mut questions = Vec::with_capacity(count);
		match WeightedIndex::new(distribution.as_weights()) {
			Ok(sampler) => {
				for _ in 0..count {
					let Some(idx) = weights.argmax() else {
						tracing::warn!("no topics available for practice set");
						break;
					};
					let difficulty = Difficulty::ALL[sampler.sample(rng)];
					questions.push(GeneratedQuestion {
						topic: weights.0[idx].0.clone(),
						difficulty,
						estimated_time: self.config.minutes_per_question,
					});
					weights.0[idx].1 *= self.config.diversity_decay;
				}
			}
			Err(e) => tracing::warn!("invalid difficulty distribution: {}", e),
		}

		tracing::debug!(
			proficiency,
			requested = count,
			generated = questions.len(),
			"generated practice set"
		);

		GeneratedSet {
			questions,
			proficiency,
			difficulty_distribution: distribution,
		}
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

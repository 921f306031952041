// ---------------------------------------------------------------------------
// Learner Profile -- heuristic profile from raw activity history
// ---------------------------------------------------------------------------
//
// Derives topic preferences, a target difficulty, pace, success rate, and
// the most active hour from a learner's history. The profile also drives a
// lightweight catalog ranking (`ProfileScorer`) for callers that have a
// history but no interaction record.
// ---------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use crate::config::ProfileConfig;
use crate::error::RecommendError;
use crate::fusion::rank_indices;
use crate::types::{Difficulty, HistoryEntry, LearnerProfile, LearningPace, Question};

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse an ISO-8601 timestamp into the wall-clock time it was written in.
///
/// Accepts RFC 3339 (with offset or `Z`), naive `YYYY-MM-DDTHH:MM:SS[.f]`,
/// and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
	let raw = raw.trim();
	if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
		return Some(dt.naive_local());
	}
	if let Ok(dt) = raw.parse::<NaiveDateTime>() {
		return Some(dt);
	}
	raw.parse::<NaiveDate>()
		.ok()
		.and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// ProfileBuilder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TopicTally {
	attempts: usize,
	successes: usize,
	total_time: f64,
}

pub struct ProfileBuilder<'a> {
	config: &'a ProfileConfig,
}

impl<'a> ProfileBuilder<'a> {
	pub fn new(config: &'a ProfileConfig) -> Self {
		Self { config }
	}

	/// Build a profile from `history`. An empty history yields the default
	/// cold-start profile.
	///
	/// Fails only when an entry carries a negative or non-finite time spent.
	pub fn build(&self, history: &[HistoryEntry]) -> Result<LearnerProfile, RecommendError> {
		if let Some(bad) = history
			.iter()
			.find(|e| !e.time_spent.is_finite() || e.time_spent < 0.0)
		{
			return Err(RecommendError::InvalidHistory(format!(
				"timeSpent must be a non-negative number, got {} for topic {}",
				bad.time_spent, bad.topic
			)));
		}

		let timestamps: Vec<NaiveDateTime> = history
			.iter()
			.filter_map(|e| {
				let parsed = parse_timestamp(&e.date);
				if parsed.is_none() {
					tracing::warn!(date = %e.date, "skipping unparseable history timestamp");
				}
				parsed
			})
			.collect();

		Ok(LearnerProfile {
			topic_preferences: self.topic_preferences(history),
			difficulty_level: self.difficulty_level(history),
			learning_pace: self.learning_pace(&timestamps),
			success_rate: success_rate(history),
			active_hour: self.active_hour(&timestamps),
		})
	}

	/// `0.7 * successRate(t) + 0.3 / avgTimeSpent(t)`, with the average
	/// clamped to `min_avg_time_spent`.
	fn topic_preferences(&self, history: &[HistoryEntry]) -> BTreeMap<String, f64> {
		let mut tallies: BTreeMap<String, TopicTally> = BTreeMap::new();
		for entry in history {
			let tally = tallies.entry(entry.topic.clone()).or_default();
			tally.attempts += 1;
			tally.successes += usize::from(entry.completed);
			tally.total_time += entry.time_spent;
		}

		tallies
			.into_iter()
			.map(|(topic, t)| {
				let rate = t.successes as f64 / t.attempts as f64;
				let avg_time = (t.total_time / t.attempts as f64).max(self.config.min_avg_time_spent);
				(topic, rate * 0.7 + (1.0 / avg_time) * 0.3)
			})
			.collect()
	}

	/// Highest difficulty whose bucket success rate exceeds the promotion
	/// rate. Empty buckets never promote.
	fn difficulty_level(&self, history: &[HistoryEntry]) -> Difficulty {
		let mut buckets: HashMap<Difficulty, (usize, usize)> = HashMap::new();
		for entry in history {
			let (done, total) = buckets.entry(entry.difficulty).or_insert((0, 0));
			*done += usize::from(entry.completed);
			*total += 1;
		}
		let rate = |d: Difficulty| match buckets.get(&d) {
			Some(&(done, total)) if total > 0 => done as f64 / total as f64,
			_ => 0.0,
		};

		if rate(Difficulty::Hard) > self.config.promotion_rate {
			Difficulty::Hard
		} else if rate(Difficulty::Medium) > self.config.promotion_rate {
			Difficulty::Medium
		} else {
			Difficulty::Easy
		}
	}

	/// Average entries per active calendar day.
	fn learning_pace(&self, timestamps: &[NaiveDateTime]) -> LearningPace {
		let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
		for ts in timestamps {
			*per_day.entry(ts.date()).or_insert(0) += 1;
		}
		if per_day.is_empty() {
			return LearningPace::Normal;
		}

		let avg = timestamps.len() as f64 / per_day.len() as f64;
		if avg > self.config.fast_pace_per_day {
			LearningPace::Fast
		} else if avg < self.config.slow_pace_per_day {
			LearningPace::Slow
		} else {
			LearningPace::Normal
		}
	}

	/// Most frequent hour of day; ties go to the hour seen first.
	fn active_hour(&self, timestamps: &[NaiveDateTime]) -> u32 {
		let mut counts = [0usize; 24];
		let mut first_seen: Vec<u32> = Vec::new();
		for ts in timestamps {
			let hour = ts.hour();
			if counts[hour as usize] == 0 {
				first_seen.push(hour);
			}
			counts[hour as usize] += 1;
		}

		let mut best: Option<(u32, usize)> = None;
		for hour in first_seen {
			let count = counts[hour as usize];
			if best.map_or(true, |(_, c)| count > c) {
				best = Some((hour, count));
			}
		}
		best.map(|(h, _)| h)
			.unwrap_or(self.config.default_active_hour)
	}
}

/// Completed over total; 0.0 for an empty history.
pub fn success_rate(history: &[HistoryEntry]) -> f64 {
	if history.is_empty() {
		return 0.0;
	}
	let done = history.iter().filter(|e| e.completed).count();
	done as f64 / history.len() as f64
}

// ---------------------------------------------------------------------------
// ProfileScorer
// ---------------------------------------------------------------------------

/// Scores catalog questions against a learner profile.
pub struct ProfileScorer<'a> {
	profile: &'a LearnerProfile,
}

impl<'a> ProfileScorer<'a> {
	pub fn new(profile: &'a LearnerProfile) -> Self {
		Self { profile }
	}

	pub fn score(&self, question: &Question) -> f64 {
		let profile = self.profile;
		let topic_score = profile
			.topic_preferences
			.get(&question.topic)
			.copied()
			.unwrap_or(0.0);

		let difficulty_match = if question.difficulty == profile.difficulty_level {
			1.0
		} else {
			0.5
		};

		let pace_score = match profile.learning_pace {
			LearningPace::Fast if question.difficulty != Difficulty::Easy => 1.0,
			LearningPace::Slow if question.difficulty == Difficulty::Easy => 1.0,
			LearningPace::Fast | LearningPace::Slow => 0.5,
			LearningPace::Normal => 0.8,
		};

		let mut score = topic_score * 0.3 + difficulty_match * 0.3 + pace_score * 0.2;
		if profile.success_rate < 0.5 && question.difficulty == Difficulty::Hard {
			score *= 0.7;
		}
		score
	}

	/// Top `k` catalog ids by profile score; ties keep catalog order.
	pub fn rank(&self, catalog: &[Question], k: usize) -> Vec<String> {
		let scores: Vec<f64> = catalog.iter().map(|q| self.score(q)).collect();
		rank_indices(&scores, k)
			.into_iter()
			.map(|i| catalog[i].id.clone())
			.collect()
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

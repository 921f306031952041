// ---------------------------------------------------------------------------
// MemoryStore -- in-process catalog and interaction records
// ---------------------------------------------------------------------------
//
// Stands in for the external catalog and interaction collaborators. Holds
// raw inputs only; nothing derived by the engine is kept here.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::error::RecommendError;
use crate::strategy::{CatalogSource, InteractionSource};
use crate::types::{InteractionRecord, Question};

#[derive(Debug, Default)]
pub struct MemoryStore {
	catalog: Vec<Question>,
	records: HashMap<String, InteractionRecord>,
}

impl MemoryStore {
	pub fn replace_catalog(&mut self, questions: Vec<Question>) -> usize {
		self.catalog = questions;
		self.catalog.len()
	}

	/// Insert or replace the record for its learner.
	pub fn upsert_record(&mut self, record: InteractionRecord) {
		self.records.insert(record.learner_id.clone(), record);
	}

	pub fn record_count(&self) -> usize {
		self.records.len()
	}
}

impl CatalogSource for MemoryStore {
	fn fetch_catalog(&self) -> Result<Vec<Question>, RecommendError> {
		Ok(self.catalog.clone())
	}
}

impl InteractionSource for MemoryStore {
	fn fetch_interaction_record(
		&self,
		learner_id: &str,
	) -> Result<Option<InteractionRecord>, RecommendError> {
		Ok(self.records.get(learner_id).cloned())
	}
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
	#[error("Empty catalog: no questions to build a vocabulary from")]
	EmptyCatalog,
	#[error("Duplicate question id in catalog: {0}")]
	DuplicateQuestion(String),
	#[error("Invalid history: {0}")]
	InvalidHistory(String),
	#[error("Invalid params: {0}")]
	InvalidParams(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl RecommendError {
	pub fn code(&self) -> &str {
		match self {
			Self::EmptyCatalog => "RECOMMEND_EMPTY_CATALOG",
			Self::DuplicateQuestion(_) => "RECOMMEND_DUPLICATE_QUESTION",
			Self::InvalidHistory(_) => "RECOMMEND_INVALID_HISTORY",
			Self::InvalidParams(_) => "RECOMMEND_INVALID_PARAMS",
			Self::Io(_) => "RECOMMEND_IO",
			Self::Serialization(_) => "RECOMMEND_SERIALIZATION",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"recommendCode": self.code(),
			"message": self.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn json_rpc_error_carries_code_and_message() {
		let err = RecommendError::DuplicateQuestion("q1".into());
		let value = err.to_json_rpc_error();
		assert_eq!(value["recommendCode"], "RECOMMEND_DUPLICATE_QUESTION");
		assert!(value["message"].as_str().unwrap().contains("q1"));
	}
}

// ---------------------------------------------------------------------------
// Label tokenization
// ---------------------------------------------------------------------------
//
// Splits a question label into lowercased word tokens the way a standard
// TF-IDF vectorizer does: runs of at least two word characters. Single
// characters and punctuation are dropped.
// ---------------------------------------------------------------------------

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Split text into lowercased word tokens of length >= 2.
pub fn tokenize(text: &str) -> Vec<String> {
	let lower = text.to_lowercase();
	TOKEN_PATTERN
		.find_iter(&lower)
		.map(|m| m.as_str().to_string())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_splits() {
		assert_eq!(tokenize("Arrays Easy"), vec!["arrays", "easy"]);
	}

	#[test]
	fn keeps_underscored_words_whole() {
		assert_eq!(tokenize("dynamic_programming Hard"), vec!["dynamic_programming", "hard"]);
	}

	#[test]
	fn drops_single_characters_and_punctuation() {
		assert_eq!(tokenize("a, b-trees!"), vec!["trees"]);
	}

	#[test]
	fn empty_text_has_no_tokens() {
		assert!(tokenize("").is_empty());
		assert!(tokenize("  ").is_empty());
	}
}

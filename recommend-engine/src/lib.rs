pub mod config;
pub mod cosine;
pub mod error;
pub mod factorization;
pub mod fusion;
pub mod heuristic;
pub mod profile;
pub mod protocol;
pub mod server;
pub mod similarity;
pub mod store;
pub mod strategy;
pub mod tokenize;
pub mod transport;
pub mod types;

pub use error::RecommendError;
pub use strategy::{recommend_for_learner, Recommendation, RecommendationStrategy, RecommendEngine};

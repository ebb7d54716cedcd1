//! Decides how many retrieved candidates are worth surfacing.
//!
//! Candidates arrive ordered by descending score. When the best hit clearly dominates, or the
//! runner-up is low-confidence, only the best hit is kept. Otherwise the head of the list is
//! returned as-is.

use crate::Content;

pub trait Scored {
	fn relevance_score(&self) -> f64;
}

impl Scored for Content {
	fn relevance_score(&self) -> f64 {
		self.score.unwrap_or(0.0)
	}
}

impl Scored for f64 {
	fn relevance_score(&self) -> f64 {
		*self
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevancePolicy {
	pub dominance_gap: f64,
	pub min_second_score: f64,
	pub max_results: usize,
}
impl RelevancePolicy {
	pub fn filter<T>(&self, mut candidates: Vec<T>) -> Vec<T>
	where
		T: Scored,
	{
		if candidates.len() < 2 {
			return candidates;
		}

		let top = candidates[0].relevance_score();
		let second = candidates[1].relevance_score();

		if top - second > self.dominance_gap || second < self.min_second_score {
			candidates.truncate(1);
		} else {
			candidates.truncate(self.max_results.max(1));
		}

		candidates
	}
}

impl Default for RelevancePolicy {
	fn default() -> Self {
		Self { dominance_gap: 0.10, min_second_score: 0.75, max_results: 3 }
	}
}

impl From<&brain_config::SearchRelevance> for RelevancePolicy {
	fn from(cfg: &brain_config::SearchRelevance) -> Self {
		Self {
			dominance_gap: cfg.dominance_gap,
			min_second_score: cfg.min_second_score,
			max_results: cfg.max_results as usize,
		}
	}
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{CandidateItem, MediaType, ScoredItem, UserAffinity};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Weights of the engagement score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub like_weight: f64,
    pub view_weight: f64,
    /// Bayesian prior added to every item's likes
    pub prior_likes: f64,
    /// Bayesian prior added to every item's views
    pub prior_views: f64,
    pub half_life_days: f64,
    pub subscribed_bonus: f64,
    pub liked_creator_bonus: f64,
    pub liked_category_bonus: f64,
    pub video_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            like_weight: 3.0,
            view_weight: 1.0,
            prior_likes: 5.0,
            prior_views: 50.0,
            half_life_days: 2.0,
            subscribed_bonus: 120.0,
            liked_creator_bonus: 60.0,
            liked_category_bonus: 25.0,
            video_bonus: 10.0,
        }
    }
}

/// `1 / (1 + age / half_life)`; future timestamps count as age 0
pub fn recency_boost(age_days: f64, half_life_days: f64) -> f64 {
    let age = if age_days.is_finite() { age_days.max(0.0) } else { 0.0 };
    let half_life = if half_life_days > 0.0 { half_life_days } else { 1.0 };
    1.0 / (1.0 + age / half_life)
}

pub fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_ms = (now - created_at).num_milliseconds() as f64;
    (age_ms / 1000.0 / SECONDS_PER_DAY).max(0.0)
}

/// Engagement scorer: smoothed popularity decayed by age, plus affinity and type bonuses
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, item: &CandidateItem, affinity: &UserAffinity, now: DateTime<Utc>) -> f64 {
        let w = &self.weights;
        let likes = item.likes as f64 + w.prior_likes;
        let views = item.views as f64 + w.prior_views;
        let popularity = w.like_weight * likes + w.view_weight * views;
        let boost = recency_boost(age_days(item.created_at, now), w.half_life_days);

        popularity * boost + self.affinity_bonus(item, affinity) + self.type_bonus(item)
    }

    fn affinity_bonus(&self, item: &CandidateItem, affinity: &UserAffinity) -> f64 {
        let w = &self.weights;
        let mut bonus = 0.0;

        if let Some(creator) = item.creator_id.as_deref() {
            if affinity.subscribed_creator_ids.contains(creator) {
                bonus += w.subscribed_bonus;
            }
            if affinity.liked_creator_ids.contains(creator) {
                bonus += w.liked_creator_bonus;
            }
        }
        if let Some(category) = item.category.as_deref() {
            if affinity.liked_categories.contains(category) {
                bonus += w.liked_category_bonus;
            }
        }
        bonus
    }

    fn type_bonus(&self, item: &CandidateItem) -> f64 {
        match item.media_type {
            MediaType::Video => self.weights.video_bonus,
            _ => 0.0,
        }
    }

    /// Score every item and sort descending; ties keep input order
    pub fn rank(
        &self,
        items: Vec<CandidateItem>,
        affinity: &UserAffinity,
        now: DateTime<Utc>,
    ) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = items
            .into_iter()
            .map(|item| {
                let score = self.score(&item, affinity, now);
                ScoredItem { item, score }
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored
    }
}

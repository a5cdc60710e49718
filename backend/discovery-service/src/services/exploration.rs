// ============================================
// Exploration
// ============================================
//
// Epsilon-greedy explore/exploit merge for the recommendation feed.
//
// A page of `limit` slots holds `base_count` items from the diversified
// ranking and `explore_count` items drawn from the trending pool through a
// seeded permutation. Identical seed + identical pool always produce the
// identical list, which is what makes cursor pagination stable across
// requests that share a seed.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::CandidateItem;

pub const DEFAULT_EPSILON: f64 = 0.1;
pub const MAX_EPSILON: f64 = 0.5;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a over the seed bytes
fn fnv1a64(seed: &str) -> u64 {
    seed.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic generator keyed by an opaque seed string
pub struct SeededRng {
    rng: ChaCha8Rng,
}

impl SeededRng {
    pub fn from_seed_str(seed: &str) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(fnv1a64(seed)),
        }
    }

    /// Next key in `[0, 1)`
    pub fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform draw in `[0, upper]`
    pub fn up_to(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..=upper)
    }

    /// Seeded Fisher-Yates
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Clamp to `[0, 0.5]`; absent or non-finite input means `default`
pub fn clamp_epsilon(raw: Option<f64>, default: f64) -> f64 {
    let fallback = if default.is_finite() {
        default.clamp(0.0, MAX_EPSILON)
    } else {
        DEFAULT_EPSILON
    };
    match raw {
        Some(v) if v.is_finite() => v.clamp(0.0, MAX_EPSILON),
        _ => fallback,
    }
}

/// `(base_count, explore_count)` for one page
pub fn explore_counts(limit: usize, epsilon: f64) -> (usize, usize) {
    let explore = (limit as f64 * epsilon).round();
    let explore = if explore.is_finite() && explore > 0.0 {
        (explore as usize).min(limit)
    } else {
        0
    };
    (limit - explore, explore)
}

/// Minute bucket, used when the client sends no seed
pub fn default_seed(now: DateTime<Utc>) -> String {
    now.timestamp().div_euclid(60).to_string()
}

/// Age-normalized popularity
pub fn trending_score(item: &CandidateItem, now: DateTime<Utc>) -> f64 {
    let age_hours = ((now - item.created_at).num_milliseconds() as f64 / 3_600_000.0).max(1.0);
    (item.likes as f64 + 1.0) / (age_hours + 2.0).powf(0.8)
        + (item.views as f64 + 10.0) / (age_hours + 2.0).powf(0.9)
}

/// Pool sorted by trending score, highest first; ties keep pool order
pub fn trending_pool(pool: &[CandidateItem], now: DateTime<Utc>) -> Vec<CandidateItem> {
    let mut keyed: Vec<(f64, CandidateItem)> = pool
        .iter()
        .map(|item| (trending_score(item, now), item.clone()))
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// One draw per item in input order, then sort ascending by the drawn key
pub fn explore_permutation(items: Vec<CandidateItem>, rng: &mut SeededRng) -> Vec<CandidateItem> {
    let mut keyed: Vec<(f64, CandidateItem)> =
        items.into_iter().map(|item| (rng.next_f64(), item)).collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Builds the ordered list that cursor pagination walks
#[derive(Debug, Clone, Copy)]
pub struct Explorer {
    limit: usize,
    base_count: usize,
    explore_count: usize,
}

impl Explorer {
    pub fn new(limit: usize, epsilon: f64) -> Self {
        let (base_count, explore_count) = explore_counts(limit, epsilon);
        Self {
            limit,
            base_count,
            explore_count,
        }
    }

    pub fn explore_count(&self) -> usize {
        self.explore_count
    }

    /// Emit blocks of `limit` slots until both sources run dry.
    ///
    /// Each block takes the next `base_count` unused diversified items and
    /// the next `explore_count` unused items of the explore permutation,
    /// then tops up from whichever source still has items. The explore
    /// permutation covers the trending pool minus the first block's base
    /// items, so the first block is exactly `[...base, ...explore]` when both
    /// sources cover their share.
    pub fn build_super_list(
        &self,
        diversified: Vec<CandidateItem>,
        trending: Vec<CandidateItem>,
        seed: &str,
    ) -> Vec<CandidateItem> {
        if self.limit == 0 {
            return Vec::new();
        }

        let first_base: HashSet<String> = diversified
            .iter()
            .take(self.base_count)
            .map(|item| item.id.clone())
            .collect();
        let explore_source: Vec<CandidateItem> = trending
            .into_iter()
            .filter(|item| !first_base.contains(&item.id))
            .collect();

        let mut rng = SeededRng::from_seed_str(seed);
        let mut base = diversified.into_iter();
        let mut explore = explore_permutation(explore_source, &mut rng).into_iter();

        let mut used: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();

        loop {
            let mut block = Vec::with_capacity(self.limit);
            take_unused(&mut base, &mut used, &mut block, self.base_count);
            take_unused(&mut explore, &mut used, &mut block, self.base_count + self.explore_count);
            take_unused(&mut base, &mut used, &mut block, self.limit);
            take_unused(&mut explore, &mut used, &mut block, self.limit);

            if block.is_empty() {
                break;
            }
            merged.extend(block);
        }
        merged
    }
}

/// Move unused items from `source` into `block` until it holds `target` items
fn take_unused<I>(
    source: &mut I,
    used: &mut HashSet<String>,
    block: &mut Vec<CandidateItem>,
    target: usize,
) where
    I: Iterator<Item = CandidateItem>,
{
    while block.len() < target {
        match source.next() {
            Some(item) => {
                if used.insert(item.id.clone()) {
                    block.push(item);
                }
            }
            None => break,
        }
    }
}

use std::collections::{HashMap, HashSet};

use crate::models::{CandidateItem, ScoredItem};

/// Items without a creator share the `None` bucket, distinct from every real id
fn creator_key(item: &CandidateItem) -> Option<&str> {
    item.creator_id.as_deref()
}

/// Distinct creators in the pool, with creator-less items counted once
pub fn distinct_creators(scored: &[ScoredItem]) -> usize {
    scored
        .iter()
        .map(|s| creator_key(&s.item))
        .collect::<HashSet<_>>()
        .len()
}

/// `max(5, ceil(limit / distinct))`
pub fn per_creator_cap(limit: usize, distinct_creators: usize) -> usize {
    let distinct = distinct_creators.max(1);
    let spread = (limit + distinct - 1) / distinct;
    spread.max(5)
}

/// Admit items in score order, skipping any whose creator already supplied `cap` items
pub fn rerank_for_diversity(scored: Vec<ScoredItem>, cap: usize) -> Vec<ScoredItem> {
    let mut counts: HashMap<Option<String>, usize> = HashMap::new();
    let mut admitted = Vec::with_capacity(scored.len());

    for entry in scored {
        let count = counts
            .entry(creator_key(&entry.item).map(str::to_string))
            .or_insert(0);
        if *count < cap {
            *count += 1;
            admitted.push(entry);
        }
    }
    admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use chrono::Utc;

    fn scored(id: &str, creator: Option<&str>, score: f64) -> ScoredItem {
        ScoredItem {
            item: CandidateItem {
                id: id.to_string(),
                creator_id: creator.map(str::to_string),
                creator_name: None,
                category: None,
                media_type: MediaType::Video,
                title: id.to_string(),
                description: None,
                url: None,
                thumbnail_url: None,
                likes: 0,
                views: 0,
                comment_count: 0,
                created_at: Utc::now(),
            },
            score,
        }
    }

    #[test]
    fn test_per_creator_cap_floor_and_spread() {
        assert_eq!(per_creator_cap(50, 20), 5);
        assert_eq!(per_creator_cap(50, 2), 25);
        assert_eq!(per_creator_cap(10, 0), 10);
        assert_eq!(per_creator_cap(1, 1), 5);
    }

    #[test]
    fn test_rerank_caps_creator_and_keeps_order() {
        let input: Vec<ScoredItem> = (0..8)
            .map(|i| scored(&format!("a{}", i), Some("alice"), 100.0 - i as f64))
            .chain(std::iter::once(scored("b0", Some("bob"), 1.0)))
            .collect();

        let out = rerank_for_diversity(input, 5);
        let ids: Vec<&str> = out.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["a0", "a1", "a2", "a3", "a4", "b0"]);
    }

    #[test]
    fn test_creatorless_items_share_a_bucket() {
        let input: Vec<ScoredItem> = (0..4).map(|i| scored(&i.to_string(), None, 1.0)).collect();
        assert_eq!(distinct_creators(&input), 1);
        assert_eq!(rerank_for_diversity(input, 2).len(), 2);
    }

    #[test]
    fn test_creator_named_unknown_has_its_own_cap() {
        let input: Vec<ScoredItem> = (0..3)
            .map(|i| scored(&format!("u{}", i), Some("unknown"), 10.0 - i as f64))
            .chain((0..3).map(|i| scored(&format!("n{}", i), None, 5.0 - i as f64)))
            .collect();

        assert_eq!(distinct_creators(&input), 2);
        let out = rerank_for_diversity(input, 2);
        let ids: Vec<&str> = out.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u1", "n0", "n1"]);
    }
}

use crate::models::CandidateItem;

/// One cursor-addressed slice of the super-list
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPage {
    pub items: Vec<CandidateItem>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Slice `limit` items starting right after `cursor`.
///
/// An absent or unknown cursor starts at the head of the list. `next_cursor`
/// is the last id whenever the page is full.
pub fn paginate_by_cursor(list: &[CandidateItem], cursor: Option<&str>, limit: usize) -> CursorPage {
    let start = cursor
        .and_then(|c| list.iter().position(|item| item.id == c))
        .map(|idx| idx + 1)
        .unwrap_or(0);

    let end = start.saturating_add(limit).min(list.len());
    let items = list[start..end].to_vec();

    let next_cursor = if limit > 0 && items.len() == limit {
        items.last().map(|item| item.id.clone())
    } else {
        None
    };

    CursorPage {
        has_more: end < list.len(),
        next_cursor,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use chrono::Utc;

    fn list(n: usize) -> Vec<CandidateItem> {
        (0..n)
            .map(|i| CandidateItem {
                id: format!("m{}", i),
                creator_id: None,
                creator_name: None,
                category: None,
                media_type: MediaType::Image,
                title: String::new(),
                description: None,
                url: None,
                thumbnail_url: None,
                likes: 0,
                views: 0,
                comment_count: 0,
                created_at: Utc::now(),
            })
            .collect()
    }

    fn ids(page: &CursorPage) -> Vec<&str> {
        page.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_first_page_without_cursor() {
        let items = list(7);
        let page = paginate_by_cursor(&items, None, 3);
        assert_eq!(ids(&page), vec!["m0", "m1", "m2"]);
        assert_eq!(page.next_cursor.as_deref(), Some("m2"));
        assert!(page.has_more);
    }

    #[test]
    fn test_cursor_continues_after_id() {
        let items = list(7);
        let page = paginate_by_cursor(&items, Some("m5"), 3);
        assert_eq!(ids(&page), vec!["m6"]);
        assert_eq!(page.next_cursor, None);
        assert!(!page.has_more);
    }

    #[test]
    fn test_unknown_cursor_restarts() {
        let items = list(4);
        let page = paginate_by_cursor(&items, Some("gone"), 2);
        assert_eq!(ids(&page), vec!["m0", "m1"]);
    }

    #[test]
    fn test_full_tail_page_keeps_cursor() {
        let items = list(4);
        let page = paginate_by_cursor(&items, Some("m1"), 2);
        assert_eq!(ids(&page), vec!["m2", "m3"]);
        assert_eq!(page.next_cursor.as_deref(), Some("m3"));
        assert!(!page.has_more);

        let after = paginate_by_cursor(&items, Some("m3"), 2);
        assert!(after.items.is_empty());
        assert_eq!(after.next_cursor, None);
    }

    #[test]
    fn test_walking_cursors_visits_every_item_once() {
        let items = list(11);
        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = paginate_by_cursor(&items, cursor.as_deref(), 4);
            seen.extend(page.items.iter().map(|i| i.id.clone()));
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        let expected: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
        assert_eq!(seen, expected);
    }
}

//! Search, filter and pagination over in-memory record lists.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub trait Searchable {
    /// `needle` is already lowercased and non-empty.
    fn matches(&self, needle: &str) -> bool;
}

/// Records matching both the search text and `keep`, in their original order.
pub fn filter_records<'a, T, F>(items: &'a [T], search: &str, keep: F) -> Vec<&'a T>
where
    T: Searchable,
    F: Fn(&T) -> bool,
{
    let needle = search.trim().to_lowercase();

    items
        .iter()
        .filter(|item| keep(*item))
        .filter(|item| needle.is_empty() || item.matches(&needle))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based, always within `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based index of the first item shown; 0 for an empty list.
    pub first_item: usize,
    pub last_item: usize,
}

impl PageInfo {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

/// Slice out one page. Out-of-range pages are clamped; an empty list has one
/// empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);
    let items = items[start..end].to_vec();

    Page {
        info: PageInfo {
            page,
            total_pages,
            total_items,
            first_item: if items.is_empty() { 0 } else { start + 1 },
            last_item: end,
        },
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, bool);

    impl Searchable for Row {
        fn matches(&self, needle: &str) -> bool {
            self.0.to_lowercase().contains(needle)
        }
    }

    static ROWS: [Row; 4] = [
        Row("Swift Dzire", true),
        Row("Toyota Etios", false),
        Row("Maruti Swift", true),
        Row("Hyundai Aura", true),
    ];

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let found = filter_records(&ROWS, "  SWIFT ", |_| true);
        assert_eq!(found, vec![&ROWS[0], &ROWS[2]]);
    }

    #[test]
    fn blank_search_keeps_everything_that_passes_the_filter() {
        let found = filter_records(&ROWS, "", |row| row.1);
        assert_eq!(found.len(), 3);
        assert!(!found.contains(&&ROWS[1]));
    }

    #[test]
    fn pages_are_one_based_and_clamped() {
        let items: Vec<u32> = (1..=23).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.info.total_pages, 3);
        assert!(!first.info.has_previous());
        assert!(first.info.has_next());

        let last = paginate(&items, 99, 10);
        assert_eq!(last.info.page, 3);
        assert_eq!(last.items, vec![21, 22, 23]);
        assert_eq!((last.info.first_item, last.info.last_item), (21, 23));

        assert_eq!(paginate(&items, 0, 10).info.page, 1);
    }

    #[test]
    fn empty_list_has_a_single_empty_page() {
        let page = paginate::<u32>(&[], 4, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.info.page, 1);
        assert_eq!(page.info.total_pages, 1);
        assert_eq!(page.info.first_item, 0);
        assert!(!page.info.has_next());
    }
}

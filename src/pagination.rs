use serde::Serialize;

/// Items shown on one page of every paginated listing.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let past_last = last_page.saturating_add(1);
    let left_end = left_edge.saturating_add(1).min(past_last);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = current_page
        .saturating_add(right_current)
        .saturating_add(1)
        .min(past_last);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge).saturating_add(1));

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// A page of items with the condensed page list used by pagers.
///
/// `pages` lists page numbers around the current one, with `null` marking
/// a gap.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pages: Vec<Option<usize>>,
    pub page: usize,
    pub total: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, current_page: usize, total: usize) -> Self {
        let current_page = if current_page == 0 { 1 } else { current_page };
        let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);

        let pages = get_pages(total_pages, current_page, 2, 2, 4, 2);

        Self {
            items,
            pages,
            page: current_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_no_pages() {
        let page: Paginated<i32> = Paginated::new(vec![], 1, 0);
        assert!(page.pages.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn long_listing_is_condensed_with_gaps() {
        let page: Paginated<i32> = Paginated::new(vec![], 10, 30 * DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(page.pages.first(), Some(&Some(1)));
        assert_eq!(page.pages.last(), Some(&Some(30)));
        assert!(page.pages.contains(&None));
        assert!(page.pages.contains(&Some(10)));
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        let page = Paginated::new(vec![1, 2], 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.pages, vec![Some(1)]);
    }

    #[test]
    fn page_past_the_end_does_not_overflow() {
        let page: Paginated<i32> = Paginated::new(vec![], usize::MAX, 5 * DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(page.page, usize::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.pages, vec![Some(1), Some(2), None]);
    }
}

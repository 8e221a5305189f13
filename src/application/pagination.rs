//! Offset pagination over an already ordered slice.
//!
//! Page numbers are 1-based and come straight from the `page` query
//! parameter. Anything that does not parse as an integer means page 1; zero
//! and negative numbers parse fine but select nothing.

use std::num::NonZeroUsize;

use url::form_urlencoded;

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(5).expect("non-zero page size");

const PAGE_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(i64);

impl PageNumber {
    pub const FIRST: Self = Self(1);

    pub fn new(number: i64) -> Self {
        Self(number)
    }

    /// Interpret a raw `page` value; missing or non-numeric input is page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .map(Self)
            .unwrap_or(Self::FIRST)
    }

    /// Pull the first `page` pair out of a raw query string.
    pub fn from_query(query: Option<&str>) -> Self {
        let raw = query.and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == PAGE_PARAM)
                .map(|(_, value)| value.into_owned())
        });
        Self::parse(raw.as_deref())
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub number: PageNumber,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `number` addresses one of the populated pages.
    pub fn is_in_range(&self) -> bool {
        self.number.get() >= 1 && page_index_fits(self.number.get(), self.total_pages)
    }

    /// The page a "newer posts" link should point at, clamped into range.
    pub fn previous(&self) -> Option<i64> {
        let number = self.number.get();
        if number <= 1 || self.total_pages == 0 {
            return None;
        }
        let last = i64::try_from(self.total_pages).unwrap_or(i64::MAX);
        Some((number - 1).min(last))
    }

    /// The page an "older posts" link should point at.
    pub fn next(&self) -> Option<i64> {
        if self.total_pages == 0 {
            return None;
        }
        let number = self.number.get();
        if number < 1 {
            return Some(1);
        }
        page_index_fits(number, self.total_pages - 1).then(|| number + 1)
    }
}

fn page_index_fits(number: i64, limit: usize) -> bool {
    usize::try_from(number).is_ok_and(|number| number <= limit)
}

/// Slice out page `page` of `items` with `page_size` entries per page.
pub fn paginate<T>(items: &[T], page_size: NonZeroUsize, page: PageNumber) -> Page<'_, T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size.get());

    let window = page
        .get()
        .checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
        .and_then(|index| index.checked_mul(page_size.get()))
        .filter(|start| *start < total_items)
        .map(|start| {
            let end = start.saturating_add(page_size.get()).min(total_items);
            &items[start..end]
        })
        .unwrap_or(&[]);

    Page {
        items: window,
        number: page,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    fn twelve() -> Vec<u32> {
        (1..=12).collect()
    }

    #[test]
    fn parse_defaults_to_first_page() {
        assert_eq!(PageNumber::parse(None), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("abc")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("2.5")), PageNumber::FIRST);
        assert_eq!(
            PageNumber::parse(Some("99999999999999999999999")),
            PageNumber::FIRST
        );
    }

    #[test]
    fn parse_keeps_zero_and_negative_numbers() {
        assert_eq!(PageNumber::parse(Some("3")).get(), 3);
        assert_eq!(PageNumber::parse(Some(" 2 ")).get(), 2);
        assert_eq!(PageNumber::parse(Some("0")).get(), 0);
        assert_eq!(PageNumber::parse(Some("-4")).get(), -4);
    }

    #[test]
    fn from_query_uses_first_page_pair() {
        assert_eq!(PageNumber::from_query(None), PageNumber::FIRST);
        assert_eq!(PageNumber::from_query(Some("page=2")).get(), 2);
        assert_eq!(PageNumber::from_query(Some("tag=js&page=3&page=9")).get(), 3);
        assert_eq!(PageNumber::from_query(Some("page=%33")).get(), 3);
        assert_eq!(PageNumber::from_query(Some("p=2")), PageNumber::FIRST);
    }

    #[test]
    fn second_page_of_twelve_holds_items_six_to_ten() {
        let items = twelve();

        let page = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::new(2));

        assert_eq!(page.items, [6, 7, 8, 9, 10]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.previous(), Some(1));
        assert_eq!(page.next(), Some(3));
    }

    #[test]
    fn last_page_is_partial() {
        let items = twelve();

        let page = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::new(3));

        assert_eq!(page.items, [11, 12]);
        assert!(page.is_in_range());
        assert_eq!(page.next(), None);
    }

    #[test]
    fn unparseable_page_falls_back_to_first() {
        let items = twelve();

        let page = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::parse(Some("abc")));

        assert_eq!(page.items, [1, 2, 3, 4, 5]);
        assert_eq!(page.previous(), None);
        assert_eq!(page.next(), Some(2));
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items = twelve();

        for number in [0, -1, 4, i64::MAX, i64::MIN] {
            let page = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::new(number));
            assert!(page.is_empty(), "page {number} should be empty");
            assert!(!page.is_in_range());
            assert_eq!(page.total_pages, 3);
        }

        let beyond = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::new(7));
        assert_eq!(beyond.previous(), Some(3));
        assert_eq!(beyond.next(), None);

        let below = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::new(-2));
        assert_eq!(below.previous(), None);
        assert_eq!(below.next(), Some(1));
    }

    #[test]
    fn empty_input_has_no_pages() {
        let items: Vec<u32> = Vec::new();

        let page = paginate(&items, DEFAULT_PAGE_SIZE, PageNumber::FIRST);

        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.previous(), None);
        assert_eq!(page.next(), None);
    }

    #[test]
    fn pages_cover_every_item_exactly_once() {
        for total in 0..=23_u32 {
            let items: Vec<u32> = (0..total).collect();
            for page_size in 1..=7 {
                let first = paginate(&items, size(page_size), PageNumber::FIRST);
                let mut seen = Vec::new();
                for number in 1..=first.total_pages {
                    let page = paginate(&items, size(page_size), PageNumber::new(number as i64));
                    assert!(!page.is_empty());
                    assert!(page.items.len() <= page_size);
                    seen.extend_from_slice(page.items);
                }
                assert_eq!(seen, items, "total {total}, page size {page_size}");
            }
        }
    }
}

//! Page sequencing for paginated listings.
//!
//! A listing of `total_items` split into pages of `page_size` has
//! `ceil(total_items / page_size)` pages, numbered from 1. For each page the
//! sequencer gives the neighbour links and the output file name:
//!
//! ```text
//! total = 5, page_size = 2, base = "index.html", naming = directory
//!
//! page  items  file              previous  next
//!  1    0..2   index.html        none      2
//!  2    2..4   2/index.html      (root)    3
//!  3    4..5   3/index.html      2         none
//! ```
//!
//! Page 2's previous link is [`PreviousPage::Root`], not page 1: page 1 *is*
//! the listing's root file, so the link resolves against the site root
//! rather than a numbered path.
//!
//! # File naming
//!
//! Two incompatible conventions exist for pages after the first, and sites
//! built with one break links under the other. [`PageNaming`] makes the choice
//! explicit (`[pagination] naming` in config):
//!
//! - `directory`: `2/index.html`
//! - `suffix`: `index-2.html`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Page size must be at least 1")]
    ZeroPageSize,
    #[error("Page {page} is outside 1..={last}")]
    PageOutOfRange { page: usize, last: usize },
}

/// How page numbers are folded into output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageNaming {
    /// Page number as a directory segment: `2/index.html`.
    #[default]
    Directory,
    /// Page number appended to the file stem: `index-2.html`.
    Suffix,
}

impl PageNaming {
    /// File name for page `page >= 2`. Page 1 never goes through here.
    fn numbered(self, page: usize, base_file_name: &str) -> String {
        match self {
            PageNaming::Directory => format!("{page}/{base_file_name}"),
            PageNaming::Suffix => match base_file_name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{page}.{ext}"),
                _ => format!("{base_file_name}-{page}"),
            },
        }
    }
}

impl fmt::Display for PageNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageNaming::Directory => f.write_str("directory"),
            PageNaming::Suffix => f.write_str("suffix"),
        }
    }
}

/// Link to the page before the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousPage {
    /// Current page is the first.
    None,
    /// The previous page is the listing root (page 1's file).
    Root,
    Page(usize),
}

impl PreviousPage {
    /// Path segment encoding: `None` for no link, `""` for the root, the
    /// page number otherwise.
    pub fn segment(&self) -> Option<String> {
        match self {
            PreviousPage::None => None,
            PreviousPage::Root => Some(String::new()),
            PreviousPage::Page(n) => Some(n.to_string()),
        }
    }

    /// Resolve to a link relative to the listing's `root` path.
    pub fn href(&self, root: &str, base_file_name: &str, naming: PageNaming) -> Option<String> {
        match self {
            PreviousPage::None => None,
            PreviousPage::Root => Some(root.to_string()),
            PreviousPage::Page(n) => Some(format!(
                "{}/{}",
                root.trim_end_matches('/'),
                naming.numbered(*n, base_file_name)
            )),
        }
    }
}

/// One page of a sequence, with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: usize,
    pub file_name: String,
    pub previous: PreviousPage,
    pub next: Option<usize>,
    /// Indices into the full item list shown on this page.
    pub items: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSequence {
    total_items: usize,
    page_size: usize,
}

impl PageSequence {
    pub fn new(total_items: usize, page_size: usize) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self {
            total_items,
            page_size,
        })
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(total_items / page_size)`; zero items means zero pages.
    pub fn page_count(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Highest valid page number. An empty listing still has its first page.
    fn last_page(&self) -> usize {
        self.page_count().max(1)
    }

    fn check(&self, page: usize) -> Result<(), PaginationError> {
        if page == 0 || page > self.last_page() {
            return Err(PaginationError::PageOutOfRange {
                page,
                last: self.last_page(),
            });
        }
        Ok(())
    }

    pub fn next_page(&self, page: usize) -> Result<Option<usize>, PaginationError> {
        self.check(page)?;
        Ok(self.next_unchecked(page))
    }

    pub fn previous_page(&self, page: usize) -> Result<PreviousPage, PaginationError> {
        self.check(page)?;
        Ok(previous_unchecked(page))
    }

    /// Output file for `page`: `base_file_name` itself for page 1, a
    /// numbered variant otherwise.
    pub fn file_name(
        &self,
        page: usize,
        base_file_name: &str,
        naming: PageNaming,
    ) -> Result<String, PaginationError> {
        self.check(page)?;
        Ok(file_name_unchecked(page, base_file_name, naming))
    }

    /// Item indices shown on `page`.
    pub fn item_range(&self, page: usize) -> Result<Range<usize>, PaginationError> {
        self.check(page)?;
        Ok(self.range_unchecked(page))
    }

    /// Every page of the sequence, in order. Empty for zero items.
    pub fn pages(&self, base_file_name: &str, naming: PageNaming) -> Vec<PageLink> {
        (1..=self.page_count())
            .map(|n| PageLink {
                number: n,
                file_name: file_name_unchecked(n, base_file_name, naming),
                previous: previous_unchecked(n),
                next: self.next_unchecked(n),
                items: self.range_unchecked(n),
            })
            .collect()
    }

    fn next_unchecked(&self, page: usize) -> Option<usize> {
        (page < self.page_count()).then_some(page + 1)
    }

    fn range_unchecked(&self, page: usize) -> Range<usize> {
        let start = ((page - 1) * self.page_size).min(self.total_items);
        let end = start.saturating_add(self.page_size).min(self.total_items);
        start..end
    }
}

fn previous_unchecked(page: usize) -> PreviousPage {
    match page {
        0 | 1 => PreviousPage::None,
        2 => PreviousPage::Root,
        n => PreviousPage::Page(n - 1),
    }
}

fn file_name_unchecked(page: usize, base_file_name: &str, naming: PageNaming) -> String {
    if page <= 1 {
        base_file_name.to_string()
    } else {
        naming.numbered(page, base_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_by_two() -> PageSequence {
        PageSequence::new(5, 2).unwrap()
    }

    // =========================================================================
    // Page count
    // =========================================================================

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(five_by_two().page_count(), 3);
        assert_eq!(PageSequence::new(4, 2).unwrap().page_count(), 2);
        assert_eq!(PageSequence::new(1, 10).unwrap().page_count(), 1);
    }

    #[test]
    fn zero_items_zero_pages() {
        assert_eq!(PageSequence::new(0, 10).unwrap().page_count(), 0);
    }

    #[test]
    fn zero_page_size_rejected() {
        assert_eq!(PageSequence::new(5, 0), Err(PaginationError::ZeroPageSize));
    }

    // =========================================================================
    // Neighbours
    // =========================================================================

    #[test]
    fn previous_page_cases() {
        let s = five_by_two();
        assert_eq!(s.previous_page(1).unwrap(), PreviousPage::None);
        assert_eq!(s.previous_page(2).unwrap(), PreviousPage::Root);
        assert_eq!(s.previous_page(3).unwrap(), PreviousPage::Page(2));
    }

    #[test]
    fn next_page_cases() {
        let s = five_by_two();
        assert_eq!(s.next_page(1).unwrap(), Some(2));
        assert_eq!(s.next_page(2).unwrap(), Some(3));
        assert_eq!(s.next_page(3).unwrap(), None);
    }

    #[test]
    fn single_page_has_no_neighbours() {
        let s = PageSequence::new(3, 10).unwrap();
        assert_eq!(s.next_page(1).unwrap(), None);
        assert_eq!(s.previous_page(1).unwrap(), PreviousPage::None);
    }

    #[test]
    fn out_of_range_pages_rejected() {
        let s = five_by_two();
        assert_eq!(
            s.next_page(0),
            Err(PaginationError::PageOutOfRange { page: 0, last: 3 })
        );
        assert_eq!(
            s.previous_page(4),
            Err(PaginationError::PageOutOfRange { page: 4, last: 3 })
        );
    }

    #[test]
    fn empty_listing_keeps_first_page() {
        let s = PageSequence::new(0, 10).unwrap();
        assert_eq!(s.next_page(1).unwrap(), None);
        assert_eq!(s.previous_page(1).unwrap(), PreviousPage::None);
        assert_eq!(s.file_name(1, "index.html", PageNaming::Directory).unwrap(), "index.html");
        assert_eq!(s.item_range(1).unwrap(), 0..0);
        assert!(s.previous_page(2).is_err());
    }

    #[test]
    fn neighbours_stay_within_bounds() {
        for total in 0..25 {
            for size in 1..6 {
                let s = PageSequence::new(total, size).unwrap();
                let count = s.page_count();
                for page in 1..=count {
                    if let Some(next) = s.next_page(page).unwrap() {
                        assert!(next >= 1 && next <= count);
                    }
                    if let PreviousPage::Page(prev) = s.previous_page(page).unwrap() {
                        assert!(prev >= 2 && prev <= count);
                    }
                }
            }
        }
    }

    // =========================================================================
    // File names
    // =========================================================================

    #[test]
    fn first_page_keeps_base_name() {
        let s = five_by_two();
        for naming in [PageNaming::Directory, PageNaming::Suffix] {
            assert_eq!(s.file_name(1, "index.html", naming).unwrap(), "index.html");
        }
    }

    #[test]
    fn directory_naming() {
        let s = five_by_two();
        assert_eq!(
            s.file_name(2, "index.html", PageNaming::Directory).unwrap(),
            "2/index.html"
        );
    }

    #[test]
    fn suffix_naming() {
        let s = five_by_two();
        assert_eq!(
            s.file_name(3, "index.html", PageNaming::Suffix).unwrap(),
            "index-3.html"
        );
    }

    #[test]
    fn suffix_naming_without_extension() {
        let s = five_by_two();
        assert_eq!(s.file_name(2, "feed", PageNaming::Suffix).unwrap(), "feed-2");
        assert_eq!(s.file_name(2, ".hidden", PageNaming::Suffix).unwrap(), ".hidden-2");
    }

    #[test]
    fn later_pages_differ_from_base_and_encode_number() {
        let s = five_by_two();
        for naming in [PageNaming::Directory, PageNaming::Suffix] {
            let name = s.file_name(2, "index.html", naming).unwrap();
            assert_ne!(name, "index.html");
            assert!(name.contains('2'));
        }
    }

    #[test]
    fn naming_parses_from_lowercase() {
        let n: PageNaming = serde_json::from_str("\"suffix\"").unwrap();
        assert_eq!(n, PageNaming::Suffix);
        assert_eq!(PageNaming::default(), PageNaming::Directory);
    }

    // =========================================================================
    // Links and plans
    // =========================================================================

    #[test]
    fn previous_segment_encoding() {
        assert_eq!(PreviousPage::None.segment(), None);
        assert_eq!(PreviousPage::Root.segment(), Some(String::new()));
        assert_eq!(PreviousPage::Page(4).segment(), Some("4".to_string()));
    }

    #[test]
    fn previous_href_resolves_root() {
        let naming = PageNaming::Directory;
        assert_eq!(PreviousPage::Root.href("/blog/", "index.html", naming), Some("/blog/".into()));
        assert_eq!(
            PreviousPage::Page(3).href("/blog/", "index.html", naming),
            Some("/blog/3/index.html".into())
        );
        assert_eq!(PreviousPage::None.href("/blog/", "index.html", naming), None);
    }

    #[test]
    fn item_ranges_cover_all_items() {
        let s = five_by_two();
        assert_eq!(s.item_range(1).unwrap(), 0..2);
        assert_eq!(s.item_range(2).unwrap(), 2..4);
        assert_eq!(s.item_range(3).unwrap(), 4..5);
    }

    #[test]
    fn item_range_at_usize_limit() {
        let size = usize::MAX / 2 + 1;
        let s = PageSequence::new(usize::MAX, size).unwrap();
        assert_eq!(s.page_count(), 2);
        assert_eq!(s.item_range(1).unwrap(), 0..size);
        assert_eq!(s.item_range(2).unwrap(), size..usize::MAX);
        assert_eq!(s.next_page(2).unwrap(), None);
    }

    #[test]
    fn pages_plan() {
        let plan = five_by_two().pages("index.html", PageNaming::Directory);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].file_name, "index.html");
        assert_eq!(plan[1].previous, PreviousPage::Root);
        assert_eq!(plan[1].file_name, "2/index.html");
        assert_eq!(plan[2].next, None);
        assert_eq!(plan[2].items, 4..5);
    }

    #[test]
    fn pages_plan_empty_for_no_items() {
        assert!(PageSequence::new(0, 3).unwrap().pages("index.html", PageNaming::Suffix).is_empty());
    }
}

//! Page selection: parse a range expression and group it into runs.
//!
//! A page-range expression is what a person types: `"1,3,5-7"`. Parsing is
//! permissive. Tokens that are not a positive integer or a `start-end` pair
//! with `start <= end` are dropped with a warning and the rest of the
//! expression still applies.
//!
//! The parsed set is then cut into maximal contiguous [`PageRun`]s so the
//! rasterizer can render `5-7` in one call instead of three, while pages
//! outside the selection are never rendered at all.

use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Highest page number accepted from an expression. pdfium addresses pages
/// with a 16-bit index, so nothing beyond this can ever render.
pub const MAX_PAGE: u32 = u16::MAX as u32;

/// A maximal run of consecutive 1-based page numbers, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRun {
    pub first: u32,
    pub last: u32,
}

impl PageRun {
    /// Page numbers in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }
}

impl fmt::Display for PageRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Parse a page-range expression into a strictly ascending, deduplicated list.
///
/// ```rust
/// use pdf2img::pipeline::pages::parse_page_range;
///
/// assert_eq!(parse_page_range("1,3,5-7"), vec![1, 3, 5, 6, 7]);
/// assert_eq!(parse_page_range("abc,1"), vec![1]);
/// assert!(parse_page_range("").is_empty());
/// ```
pub fn parse_page_range(expression: &str) -> Vec<u32> {
    let mut pages = BTreeSet::new();

    for token in expression.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        match parse_token(token) {
            Some((start, end)) => pages.extend(start..=end),
            None => warn!("Ignoring malformed page token '{}'", token),
        }
    }

    pages.into_iter().collect()
}

/// Parse one token as `N` or `A-B`. `None` means "discard".
fn parse_token(token: &str) -> Option<(u32, u32)> {
    let (start, end) = match token.split_once('-') {
        Some((a, b)) => (parse_page(a)?, parse_page(b)?),
        None => {
            let page = parse_page(token)?;
            (page, page)
        }
    };
    (start <= end).then_some((start, end))
}

fn parse_page(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|&p| (1..=MAX_PAGE).contains(&p))
}

/// Partition an ascending page list into maximal contiguous runs.
///
/// Expanding the runs in order reproduces `pages` exactly.
///
/// ```rust
/// use pdf2img::pipeline::pages::{group_runs, PageRun};
///
/// let runs = group_runs(&[1, 2, 3, 5, 7, 8]);
/// assert_eq!(runs, vec![
///     PageRun { first: 1, last: 3 },
///     PageRun { first: 5, last: 5 },
///     PageRun { first: 7, last: 8 },
/// ]);
/// ```
pub fn group_runs(pages: &[u32]) -> Vec<PageRun> {
    let mut runs: Vec<PageRun> = Vec::new();

    for &page in pages {
        match runs.last_mut() {
            Some(run) if run.last.checked_add(1) == Some(page) => run.last = page,
            _ => runs.push(PageRun {
                first: page,
                last: page,
            }),
        }
    }

    runs
}

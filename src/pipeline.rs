//! The filter → sort → paginate pipeline.
//!
//! Every stage is a pure function over borrowed records. Nothing here
//! allocates a copy of a [`Component`]: the stages pass `&Component`s along
//! and the view renders straight from the catalog's storage.
//!
//! ```text
//! catalog ──filter(type, brand)──▶ matches ──sort(key)──▶ ordered ──paginate(page)──▶ page
//!                    │
//!                    └── empty ──▶ NoData (404)
//! ```
//!
//! Only filtering can turn a non-empty input into an empty one, so
//! emptiness is checked exactly once, right after [`filter`].

use thiserror::Error;

use crate::catalog::Component;

/// Records per page. Not configurable through the HTTP interface.
pub const PER_PAGE: usize = 3;

// ── Filter ────────────────────────────────────────────────────────────────────

/// Keeps the records whose type and brand equal the given predicates.
///
/// An empty predicate matches everything. Matching is exact and
/// case-sensitive. Input order is preserved.
pub fn filter<'a>(components: &'a [Component], kind: &str, brand: &str) -> Vec<&'a Component> {
    components
        .iter()
        .filter(|c| kind.is_empty() || c.kind == kind)
        .filter(|c| brand.is_empty() || c.brand == brand)
        .collect()
}

// ── Sort ──────────────────────────────────────────────────────────────────────

/// Field to order a result set by. Always ascending.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    Name,
    Price,
    /// Unrecognized or empty key: keep input order.
    Unordered,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name      => "name",
            Self::Price     => "price",
            Self::Unordered => "",
        }
    }
}

/// Never fails: anything other than `name` or `price` (case-sensitive)
/// becomes [`SortKey::Unordered`].
impl From<&str> for SortKey {
    fn from(s: &str) -> Self {
        match s {
            "name"  => Self::Name,
            "price" => Self::Price,
            _       => Self::Unordered,
        }
    }
}

/// Orders `components` in place. `sort_by` is stable, so equal keys keep
/// their relative order and page boundaries are deterministic.
pub fn sort(components: &mut [&Component], key: SortKey) {
    match key {
        SortKey::Name      => components.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Price     => components.sort_by_key(|c| c.price),
        SortKey::Unordered => {}
    }
}

// ── Paginate ──────────────────────────────────────────────────────────────────

/// Parses a 1-based page number. Anything unparsable or below 1 is page 1.
pub fn page_number(raw: &str) -> usize {
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => 1,
    }
}

/// Returns the `page`-th window of `per_page` items, parsing `page` with
/// [`page_number`].
///
/// A window that starts past the end is empty, not an error.
pub fn paginate<'a, T>(items: &'a [T], page: &str, per_page: usize) -> &'a [T] {
    page_window(items, page_number(page), per_page)
}

/// Window for an already-normalised 1-based page number.
pub fn page_window<T>(items: &[T], number: usize, per_page: usize) -> &[T] {
    let start = match number.saturating_sub(1).checked_mul(per_page) {
        Some(start) if start < items.len() => start,
        _ => return &[],
    };
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

// ── Composition ───────────────────────────────────────────────────────────────

/// Raw query parameters for one pipeline run.
///
/// Fields hold untrusted request input verbatim. Interpretation (sort key
/// recognition, page normalisation) happens inside the stages.
#[derive(Clone, Debug, Default)]
pub struct ComponentQuery {
    pub kind: String,
    pub brand: String,
    pub sort: String,
    pub page: String,
}

/// The filter matched nothing.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("No data available")]
pub struct NoData;

/// One page of an ordered, filtered result.
#[derive(Debug)]
pub struct Page<'a> {
    pub items: Vec<&'a Component>,
    /// Records that passed the filter, before pagination.
    pub matched: usize,
    /// Effective 1-based page number after normalisation.
    pub number: usize,
    pub per_page: usize,
}

/// Runs filter, sort and paginate over `components`.
pub fn run<'a>(
    components: &'a [Component],
    query: &ComponentQuery,
    per_page: usize,
) -> Result<Page<'a>, NoData> {
    let mut matches = filter(components, &query.kind, &query.brand);
    if matches.is_empty() {
        return Err(NoData);
    }

    sort(&mut matches, SortKey::from(query.sort.as_str()));

    let number = page_number(&query.page);
    let items = page_window(&matches, number, per_page).to_vec();
    Ok(Page {
        items,
        matched: matches.len(),
        number,
        per_page,
    })
}

use tracing::debug;

use crate::{
    catalog::{Catalog, Category, CatalogEntry, EntryRef},
    filter::{FilterState, MatchScore},
    identity::ItemIdentity,
    selection::SelectionSet,
    store::KeyValueStore,
    text_util::{Span, highlight},
};

/// One row of the projected table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedEntry<'a> {
    pub entry: &'a CatalogEntry,
    pub field: &'a str,
    pub category: Category,
    pub rank: &'a str,
    pub score: MatchScore,
    pub identity: ItemIdentity,
    pub selected: bool,
}

impl<'a> ProjectedEntry<'a> {
    fn new(
        item: EntryRef<'a>,
        identity: ItemIdentity,
        score: MatchScore,
        selected: bool,
    ) -> Self {
        Self {
            entry: item.entry,
            field: item.field,
            category: item.category,
            rank: item.rank,
            score,
            identity,
            selected,
        }
    }

    pub fn abbreviation_spans(&self, query: &str) -> Vec<Span<'a>> {
        highlight(&self.entry.abbreviation, query)
    }

    pub fn full_name_spans(&self, query: &str) -> Vec<Span<'a>> {
        highlight(&self.entry.full_name, query)
    }
}

/// Walk the catalog and return every entry `filter` admits.
///
/// Results are stable-sorted by descending score, so entries with equal
/// scores keep catalog order. Without a query that is exactly catalog order.
pub fn project<'a, S: KeyValueStore>(
    catalog: &'a Catalog,
    filter: &FilterState,
    selection: &SelectionSet<S>,
) -> Vec<ProjectedEntry<'a>> {
    let mut results: Vec<ProjectedEntry<'a>> = catalog
        .entries()
        .filter_map(|item| {
            let score = filter.evaluate(&item)?;
            let identity = item.identity();
            let selected = selection.contains(&identity);
            Some(ProjectedEntry::new(item, identity, score, selected))
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

/// The selection summary as rows, for rendering beside the results.
pub fn selected_entries<'a, S: KeyValueStore>(
    catalog: &'a Catalog,
    selection: &SelectionSet<S>,
) -> Vec<ProjectedEntry<'a>> {
    selection
        .summary(catalog)
        .into_iter()
        .map(|item| {
            let identity = item.identity();
            ProjectedEntry::new(item, identity, MatchScore::Unscored, true)
        })
        .collect()
}

/// Everything a rendering sink needs after one control change.
#[derive(Debug, Clone)]
pub struct View<'a> {
    pub query: String,
    pub selection_mode: bool,
    pub results: Vec<ProjectedEntry<'a>>,
    pub selected: Vec<ProjectedEntry<'a>>,
    /// Why the catalog is empty, when it failed to load.
    pub load_error: Option<String>,
}

impl View<'_> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Recompute the whole view from scratch.
pub fn recompute<'a, S: KeyValueStore>(
    catalog: &'a Catalog,
    filter: &FilterState,
    selection: &SelectionSet<S>,
) -> View<'a> {
    let results = project(catalog, filter, selection);
    let selected = selected_entries(catalog, selection);
    debug!(
        query = filter.query(),
        results = results.len(),
        selected = selected.len(),
        "recomputed view"
    );
    View {
        query: filter.query().to_string(),
        selection_mode: filter.selection_mode,
        results,
        selected,
        load_error: None,
    }
}

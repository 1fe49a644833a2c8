use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    catalog::{Category, EntryRef},
    text_util::{contains_folded, fold_case},
};

/// Control value meaning "do not filter".
pub const ALL: &str = "all";

/// A dropdown-style control: either everything or one exact label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Only(String),
}

impl Scope {
    /// Interpret a control value, where `all` means no restriction.
    pub fn from_control(value: &str) -> Self {
        if value == ALL {
            Scope::All
        } else {
            Scope::Only(value.to_string())
        }
    }

    /// Exact, case-sensitive comparison.
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(wanted) => wanted == value,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str(ALL),
            Scope::Only(v) => f.write_str(v),
        }
    }
}

/// The type control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Journals,
    Conferences,
}

impl TypeFilter {
    pub fn admits(self, category: Category) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Journals => category == Category::Journal,
            TypeFilter::Conferences => category == Category::Conference,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ALL => Ok(TypeFilter::All),
            "journals" => Ok(TypeFilter::Journals),
            "conferences" => Ok(TypeFilter::Conferences),
            other => Err(format!(
                "unknown type '{other}' (expected all, journals or conferences)"
            )),
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeFilter::All => ALL,
            TypeFilter::Journals => "journals",
            TypeFilter::Conferences => "conferences",
        })
    }
}

/// How an included entry matched the query. Higher sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub enum MatchScore {
    /// No query was given.
    Unscored = 0,
    FullName = 1,
    Abbreviation = 2,
}

impl From<MatchScore> for u8 {
    fn from(score: MatchScore) -> Self {
        score as u8
    }
}

/// Current values of every control. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub rank: Scope,
    pub field: Scope,
    pub kind: TypeFilter,
    query: String,
    folded_query: String,
    /// Whether selection affordances are rendered.
    pub selection_mode: bool,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank(mut self, rank: Scope) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_field(mut self, field: Scope) -> Self {
        self.field = field;
        self
    }

    pub fn with_kind(mut self, kind: TypeFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.set_query(query);
        self
    }

    pub fn with_selection_mode(mut self, on: bool) -> Self {
        self.selection_mode = on;
        self
    }

    /// Surrounding whitespace is ignored; a blank query disables the text
    /// filter.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_string();
        self.folded_query = fold_case(&self.query);
    }

    /// The trimmed query, empty when there is no text filter.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    /// Decide whether `item` is shown and how it ranks.
    ///
    /// Returns `None` when any control excludes the entry. With an empty
    /// query every admitted entry scores [`MatchScore::Unscored`] and no
    /// substring test runs.
    pub fn evaluate(&self, item: &EntryRef<'_>) -> Option<MatchScore> {
        if !self.field.admits(item.field)
            || !self.kind.admits(item.category)
            || !self.rank.admits(item.rank)
        {
            return None;
        }

        if !self.has_query() {
            return Some(MatchScore::Unscored);
        }

        if contains_folded(&item.entry.abbreviation, &self.folded_query) {
            Some(MatchScore::Abbreviation)
        } else if contains_folded(&item.entry.full_name, &self.folded_query) {
            Some(MatchScore::FullName)
        } else {
            None
        }
    }
}

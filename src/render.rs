//! Rendering sinks for a [`View`]: terminal text, JSON, and HTML markup.

use serde::Serialize;

use crate::{
    catalog::Category,
    error::Result,
    search::{ProjectedEntry, View},
    text_util::Span,
};

/// Placeholder shown when no entry passes the filters.
pub const NO_RESULTS: &str = "No results found.";

const COLUMNS: [&str; 7] = [
    "Abbreviation",
    "Full Name",
    "Type",
    "Rank",
    "Field",
    "Publisher",
    "Notes",
];

/// Badge classes for a category.
pub fn type_badge(category: Category) -> &'static str {
    match category {
        Category::Journal => "bg-primary",
        Category::Conference => "bg-info text-dark",
    }
}

/// Badge classes for a rank label, `None` for labels without a style.
pub fn rank_badge(rank: &str) -> Option<&'static str> {
    match rank {
        "A" => Some("bg-danger"),
        "B" => Some("bg-warning text-dark"),
        "C" => Some("bg-success"),
        _ => None,
    }
}

// -- Human --

/// Plain terminal output: one line per result, then the selection panel.
pub fn format_human(view: &View<'_>) -> String {
    let mut out = String::new();

    if let Some(err) = &view.load_error {
        out.push_str(&format!("Error: catalog could not be loaded: {err}\n"));
    }

    if view.results.is_empty() {
        out.push_str(&format!("{NO_RESULTS}\n"));
    } else {
        for r in &view.results {
            out.push_str(&human_row(r, view.selection_mode));
        }
        out.push_str(&format!("\n{} result(s)\n", view.results.len()));
    }

    if !view.selected.is_empty() {
        out.push_str(&format!("\nSelected ({}):\n", view.selected.len()));
        for r in &view.selected {
            out.push_str(&human_row(r, true));
        }
    }

    out
}

/// The selection panel on its own.
pub fn format_selected_human(view: &View<'_>) -> String {
    if view.selected.is_empty() {
        return "No venues selected.\n".to_string();
    }
    let mut out: String =
        view.selected.iter().map(|r| human_row(r, false)).collect();
    out.push_str(&format!("\n{} selected\n", view.selected.len()));
    out
}

fn human_row(r: &ProjectedEntry<'_>, marker: bool) -> String {
    let mut row = String::new();
    if marker {
        row.push_str(if r.selected { "[x] " } else { "[ ] " });
    }
    row.push_str(&format!(
        "{:<12} {:<10} {:<2} {}  {}",
        r.entry.abbreviation,
        r.category.name(),
        r.rank,
        r.field,
        r.entry.full_name,
    ));
    if !r.entry.publisher.is_empty() {
        row.push_str(&format!(" ({})", r.entry.publisher));
    }
    if let Some(notes) = &r.entry.notes {
        row.push_str(&format!(" - {notes}"));
    }
    row.push('\n');
    row
}

// -- JSON --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewJson<'a> {
    pub query: &'a str,
    pub selection_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    pub result_count: usize,
    pub results: Vec<EntryJson<'a>>,
    pub selected: Vec<EntryJson<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryJson<'a> {
    pub key: String,
    pub abbreviation: &'a str,
    pub full_name: &'a str,
    pub url: &'a str,
    pub publisher: &'a str,
    pub notes: Option<&'a str>,
    #[serde(rename = "type")]
    pub category: Category,
    pub rank: &'a str,
    pub field: &'a str,
    pub score: u8,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Highlights<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights<'a> {
    pub abbreviation: Vec<Span<'a>>,
    pub full_name: Vec<Span<'a>>,
}

impl<'a> EntryJson<'a> {
    pub fn new(r: &ProjectedEntry<'a>, query: &str) -> Self {
        let highlights = (!query.is_empty()).then(|| Highlights {
            abbreviation: r.abbreviation_spans(query),
            full_name: r.full_name_spans(query),
        });
        Self {
            key: r.identity.key(),
            abbreviation: &r.entry.abbreviation,
            full_name: &r.entry.full_name,
            url: &r.entry.url,
            publisher: &r.entry.publisher,
            notes: r.entry.notes.as_deref(),
            category: r.category,
            rank: r.rank,
            field: r.field,
            score: r.score.into(),
            selected: r.selected,
            highlights,
        }
    }
}

impl<'a> ViewJson<'a> {
    pub fn new(view: &'a View<'a>) -> Self {
        let query = view.query.as_str();
        Self {
            query,
            selection_mode: view.selection_mode,
            error: view.load_error.as_deref(),
            result_count: view.results.len(),
            results: view
                .results
                .iter()
                .map(|r| EntryJson::new(r, query))
                .collect(),
            selected: view
                .selected
                .iter()
                .map(|r| EntryJson::new(r, ""))
                .collect(),
        }
    }
}

pub fn format_json(view: &View<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ViewJson::new(view))?)
}

// -- HTML --

/// Render the results table and the selected-items panel as HTML.
pub fn format_html(view: &View<'_>) -> String {
    let mut out = String::new();

    if let Some(err) = &view.load_error {
        out.push_str(&format!(
            "<div class=\"alert alert-danger\" role=\"alert\">Catalog could not be loaded: {}</div>\n",
            escape_html(err)
        ));
    }

    out.push_str(&table_html(
        &view.results,
        &view.query,
        view.selection_mode,
    ));

    out.push_str("<section id=\"selected-items\">\n");
    out.push_str(&format!(
        "<h2>Selected items ({})</h2>\n",
        view.selected.len()
    ));
    out.push_str(&table_html(&view.selected, "", true));
    out.push_str("</section>\n");

    out
}

fn table_html(
    rows: &[ProjectedEntry<'_>],
    query: &str,
    selection_mode: bool,
) -> String {
    let mut out = String::from(
        "<table class=\"table table-striped table-hover table-bordered align-middle\"><thead><tr>",
    );
    if selection_mode {
        out.push_str("<th></th>");
    }
    for column in COLUMNS {
        out.push_str(&format!("<th>{column}</th>"));
    }
    out.push_str("</tr></thead><tbody>\n");

    if rows.is_empty() {
        let colspan = COLUMNS.len() + usize::from(selection_mode);
        out.push_str(&format!(
            "<tr><td colspan=\"{colspan}\" class=\"text-center\">{NO_RESULTS}</td></tr>\n"
        ));
    }

    for r in rows {
        out.push_str("<tr>");
        if selection_mode {
            let state = if r.selected { " selected" } else { "" };
            out.push_str(&format!(
                "<td><span class=\"select-dot{state}\" data-key=\"{}\"></span></td>",
                escape_html(&r.identity.key())
            ));
        }
        out.push_str(&format!(
            "<td><a href=\"{}\" target=\"_blank\">{}</a></td>",
            escape_html(&r.entry.url),
            marked_html(&r.abbreviation_spans(query))
        ));
        out.push_str(&format!(
            "<td class=\"w-50\">{}</td>",
            marked_html(&r.full_name_spans(query))
        ));
        out.push_str(&format!(
            "<td><span class=\"badge {}\">{}</span></td>",
            type_badge(r.category),
            r.category.name()
        ));
        out.push_str(&format!(
            "<td>{}</td>",
            badge_html(rank_badge(r.rank), r.rank)
        ));
        out.push_str(&format!("<td>{}</td>", escape_html(r.field)));
        out.push_str(&format!(
            "<td>{}</td>",
            escape_html(&r.entry.publisher)
        ));
        out.push_str(&format!(
            "<td>{}</td>",
            escape_html(r.entry.notes.as_deref().unwrap_or(""))
        ));
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody></table>\n");
    out
}

fn badge_html(class: Option<&str>, label: &str) -> String {
    match class {
        Some(class) => {
            format!("<span class=\"badge {class}\">{}</span>", escape_html(label))
        }
        None => format!("<span class=\"badge\">{}</span>", escape_html(label)),
    }
}

fn marked_html(spans: &[Span<'_>]) -> String {
    spans
        .iter()
        .map(|span| {
            if span.matched {
                format!("<mark>{}</mark>", escape_html(span.text))
            } else {
                escape_html(span.text)
            }
        })
        .collect()
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

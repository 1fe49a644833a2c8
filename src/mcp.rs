use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    catalog::Category,
    config_db::ConfigDb,
    error,
    filter::{self, FilterState, Scope, TypeFilter},
    render::{EntryJson, ViewJson},
    search::View,
    session::{Session, VenueRef},
};

/// Rows listed in the text summary of a tool result.
const SUMMARY_ROWS: usize = 20;

#[derive(Clone)]
pub struct VenuedexMcpServer {
    session: Arc<Mutex<Session<ConfigDb>>>,
    tool_router: ToolRouter<Self>,
}

impl VenuedexMcpServer {
    fn new(session: Session<ConfigDb>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, Session<ConfigDb>>, rmcp::ErrorData> {
        self.session.lock().map_err(|_| {
            rmcp::ErrorData::internal_error("session lock poisoned", None)
        })
    }
}

#[tool_router(router = tool_router)]
impl VenuedexMcpServer {
    /// Filter and search the venue catalog.
    #[tool(
        name = "venuedex_search",
        description = "Search the venue catalog by abbreviation or full name. Supports rank, field of study and journal/conference filters."
    )]
    pub async fn venuedex_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let filter = params.0.filter()?;
        let session = self.lock()?;
        let view = session.view(&filter);

        let summary = format_search_summary(&view);
        let structured = serde_json::to_value(ViewJson::new(&view))
            .map_err(|e| mcp_error("failed to serialize search results", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        result.is_error = Some(view.load_error.is_some());
        Ok(result)
    }

    /// Add a venue to the selection, or remove it if already selected.
    #[tool(
        name = "venuedex_toggle",
        description = "Toggle a venue in the persistent selection. Pass the key from venuedex_search, or an abbreviation with optional field and category."
    )]
    pub async fn venuedex_toggle(
        &self,
        params: Parameters<ToggleParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let venue = params.0.venue()?;
        let mut session = self.lock()?;
        let (identity, selected) = session
            .toggle(&venue)
            .map_err(|e| mcp_error("toggle failed", e))?;

        let response = ToggleResponse {
            key: identity.key(),
            selected,
            selected_count: session.selected_count(),
        };
        let summary = format!(
            "{} {} ({} selected)",
            if selected { "Selected" } else { "Deselected" },
            identity.abbreviation(),
            response.selected_count
        );
        let structured = serde_json::to_value(response)
            .map_err(|e| mcp_error("failed to serialize toggle result", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        result.is_error = Some(false);
        Ok(result)
    }

    /// List the selected venues.
    #[tool(
        name = "venuedex_selected",
        description = "List the venues in the persistent selection, sorted by abbreviation."
    )]
    pub async fn venuedex_selected(
        &self,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let session = self.lock()?;
        let view = session.view(&FilterState::new());
        let selected: Vec<EntryJson<'_>> =
            view.selected.iter().map(|r| EntryJson::new(r, "")).collect();

        let summary = if selected.is_empty() {
            "No venues selected.".to_string()
        } else {
            let mut lines = vec![format!("{} selected:", selected.len())];
            lines.extend(selected.iter().map(|e| {
                format!("{} {} {}", e.abbreviation, e.category, e.key)
            }));
            lines.join("\n")
        };
        let structured = serde_json::to_value(SelectedResponse {
            selected_count: selected.len(),
            selected,
        })
        .map_err(|e| mcp_error("failed to serialize selection", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        result.is_error = Some(false);
        Ok(result)
    }

    /// List the fields of study.
    #[tool(
        name = "venuedex_fields",
        description = "List the fields of study in the catalog, for use as the field filter."
    )]
    pub async fn venuedex_fields(
        &self,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let session = self.lock()?;
        let fields: Vec<&str> = session.catalog().field_names().collect();
        let load_error = session.load_error();

        let summary = if let Some(err) = load_error {
            format!("Catalog could not be loaded: {err}")
        } else if fields.is_empty() {
            "The catalog is empty.".to_string()
        } else {
            fields.join("\n")
        };
        let structured = match load_error {
            Some(err) => json!({ "fields": fields, "error": err }),
            None => json!({ "fields": fields }),
        };

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        result.is_error = Some(load_error.is_some());
        Ok(result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for VenuedexMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("venuedex", env!("CARGO_PKG_VERSION"))
                    .with_title("venuedex MCP"),
            )
            .with_instructions(
                "Use venuedex_search to look up ranked venues and venuedex_toggle with a result key to bookmark them.",
            )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Text matched case-insensitively against abbreviations and full names.
    pub query: Option<String>,
    /// Rank label such as A, B or C (default: all).
    pub rank: Option<String>,
    /// Exact field of study name (default: all).
    pub field: Option<String>,
    /// all, journals or conferences (default: all).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Report selection state for each result (default: false).
    pub selection_mode: Option<bool>,
}

impl SearchParams {
    fn filter(&self) -> Result<FilterState, rmcp::ErrorData> {
        let kind = match &self.kind {
            Some(kind) => kind
                .parse::<TypeFilter>()
                .map_err(|e| rmcp::ErrorData::invalid_params(e, None))?,
            None => TypeFilter::All,
        };
        let scope = |value: &Option<String>| {
            Scope::from_control(value.as_deref().unwrap_or(filter::ALL))
        };
        Ok(FilterState::new()
            .with_rank(scope(&self.rank))
            .with_field(scope(&self.field))
            .with_kind(kind)
            .with_query(self.query.as_deref().unwrap_or(""))
            .with_selection_mode(self.selection_mode.unwrap_or(false)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleParams {
    /// Venue key as returned by venuedex_search.
    pub key: Option<String>,
    /// Venue abbreviation, used when no key is given.
    pub abbreviation: Option<String>,
    /// Field of study, to narrow an ambiguous abbreviation.
    pub field: Option<String>,
    /// journal or conference, to narrow an ambiguous abbreviation.
    pub category: Option<String>,
}

impl ToggleParams {
    fn venue(&self) -> Result<VenueRef, rmcp::ErrorData> {
        if let Some(key) = &self.key {
            return Ok(VenueRef::Key(key.clone()));
        }
        let Some(abbreviation) = &self.abbreviation else {
            return Err(rmcp::ErrorData::invalid_params(
                "either key or abbreviation is required",
                None,
            ));
        };
        let category = self
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()
            .map_err(|e| rmcp::ErrorData::invalid_params(e, None))?;
        Ok(VenueRef::Abbreviation {
            abbreviation: abbreviation.clone(),
            field: self.field.clone(),
            category,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    key: String,
    selected: bool,
    selected_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectedResponse<'a> {
    selected_count: usize,
    selected: Vec<EntryJson<'a>>,
}

fn format_search_summary(view: &View<'_>) -> String {
    if let Some(err) = &view.load_error {
        return format!("Catalog could not be loaded: {err}");
    }
    if view.results.is_empty() {
        return "No results found.".to_string();
    }

    let mut lines =
        Vec::with_capacity(view.results.len().min(SUMMARY_ROWS) + 2);
    let suffix = if view.results.len() == 1 { "" } else { "s" };
    if view.query.is_empty() {
        lines.push(format!("Found {} venue{suffix}:", view.results.len()));
    } else {
        lines.push(format!(
            "Found {} venue{suffix} for \"{}\":",
            view.results.len(),
            view.query
        ));
    }

    for r in view.results.iter().take(SUMMARY_ROWS) {
        lines.push(format!(
            "{} [{} {}] {} - {}",
            r.entry.abbreviation,
            r.category,
            r.rank,
            r.field,
            r.entry.full_name
        ));
    }
    if view.results.len() > SUMMARY_ROWS {
        lines.push(format!("... {} more", view.results.len() - SUMMARY_ROWS));
    }

    lines.join("\n")
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(session: Session<ConfigDb>) -> error::Result<()> {
    let server = VenuedexMcpServer::new(session);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::Catalog,
        selection::SELECTION_KEY,
        store::KeyValueStore,
    };

    const DOC: &str = r#"{"fieldsOfStudy": [
        {"name": "AI",
         "journals": {"A": [{"abbreviation": "JAIR", "fullName": "Journal of Artificial Intelligence Research", "url": "https://jair.org", "publisher": "AI Access"}]},
         "conferences": {"A": [{"abbreviation": "AAAI", "fullName": "AAAI Conference on Artificial Intelligence", "url": "https://aaai.org", "publisher": "AAAI"}],
                         "B": [{"abbreviation": "ECAI", "fullName": "European Conference on Artificial Intelligence", "url": "", "publisher": "IOS Press"}]}},
        {"name": "Graphics",
         "journals": {"A": [{"abbreviation": "TOG", "fullName": "ACM Transactions on Graphics", "url": "", "publisher": "ACM"}]},
         "conferences": {}}
    ]}"#;

    fn server(tmp: &std::path::Path) -> VenuedexMcpServer {
        let config_db = ConfigDb::open(&tmp.join("config.redb")).unwrap();
        let catalog = Catalog::from_json_str(DOC).unwrap();
        VenuedexMcpServer::new(Session::new(catalog, config_db))
    }

    fn summary(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn search_tool_returns_structured_results() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path());

        let params = SearchParams {
            query: Some("ai".to_string()),
            kind: Some("conferences".to_string()),
            ..Default::default()
        };
        let result = server.venuedex_search(Parameters(params)).await.unwrap();

        let structured = result.structured_content.clone().expect("structured");
        let results = structured
            .get("results")
            .and_then(|v| v.as_array())
            .expect("results array");

        let abbrs: Vec<&str> = results
            .iter()
            .filter_map(|r| r.get("abbreviation").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(abbrs, ["AAAI", "ECAI"]);
        assert_eq!(
            results[0].get("key").and_then(|v| v.as_str()),
            Some("AI/Conference/AAAI")
        );
        assert_eq!(results[0].get("score").and_then(|v| v.as_u64()), Some(2));
        assert!(summary(&result).contains("Found 2 venues for \"ai\""));
    }

    #[tokio::test]
    async fn search_tool_rejects_unknown_type() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path());

        let params = SearchParams {
            kind: Some("workshops".to_string()),
            ..Default::default()
        };
        assert!(server.venuedex_search(Parameters(params)).await.is_err());
    }

    #[tokio::test]
    async fn toggle_then_list_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path());

        let params = ToggleParams {
            abbreviation: Some("TOG".to_string()),
            category: Some("journal".to_string()),
            ..Default::default()
        };
        let result = server.venuedex_toggle(Parameters(params)).await.unwrap();
        let structured = result.structured_content.expect("structured");
        assert_eq!(
            structured.get("key").and_then(|v| v.as_str()),
            Some("Graphics/Journal/TOG")
        );
        assert_eq!(structured.get("selected"), Some(&json!(true)));

        let listed = server.venuedex_selected().await.unwrap();
        assert!(summary(&listed).contains("TOG"));
        let structured = listed.structured_content.expect("structured");
        assert_eq!(structured.get("selectedCount"), Some(&json!(1)));

        let params = ToggleParams {
            key: Some("Graphics/Journal/TOG".to_string()),
            ..Default::default()
        };
        let result = server.venuedex_toggle(Parameters(params)).await.unwrap();
        assert!(summary(&result).starts_with("Deselected TOG"));

        let listed = server.venuedex_selected().await.unwrap();
        assert_eq!(summary(&listed), "No venues selected.");
    }

    #[tokio::test]
    async fn toggle_requires_a_venue() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path());
        assert!(
            server
                .venuedex_toggle(Parameters(ToggleParams::default()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn fields_tool_reports_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config_db =
            ConfigDb::open(&tmp.path().join("config.redb")).unwrap();
        let session =
            Session::open(&tmp.path().join("missing.json"), config_db);
        let server = VenuedexMcpServer::new(session);

        let result = server.venuedex_fields().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(summary(&result).starts_with("Catalog could not be loaded"));
        let structured = result.structured_content.expect("structured");
        assert!(
            structured
                .get("error")
                .and_then(|v| v.as_str())
                .is_some_and(|e| e.contains("missing.json"))
        );
        assert_eq!(structured.get("fields"), Some(&json!([])));
    }

    #[tokio::test]
    async fn toggle_removes_venue_missing_from_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let config_db =
            ConfigDb::open(&tmp.path().join("config.redb")).unwrap();
        config_db
            .set(SELECTION_KEY, r#"["Graphics/Conference/GONE"]"#)
            .unwrap();
        let catalog = Catalog::from_json_str(DOC).unwrap();
        let server = VenuedexMcpServer::new(Session::new(catalog, config_db));

        let params = ToggleParams {
            key: Some("Graphics/Conference/GONE".to_string()),
            ..Default::default()
        };
        let result = server.venuedex_toggle(Parameters(params)).await.unwrap();
        let structured = result.structured_content.expect("structured");
        assert_eq!(structured.get("selected"), Some(&json!(false)));
        assert_eq!(structured.get("selectedCount"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn fields_tool_lists_names() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path());

        let result = server.venuedex_fields().await.unwrap();
        assert_eq!(
            result.structured_content,
            Some(json!({ "fields": ["AI", "Graphics"] }))
        );
        assert_eq!(summary(&result), "AI\nGraphics");
    }
}

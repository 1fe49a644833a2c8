use std::path::{Path, PathBuf};

use rmcp::{
    ServiceExt,
    model::CallToolRequestParams,
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Value, json};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.json")
}

fn call(name: &'static str, args: Value) -> CallToolRequestParams {
    let mut params = CallToolRequestParams::new(name);
    params.arguments = args.as_object().cloned();
    params
}

#[tokio::test]
async fn mcp_stdio_search_and_toggle_roundtrip()
-> Result<(), Box<dyn std::error::Error>> {
    let tempdir = tempfile::tempdir()?;

    let bin = venuedex_bin()?;
    let transport = TokioChildProcess::new(
        tokio::process::Command::new(bin).configure(|cmd| {
            cmd.arg("mcp")
                .env("VENUEDEX_DATA_DIR", tempdir.path())
                .env("VENUEDEX_CATALOG", fixture());
        }),
    )?;

    let client = ().serve(transport).await?;

    let result = client
        .peer()
        .call_tool(call(
            "venuedex_search",
            json!({ "query": "graph", "type": "all" }),
        ))
        .await?;

    let structured = result.structured_content.expect("structured content");
    let results = structured
        .get("results")
        .and_then(|v| v.as_array())
        .expect("results array");

    let abbrs: Vec<&str> = results
        .iter()
        .filter_map(|r| r.get("abbreviation").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(abbrs, ["SIGGRAPH", "TOG"]);

    let key = results[1]
        .get("key")
        .and_then(|v| v.as_str())
        .expect("result key")
        .to_string();

    let toggled = client
        .peer()
        .call_tool(call("venuedex_toggle", json!({ "key": key })))
        .await?;
    let structured = toggled.structured_content.expect("structured content");
    assert_eq!(structured.get("selected"), Some(&json!(true)));
    assert_eq!(structured.get("selectedCount"), Some(&json!(1)));

    let listed = client
        .peer()
        .call_tool(call("venuedex_selected", json!({})))
        .await?;
    let structured = listed.structured_content.expect("structured content");
    let selected = structured
        .get("selected")
        .and_then(|v| v.as_array())
        .expect("selected array");
    assert_eq!(selected.len(), 1);
    assert_eq!(
        selected[0].get("key").and_then(|v| v.as_str()),
        Some(key.as_str())
    );

    let fields = client
        .peer()
        .call_tool(call("venuedex_fields", json!({})))
        .await?;
    assert_eq!(
        fields.structured_content,
        Some(json!({
            "fields": ["Artificial Intelligence", "Computer Graphics and Multimedia"]
        }))
    );

    client.cancel().await?;
    Ok(())
}

fn venuedex_bin() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(bin) = std::env::var("CARGO_BIN_EXE_venuedex") {
        return Ok(PathBuf::from(bin));
    }

    let mut path = std::env::current_exe()?;
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("venuedex");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    Ok(path)
}

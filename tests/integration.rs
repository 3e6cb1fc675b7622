use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pubcat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pubcat");
    path
}

fn sample_records() -> Value {
    let mut records = vec![json!({
        "kind": "zenodo",
        "zenodo_id": 987,
        "title": "Stable Systems Report",
        "published": "2024-06-01",
        "description": "<p>Detailed report body</p>",
        "creators": ["A. Author"],
        "creator_details": [{ "name": "A. Author", "orcid": "0000-0002-1825-0097", "affiliation": ["CLIR"] }],
        "doi": "10.5281/zenodo.987",
        "keywords": ["type:report", "topic:stability"],
        "type": "report",
        "zenodo_html": "https://zenodo.org/records/987",
        "links": { "thumbnails": { "250": "https://zenodo.org/thumb-250.jpg" } },
        "files": [{ "key": "report.pdf", "url": "https://zenodo.org/records/987/files/report.pdf" }]
    })];
    for i in 1..=12u64 {
        let keyword = if i % 2 == 0 { "topic:Policy" } else { "Libraries" };
        records.push(json!({
            "kind": "zenodo",
            "zenodo_id": 1000 + i,
            "title": format!("Catalog Report {}", i),
            "published": format!("2020-01-{:02}", i),
            "description": "Body text",
            "creators": ["B. Writer"],
            "keywords": [keyword],
            "type": "report"
        }));
    }
    records.push(json!({
        "kind": "zenodo",
        "zenodo_id": 5000,
        "title": "Recorded Talk",
        "published": "2023-03-03",
        "keywords": ["type:video"],
        "type": "video"
    }));
    Value::Array(records)
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("src/_data")).unwrap();

    fs::write(
        root.join("src/_data/zenodo.json"),
        serde_json::to_string_pretty(&sample_records()).unwrap(),
    )
    .unwrap();

    let config_content = format!(
        r#"[paths]
records = "{root}/src/_data/zenodo.json"
index_output = "{root}/dist/assets/search-index.json"

[site]
path_prefix = "/"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("pubcat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pubcat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pubcat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("ZENODO_COMMUNITY")
        .env_remove("ZENODO_PAGE_SIZE")
        .env_remove("ZENODO_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pubcat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn artifact_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("dist/assets/search-index.json")
}

fn read_artifact(tmp: &TempDir) -> Value {
    serde_json::from_str(&fs::read_to_string(artifact_path(tmp)).unwrap()).unwrap()
}

#[test]
fn test_build_index_writes_docs() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pubcat(&config_path, &["build-index"]);
    assert!(success, "build-index failed: {}", stderr);
    assert!(stdout.contains("Built search index"));

    let artifact = read_artifact(&tmp);
    assert!(artifact["generatedAt"].as_str().unwrap().ends_with('Z'));
    assert!(artifact["index"].is_object());

    let docs = artifact["docs"].as_array().unwrap();
    assert_eq!(docs.len(), 14);
    assert_eq!(docs[0]["id"], "zenodo-987");
    assert_eq!(docs[0]["title"], "Stable Systems Report");
    assert_eq!(docs[0]["url"], "/reports/zenodo-987/");
    assert_eq!(docs[0]["description"], "Detailed report body");
    assert_eq!(docs[0]["type"], "report");
    assert!(docs[0]["searchable"]
        .as_str()
        .unwrap()
        .contains("stable systems report"));

    for doc in docs {
        let searchable = doc["searchable"].as_str().unwrap();
        assert_eq!(searchable, searchable.to_lowercase());
    }
}

#[test]
fn test_build_index_missing_input_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_file(tmp.path().join("src/_data/zenodo.json")).unwrap();

    let (_stdout, stderr, success) = run_pubcat(&config_path, &["build-index"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read records file"));
    assert!(!artifact_path(&tmp).exists());
}

#[test]
fn test_build_index_invalid_json_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("src/_data/zenodo.json"), "[{ broken").unwrap();

    let (_stdout, stderr, success) = run_pubcat(&config_path, &["build-index"]);
    assert!(!success);
    assert!(stderr.contains("Failed to parse records file"));
    assert!(!artifact_path(&tmp).exists());
}

#[test]
fn test_build_index_is_idempotent() {
    let (tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_pubcat(&config_path, &["build-index"]);
    assert!(success, "{}", stderr);
    let first = read_artifact(&tmp);

    let (_, stderr, success) = run_pubcat(&config_path, &["build-index"]);
    assert!(success, "{}", stderr);
    let second = read_artifact(&tmp);

    assert_eq!(first["docs"], second["docs"]);
    assert_eq!(first["index"], second["index"]);
}

#[test]
fn test_build_index_explicit_paths() {
    let (tmp, config_path) = setup_test_env();
    let input = tmp.path().join("src/_data/zenodo.json");
    let output = tmp.path().join("elsewhere/index.json");

    let (_, stderr, success) = run_pubcat(
        &config_path,
        &[
            "build-index",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ],
    );
    assert!(success, "{}", stderr);
    assert!(output.exists());
    assert!(!artifact_path(&tmp).exists());
}

#[test]
fn test_search_ranks_title_matches() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pubcat(&config_path, &["build-index"]);
    assert!(success, "{}", stderr);

    let (stdout, stderr, success) = run_pubcat(&config_path, &["search", "stable systems", "--json"]);
    assert!(success, "search failed: {}", stderr);

    let body: Value = serde_json::from_str(&stdout).unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "zenodo-987");
    assert!(results[0]["score"].as_u64().unwrap() >= 26);
    assert_eq!(body["status"], "Found 1 result for \"stable systems\".");
}

#[test]
fn test_search_requires_every_term() {
    let (_tmp, config_path) = setup_test_env();
    run_pubcat(&config_path, &["build-index"]);

    let (stdout, _, success) = run_pubcat(&config_path, &["search", "stable zebra"]);
    assert!(success);
    assert!(stdout.contains("Found 0 results for \"stable zebra\"."));
}

#[test]
fn test_search_empty_query_prints_nothing() {
    let (_tmp, config_path) = setup_test_env();

    // No artifact built: an empty query must not even try to load it.
    let (stdout, stderr, success) = run_pubcat(&config_path, &["search", "   "]);
    assert!(success, "{}", stderr);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_search_unavailable_index() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_pubcat(&config_path, &["search", "report"]);
    assert!(!success);
    assert!(stdout.contains("Search is temporarily unavailable."));
}

#[test]
fn test_browse_second_page() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pubcat(&config_path, &["browse", "--state", "page=2"]);
    assert!(success, "browse failed: {}", stderr);
    assert!(stdout.contains("13 reports found"));
    assert!(stdout.contains("Page 2 of 2"));
    assert!(stdout.contains("(next)"));
    assert!(stdout.contains("<prev"));
    assert!(stdout.contains("URL: /reports/?page=2"));
    // Oldest report lands alone on the last page under the default sort.
    assert!(stdout.contains("Catalog Report 1 (2020-01-01)"));
}

#[test]
fn test_browse_actions_and_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pubcat(
        &config_path,
        &[
            "browse",
            "--state",
            "category=nonexistent&page=2",
            "--then",
            "category=policy",
            "--then",
            "sort=title-asc",
            "--json",
        ],
    );
    assert!(success, "{}", stderr);

    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["frame"]["total"], 6);
    assert_eq!(body["frame"]["page"], 1);
    assert_eq!(body["frame"]["status"], "6 reports found");
    assert_eq!(body["frame"]["prev_disabled"], true);
    assert_eq!(body["frame"]["next_disabled"], true);
    assert_eq!(body["url"], "/reports/?category=policy&sort=title-asc");
    assert_eq!(body["cards"][0]["title"], "Catalog Report 10");

    let labels: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Libraries", "Policy", "stability"]);
}

#[test]
fn test_browse_empty_category() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) =
        run_pubcat(&config_path, &["browse", "--state", "page=3", "--then", "q=zebra"]);
    assert!(success);
    assert!(stdout.contains("0 reports found"));
    assert!(stdout.contains("Page 1 of 1"));
    assert!(stdout.contains("(prev)  (next)"));
}

#[test]
fn test_browse_rejects_unknown_action() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pubcat(&config_path, &["browse", "--then", "jump"]);
    assert!(!success);
    assert!(stderr.contains("invalid action"));
}

#[test]
fn test_get_and_jsonld() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pubcat(&config_path, &["get", "zenodo-987"]);
    assert!(success, "{}", stderr);
    assert!(stdout.contains("Stable Systems Report"));
    assert!(stdout.contains("page:         /reports/zenodo-987/"));
    assert!(stdout.contains("Detailed report body"));

    let (stdout, stderr, success) = run_pubcat(&config_path, &["get", "987", "--jsonld"]);
    assert!(success, "{}", stderr);
    let ld: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(ld["@type"], "Report");
    assert_eq!(ld["@id"], "https://zenodo.org/records/987");
    assert_eq!(ld["author"][0]["sameAs"], "https://orcid.org/0000-0002-1825-0097");

    let (_, stderr, success) = run_pubcat(&config_path, &["get", "5000", "--jsonld"]);
    assert!(!success);
    assert!(stderr.contains("only produced for Zenodo reports"));

    let (_, stderr, success) = run_pubcat(&config_path, &["get", "31337"]);
    assert!(!success);
    assert!(stderr.contains("record not found"));
}

#[test]
fn test_cite_styles() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pubcat(&config_path, &["cite", "987"]);
    assert!(success, "{}", stderr);
    assert_eq!(
        stdout.trim(),
        "A. Author 2024. Stable Systems Report. Council on Library and Information Resources. https://doi.org/10.5281/zenodo.987"
    );

    let (stdout, _, success) = run_pubcat(&config_path, &["cite", "987", "--csl"]);
    assert!(success);
    let csl: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(csl["DOI"], "10.5281/zenodo.987");
    assert_eq!(csl["URL"], "https://zenodo.org/records/987");
}

#[test]
fn test_stats_summarizes_artifact() {
    let (_tmp, config_path) = setup_test_env();
    run_pubcat(&config_path, &["build-index"]);

    let (stdout, stderr, success) = run_pubcat(&config_path, &["stats"]);
    assert!(success, "{}", stderr);
    assert!(stdout.contains("Documents:   14"));
    assert!(stdout.contains("Docs digest:"));
    assert!(stdout.contains("video"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_pubcat(&tmp.path().join("missing.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

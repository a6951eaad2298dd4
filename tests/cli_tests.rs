use clap::Parser;
use locator_healing::cli::commands::{cmd_suggest, load_checks, load_document, load_records};
use locator_healing::cli::config::{
    AppConfig, Cli, Commands, load_config, log_directive, parse_config, resolve_settings,
};
use locator_healing::content::dynamic::{DynamicCategory, Severity};
use locator_healing::error::EngineError;
use locator_healing::locator::locator_model::StoredElementRecord;
use locator_healing::resolve::resolver::resolve;
use locator_healing::trace::logger::AuditLogger;
use locator_healing::trace::trace::{AuditEvent, AuditKind};

use crate::common::login_page;

mod common;

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("locator_healing_{}", name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_scan() {
    let cli = Cli::parse_from(["locator-healing", "scan", "--document", "page.json", "--max", "25"]);
    match cli.command {
        Commands::Scan { document, max } => {
            assert_eq!(document, "page.json");
            assert_eq!(max, Some(25));
        }
        _ => panic!("Expected Scan command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(!cli.json);
}

#[test]
fn cli_parse_resolve_with_globals_after_subcommand() {
    let cli = Cli::parse_from([
        "locator-healing",
        "resolve",
        "--document",
        "page.json",
        "--records",
        "records.json",
        "--element",
        "login",
        "-vv",
        "--json",
        "--audit-log",
        "audit.jsonl",
    ]);
    match &cli.command {
        Commands::Resolve {
            document,
            records,
            element,
        } => {
            assert_eq!(document, "page.json");
            assert_eq!(records, "records.json");
            assert_eq!(element.as_deref(), Some("login"));
        }
        _ => panic!("Expected Resolve command"),
    }
    assert_eq!(cli.verbose, 2);
    assert!(cli.json);
    assert_eq!(cli.audit_log.as_deref(), Some("audit.jsonl"));
}

#[test]
fn cli_parse_heal_short_output() {
    let cli = Cli::parse_from([
        "locator-healing",
        "heal",
        "--document",
        "page.json",
        "--records",
        "records.json",
        "-o",
        "healed.json",
    ]);
    match cli.command {
        Commands::Heal { output, .. } => assert_eq!(output.as_deref(), Some("healed.json")),
        _ => panic!("Expected Heal command"),
    }
}

#[test]
fn cli_parse_suggest_and_classify() {
    let cli = Cli::parse_from([
        "locator-healing",
        "--endpoint",
        "http://localhost:8080/score",
        "suggest",
        "--document",
        "page.json",
        "--intent",
        "add to cart",
    ]);
    match &cli.command {
        Commands::Suggest { intent, .. } => assert_eq!(intent, "add to cart"),
        _ => panic!("Expected Suggest command"),
    }
    assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:8080/score"));

    let cli = Cli::parse_from(["locator-healing", "classify", "Only 3 left"]);
    assert!(matches!(cli.command, Commands::Classify { text } if text == "Only 3 left"));
}

#[test]
fn cli_rejects_missing_required_args() {
    assert!(Cli::try_parse_from(["locator-healing", "verify", "--document", "page.json"]).is_err());
    assert!(Cli::try_parse_from(["locator-healing"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn missing_config_uses_defaults() {
    let config = load_config(Some("/nonexistent/locator-healing.yaml"));
    assert_eq!(config.scan.max_results, 300);
    assert_eq!(config.suggest.shard_size, 80);
    assert_eq!(config.suggest.max_in_flight, 4);
    assert!(config.backend.endpoint.is_none());
}

#[test]
fn malformed_config_falls_back_to_defaults() {
    let dir = temp_dir("bad_config");
    let path = dir.join("config.yaml");
    std::fs::write(&path, "scan: [not, a, map").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.scan.max_results, 300);

    std::fs::remove_file(&path).ok();
}

#[test]
fn parse_config_sections() {
    let yaml = r#"
scan:
  max_results: 50
suggest:
  shard_size: 40
  early_stop_threshold: 0.95
backend:
  endpoint: http://scorer.internal/score
severity:
  high: [price]
  medium: [percentage]
audit:
  path: audit.jsonl
"#;
    let config = parse_config(yaml).unwrap();

    assert_eq!(config.scan.max_results, 50);
    assert_eq!(config.suggest.shard_size, 40);
    assert_eq!(config.suggest.max_in_flight, 4);
    assert!((config.suggest.early_stop_threshold - 0.95).abs() < 1e-9);
    assert_eq!(config.backend.endpoint.as_deref(), Some("http://scorer.internal/score"));
    assert_eq!(config.severity.category_severity(DynamicCategory::Percentage), Severity::Medium);
    assert_eq!(config.severity.category_severity(DynamicCategory::Timestamp), Severity::Low);
    assert_eq!(config.audit.path.as_deref(), Some("audit.jsonl"));
}

#[test]
fn cli_flags_override_config() {
    let config = parse_config(
        "scan:\n  max_results: 50\nbackend:\n  endpoint: http://from-config\naudit:\n  path: config.jsonl\n",
    )
    .unwrap();

    let cli = Cli::parse_from([
        "locator-healing",
        "--endpoint",
        "http://from-cli",
        "scan",
        "--document",
        "page.json",
        "--max",
        "7",
    ]);
    let settings = resolve_settings(&cli, &config);
    assert_eq!(settings.max_results, 7);
    assert_eq!(settings.endpoint.as_deref(), Some("http://from-cli"));
    assert_eq!(settings.audit_log.as_deref(), Some("config.jsonl"));

    let cli = Cli::parse_from(["locator-healing", "scan", "--document", "page.json"]);
    let settings = resolve_settings(&cli, &config);
    assert_eq!(settings.max_results, 50);
    assert_eq!(settings.endpoint.as_deref(), Some("http://from-config"));

    let settings = resolve_settings(&cli, &AppConfig::default());
    assert_eq!(settings.max_results, 300);
    assert!(settings.endpoint.is_none());
}

#[test]
fn verbosity_maps_to_log_directive() {
    assert_eq!(log_directive(0), "warn");
    assert_eq!(log_directive(1), "info");
    assert_eq!(log_directive(2), "debug");
    assert_eq!(log_directive(5), "trace");
}

// ============================================================================
// Input Loading Tests
// ============================================================================

#[test]
fn load_inputs_from_files() {
    let dir = temp_dir("inputs");

    let page = dir.join("page.json");
    std::fs::write(
        &page,
        r#"{
            "title": "Login",
            "root": {
                "tag": "body",
                "children": [
                    { "tag": "button", "attributes": { "id": "login-btn" }, "text": "Login" }
                ]
            }
        }"#,
    )
    .unwrap();

    let single = dir.join("record.json");
    std::fs::write(&single, r##"{ "elementId": "login", "primaryLocators": ["#login-btn"] }"##).unwrap();

    let checks = dir.join("checks.yaml");
    std::fs::write(&checks, "name: smoke\nchecks:\n  - type: exists\n    element: login\n").unwrap();

    let doc = load_document(page.to_str().unwrap()).unwrap();
    assert_eq!(doc.title, "Login");
    assert_eq!(doc.len(), 2);

    let records = load_records(single.to_str().unwrap()).unwrap();
    assert_eq!(records.len(), 1);
    assert!(resolve(&records[0], &doc).node().is_some());

    let suite = load_checks(checks.to_str().unwrap()).unwrap();
    assert_eq!(suite.name, "smoke");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn suggest_without_endpoint_uses_local_heuristic() {
    let dir = temp_dir("suggest_local");
    let page = dir.join("page.json");
    std::fs::write(
        &page,
        r#"{
            "root": {
                "tag": "body",
                "children": [
                    { "tag": "button", "attributes": { "id": "login-btn" }, "text": "Login" },
                    { "tag": "a", "attributes": { "href": "/help" }, "text": "Help" }
                ]
            }
        }"#,
    )
    .unwrap();
    let audit = dir.join("audit.jsonl");
    std::fs::remove_file(&audit).ok();

    let cli = Cli::parse_from(["locator-healing", "suggest", "--document", "page.json", "--intent", "login"]);
    let mut settings = resolve_settings(&cli, &AppConfig::default());
    settings.audit_log = Some(audit.to_str().unwrap().to_string());
    assert!(settings.endpoint.is_none());

    let result = cmd_suggest(page.to_str().unwrap(), "login", &settings, true).await;
    assert!(result.is_ok(), "{:?}", result.err());

    let logged = std::fs::read_to_string(&audit).unwrap();
    let event: serde_json::Value = serde_json::from_str(logged.lines().next().unwrap()).unwrap();
    assert_eq!(event["outcome"], "local-heuristic");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_errors_name_the_file() {
    let err = load_document("/nonexistent/page.json").unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/page.json"));

    let dir = temp_dir("bad_records");
    let path = dir.join("records.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = load_records(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, EngineError::JsonParse { .. }));

    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Audit Log Tests
// ============================================================================

#[test]
fn audit_log_appends_json_lines() {
    let dir = temp_dir("audit");
    let path = dir.join("audit.jsonl");
    std::fs::remove_file(&path).ok();

    let doc = login_page("btn");
    let logger = AuditLogger::new(path.to_str().unwrap());
    assert!(logger.is_enabled());

    let found = resolve(&StoredElementRecord::new("login").with_locator("#login-btn"), &doc);
    let missing = resolve(&StoredElementRecord::new("gone").with_locator("#gone"), &doc);
    logger.log(&AuditEvent::resolution("login", &found));
    logger.log(&AuditEvent::resolution("gone", &missing));

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "resolve");
    assert_eq!(lines[0]["outcome"], "resolved");
    assert_eq!(lines[0]["rule"], "primary-locator");
    assert_eq!(lines[0]["locator"], "#login-btn");
    assert_eq!(lines[1]["subject"], "gone");
    assert_eq!(lines[1]["outcome"], "unresolved");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn unwritable_audit_log_is_disabled() {
    let logger = AuditLogger::new("/nonexistent/dir/audit.jsonl");
    assert!(!logger.is_enabled());
    // logging into a disabled trail is a no-op
    logger.log(&AuditEvent::now(AuditKind::Verify, "suite"));
    assert!(!AuditLogger::disabled().is_enabled());
}

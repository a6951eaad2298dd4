use std::error::Error;

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::config::Settings;
use crate::content::dynamic::classify;
use crate::dom::dom_model::Document;
use crate::error::EngineError;
use crate::locator::locator_model::StoredElementRecord;
use crate::locator::synthesizer::Synthesizer;
use crate::report::console::{format_resolution, format_suggestion_result, format_verify_report};
use crate::resolve::healing::heal;
use crate::resolve::resolver::resolve;
use crate::scan::context::ScanContext;
use crate::scan::describe::describe_page;
use crate::scan::scanner::Scanner;
use crate::suggest::backend::HttpScoringBackend;
use crate::suggest::heuristic::local_result;
use crate::suggest::orchestrator::SuggestionOrchestrator;
use crate::trace::logger::AuditLogger;
use crate::trace::trace::AuditEvent;
use crate::verify::check::{CheckSuite, run_checks};

type CmdResult<T> = Result<T, Box<dyn Error>>;

// ============================================================================
// Input loading
// ============================================================================

pub fn load_document(path: &str) -> Result<Document, EngineError> {
    let content = read(path)?;
    Document::from_json(&content).map_err(|source| EngineError::JsonParse {
        context: path.to_string(),
        source,
    })
}

/// A JSON array of records, or a single record.
pub fn load_records(path: &str) -> Result<Vec<StoredElementRecord>, EngineError> {
    let content = read(path)?;
    let parsed = serde_json::from_str::<Vec<StoredElementRecord>>(&content)
        .or_else(|_| serde_json::from_str::<StoredElementRecord>(&content).map(|r| vec![r]));
    parsed.map_err(|source| EngineError::JsonParse {
        context: path.to_string(),
        source,
    })
}

pub fn load_checks(path: &str) -> Result<CheckSuite, EngineError> {
    let content = read(path)?;
    serde_yaml::from_str(&content).map_err(|source| EngineError::YamlParse {
        context: path.to_string(),
        source,
    })
}

fn read(path: &str) -> Result<String, EngineError> {
    std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_string(),
        source,
    })
}

fn audit_logger(settings: &Settings) -> AuditLogger {
    match &settings.audit_log {
        Some(path) => AuditLogger::new(path),
        None => AuditLogger::disabled(),
    }
}

fn print_json<T: Serialize>(value: &T) -> CmdResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// scan / classify
// ============================================================================

pub fn cmd_scan(document: &str, settings: &Settings, json: bool) -> CmdResult<()> {
    let doc = load_document(document)?;
    let scanner = Scanner::new(Synthesizer::new(settings.severity.clone()), settings.max_results);
    let groups = scanner.scan(&doc, &mut ScanContext::new());

    if json {
        return print_json(&groups);
    }

    println!("Scanned {} ({} candidates)", doc.title, groups.len());
    for group in &groups {
        println!(
            "  [{:>3}] <{}> {}",
            group.score,
            group.descriptor.tag,
            group.accessible_name.as_deref().unwrap_or("")
        );
        if group.candidates.is_empty() {
            println!("        (not locatable)");
        }
        for candidate in &group.candidates {
            println!(
                "        {:<6} {:<16} {}",
                format!("{:?}", candidate.stability).to_lowercase(),
                candidate.kind.name(),
                candidate.value
            );
        }
    }
    Ok(())
}

pub fn cmd_classify(text: &str, settings: &Settings, json: bool) -> CmdResult<()> {
    let matches = classify(text);
    let severity = settings.severity.severity(&matches);

    if json {
        return print_json(&serde_json::json!({ "matches": matches, "severity": severity }));
    }

    println!("severity: {:?}", severity);
    for m in &matches {
        println!("  {:?} [{}..{}] \"{}\"", m.category, m.start, m.end, m.matched);
    }
    Ok(())
}

// ============================================================================
// resolve / heal
// ============================================================================

/// Resolve records; returns whether every one resolved.
pub fn cmd_resolve(
    document: &str,
    records_path: &str,
    element: Option<&str>,
    settings: &Settings,
    json: bool,
) -> CmdResult<bool> {
    let doc = load_document(document)?;
    let mut records = load_records(records_path)?;
    if let Some(id) = element {
        records.retain(|r| r.element_id == id);
        if records.is_empty() {
            return Err(EngineError::UnknownElement(id.to_string()).into());
        }
    }
    let audit = audit_logger(settings);

    let mut all_resolved = true;
    let mut outputs = Vec::new();
    for record in &records {
        let resolution = resolve(record, &doc);
        audit.log(&AuditEvent::resolution(&record.element_id, &resolution));
        all_resolved &= resolution.node().is_some();

        if json {
            outputs.push(serde_json::json!({ "elementId": record.element_id, "resolution": resolution }));
        } else {
            print!("{}", format_resolution(&record.element_id, &resolution));
        }
    }

    if json {
        print_json(&outputs)?;
    }
    Ok(all_resolved)
}

pub fn cmd_heal(
    document: &str,
    records_path: &str,
    output: Option<&str>,
    settings: &Settings,
    json: bool,
) -> CmdResult<()> {
    let doc = load_document(document)?;
    let records = load_records(records_path)?;
    let synthesizer = Synthesizer::new(settings.severity.clone());
    let audit = audit_logger(settings);
    let mut ctx = ScanContext::new();

    let mut updated = Vec::with_capacity(records.len());
    let mut reports = Vec::new();
    for record in &records {
        let report = heal(record, &doc, &synthesizer, &mut ctx);
        audit.log(&AuditEvent::heal(&record.element_id, &report));

        if !json {
            print!("{}", format_resolution(&record.element_id, &report.resolution));
            if let Some(proposal) = &report.proposal {
                println!("    proposed version {}:", proposal.version);
                for locator in &proposal.primary_locators {
                    println!("      {}", locator.value);
                }
            }
        }

        updated.push(report.proposal.clone().unwrap_or_else(|| record.clone()));
        reports.push(report);
    }

    if json {
        print_json(&reports)?;
    }

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&updated)?;
        std::fs::write(path, content).map_err(|source| EngineError::Io {
            path: path.to_string(),
            source,
        })?;
        info!(path, records = updated.len(), "wrote healed records");
    }
    Ok(())
}

// ============================================================================
// suggest
// ============================================================================

pub async fn cmd_suggest(document: &str, intent: &str, settings: &Settings, json: bool) -> CmdResult<()> {
    let doc = load_document(document)?;
    let synthesizer = Synthesizer::new(settings.severity.clone());
    let descriptors = describe_page(&doc, &mut ScanContext::new());

    let result = match settings.endpoint.as_deref() {
        Some(endpoint) => {
            let backend = HttpScoringBackend::new(endpoint, settings.suggest.shard_timeout())?;
            SuggestionOrchestrator::new(backend, settings.suggest.clone())
                .with_synthesizer(synthesizer)
                .suggest_or_local(intent, &descriptors)
                .await
        }
        None => {
            warn!(intent, "no scoring endpoint configured, using local heuristic suggestions");
            local_result(intent, &descriptors, &synthesizer, settings.suggest.top_k)
        }
    };
    audit_logger(settings).log(&AuditEvent::suggestion_fallback(intent, &result));

    if json {
        return print_json(&result);
    }
    print!("{}", format_suggestion_result(&result));
    Ok(())
}

// ============================================================================
// verify
// ============================================================================

/// Run a check suite and return whether all checks passed.
pub fn cmd_verify(
    document: &str,
    records_path: &str,
    checks_path: &str,
    settings: &Settings,
    verbose: u8,
    json: bool,
) -> CmdResult<bool> {
    let doc = load_document(document)?;
    let records = load_records(records_path)?;
    let suite = load_checks(checks_path)?;

    if verbose > 0 {
        eprintln!("Running {} checks from {}...", suite.checks.len(), suite.name);
    }

    let start = std::time::Instant::now();
    let report = run_checks(&suite, &records, &doc).with_duration(start.elapsed().as_millis());
    let all_passed = report.all_passed();
    audit_logger(settings).log(&AuditEvent::verify(&report));

    if json {
        print_json(&report)?;
    } else {
        print!("{}", format_verify_report(&report));
    }
    Ok(all_passed)
}

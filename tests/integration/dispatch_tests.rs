//! Dispatch integration tests.
//!
//! Ordering, failure isolation, conditions, findings accumulation and
//! cancellation across full runs.

use super::{resources, run_config};
use crate::mocks::MockConnector;
use healthcheck_report::engine::dispatcher::ActionOutcome;
use healthcheck_report::{
    CancelFlag, CheckError, CheckOutput, ConfigLoader, FindingStatus, ModuleRegistry, ReportRunner, Settings,
    StructuredFinding,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const FULL_CONFIG: &str = r#"[
  {"title": "Overview", "actions": [{"type": "header", "file": "header.adoc"}]},
  {"title": "Checkpoints", "actions": [
    {"type": "module", "module": "postgres_checkpoints", "function": "get_checkpoint_stats"}
  ]},
  {"title": "Locks", "actions": [
    {"type": "comments", "file": "comments/locks.adoc", "display_title": "Why locks matter"},
    {"type": "module", "module": "postgres_locks", "function": "get_blocking_queries"},
    {"type": "module", "module": "postgres_statements", "function": "get_top_queries"}
  ]},
  {"title": "Summary", "actions": [
    {"type": "module", "module": "report", "function": "get_findings_summary"}
  ]}
]"#;

fn healthy_connector() -> MockConnector {
    MockConnector::new(16, 2)
        .with_response(
            "pg_stat_bgwriter",
            &["checkpoints_timed", "checkpoints_req", "total_checkpoints"],
            vec![vec![json!(40), json!(2), json!(42)]],
        )
        .with_response("pg_stat_statements", &["calls", "query"], vec![vec![json!(7), json!("SELECT 1")]])
}

fn labels(outcome: &healthcheck_report::RunOutcome) -> Vec<String> {
    outcome.document.fragments().map(|f| f.action.clone()).collect()
}

#[test]
fn test_fragments_follow_configured_order() {
    let mut connector = healthy_connector();
    let settings = Settings::from_pairs([("has_pgstat", json!(true))]);
    let outcome = run_config(FULL_CONFIG, &mut connector, &settings);

    assert_eq!(
        labels(&outcome),
        vec![
            "header:header.adoc",
            "postgres_checkpoints.get_checkpoint_stats",
            "comments:comments/locks.adoc",
            "postgres_locks.get_blocking_queries",
            "postgres_statements.get_top_queries",
            "report.get_findings_summary",
        ]
    );

    let rendered = outcome.render();
    let positions: Vec<usize> = [
        "database health",
        "checkpoints_timed",
        "=== Why locks matter",
        "No blocking sessions detected",
        "SELECT 1",
    ]
    .iter()
    .map(|needle| rendered.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
    .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", positions);
}

#[test]
fn test_failing_check_is_isolated() {
    let mut connector = healthy_connector().with_failure("pg_locks", "relation \"pg_locks\" is locked");
    let settings = Settings::from_pairs([("has_pgstat", json!(true))]);
    let outcome = run_config(FULL_CONFIG, &mut connector, &settings);

    let locks = outcome
        .document
        .fragments()
        .find(|f| f.action == "postgres_locks.get_blocking_queries")
        .unwrap();
    assert!(locks.text.contains("[ERROR]"));
    assert!(matches!(locks.outcome, ActionOutcome::Failed { .. }));

    // Neighbors still ran
    let summary = outcome.document.summary();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.static_text, 2);

    let error = outcome.findings.get("postgres_locks").unwrap();
    assert_eq!(error.status, FindingStatus::Error);
    assert!(error.details.as_deref().unwrap().contains("is locked"));
    assert!(outcome.findings.get("top_queries").is_some());

    // The summary check saw the failure recorded earlier in the run
    let digest = outcome.findings.get("findings_summary").unwrap();
    assert_eq!(digest.data.as_ref().unwrap()["errors"], json!(["postgres_locks"]));
}

#[test]
fn test_unknown_module_is_isolated() {
    let config = r#"[{"title": "Broken", "actions": [
        {"type": "module", "module": "missing_module", "function": "nothing"},
        {"type": "module", "module": "postgres_locks", "function": "get_blocking_queries"}
    ]}]"#;
    let mut connector = MockConnector::new(15, 0);
    let outcome = run_config(config, &mut connector, &Settings::default());

    let fragments: Vec<_> = outcome.document.fragments().collect();
    assert!(fragments[0].text.contains("[ERROR]"));
    assert!(fragments[0].text.contains("No check registered for missing_module.nothing"));
    assert!(matches!(fragments[1].outcome, ActionOutcome::Completed { .. }));
    assert!(outcome.findings.get("missing_module").unwrap().is_error());
}

#[test]
fn test_missing_resource_is_isolated_without_finding() {
    let config = r#"[{"title": "Docs", "actions": [
        {"type": "comments", "file": "comments/absent.adoc"},
        {"type": "header", "file": "header.adoc"}
    ]}]"#;
    let mut connector = MockConnector::new(15, 0);
    let outcome = run_config(config, &mut connector, &Settings::default());

    let fragments: Vec<_> = outcome.document.fragments().collect();
    assert!(fragments[0].text.starts_with("[ERROR]"));
    assert_eq!(fragments[1].outcome, ActionOutcome::Static);
    assert!(outcome.findings.is_empty());
}

#[test]
fn test_condition_skips_without_side_effects() {
    let config = r#"[{"title": "Aurora", "actions": [
        {"type": "module", "module": "aurora", "function": "get_aurora_notes",
         "condition": {"var": "is_aurora", "value": true}}
    ]}]"#;
    let mut connector = MockConnector::new(15, 0).aurora();
    let settings = Settings::from_pairs([("is_aurora", json!(false))]);
    let outcome = run_config(config, &mut connector, &settings);

    let fragment = outcome.document.fragments().next().unwrap();
    assert!(fragment.text.is_empty());
    assert!(matches!(fragment.outcome, ActionOutcome::Skipped { .. }));
    assert!(outcome.findings.is_empty());
    assert!(connector.executed.is_empty());
}

#[test]
fn test_fallback_pairing() {
    let config = r#"[{"title": "Statements", "actions": [
        {"type": "module", "module": "postgres_statements", "function": "get_top_queries",
         "condition": {"var": "has_pgstat", "value": true}},
        {"type": "module", "module": "report", "function": "get_findings_summary",
         "condition": {"var": "has_pgstat", "value": true, "fallback": true}}
    ]}]"#;
    let mut connector = MockConnector::new(15, 0);
    let settings = Settings::from_pairs([("has_pgstat", json!(false))]);
    let outcome = run_config(config, &mut connector, &settings);

    let fragments: Vec<_> = outcome.document.fragments().collect();
    assert!(matches!(fragments[0].outcome, ActionOutcome::Skipped { .. }));
    assert!(matches!(fragments[1].outcome, ActionOutcome::Completed { .. }));
}

#[test]
fn test_fallback_runs_even_when_condition_matches() {
    let config = r#"[{"title": "Statements", "actions": [
        {"type": "module", "module": "postgres_statements", "function": "get_top_queries",
         "condition": {"var": "has_pgstat", "value": true}},
        {"type": "module", "module": "report", "function": "get_findings_summary",
         "condition": {"var": "has_pgstat", "value": true, "fallback": true}}
    ]}]"#;
    let mut connector = MockConnector::new(15, 0);
    let settings = Settings::from_pairs([("has_pgstat", json!(true))]);
    let outcome = run_config(config, &mut connector, &settings);

    let fragments: Vec<_> = outcome.document.fragments().collect();
    assert!(matches!(fragments[0].outcome, ActionOutcome::Completed { .. }));
    assert!(matches!(fragments[1].outcome, ActionOutcome::Completed { .. }));
    assert!(outcome.findings.contains_key("top_queries"));
    assert!(outcome.findings.contains_key("findings_summary"));
}

#[test]
fn test_missing_extension_renders_note() {
    let config = r#"[{"title": "Statements", "actions": [
        {"type": "module", "module": "postgres_statements", "function": "get_top_queries"}
    ]}]"#;
    let mut connector = MockConnector::new(15, 0);
    let outcome = run_config(config, &mut connector, &Settings::default());

    assert!(outcome.render().contains("[NOTE]"));
    assert_eq!(connector.queries_matching("pg_stat_statements"), 0);
    assert_eq!(outcome.findings.get("top_queries").unwrap().status, FindingStatus::Success);
}

#[test]
fn test_panicking_check_is_isolated() {
    let mut registry = ModuleRegistry::new();
    registry.register_connector_check("fragile", "explode", "always panics", |_connector, _settings| {
        panic!("index out of range")
    });
    registry.register_connector_check("steady", "ok", "always succeeds", |_connector, _settings| {
        Ok(CheckOutput::new("fine"))
    });

    let configuration = ConfigLoader::parse(
        r#"[{"title": "T", "actions": [
            {"type": "module", "module": "fragile", "function": "explode"},
            {"type": "module", "module": "steady", "function": "ok"}
        ]}]"#,
    )
    .unwrap();
    let resources = resources();
    let mut connector = MockConnector::new(15, 0);
    let outcome = ReportRunner::new(&registry, &resources).run(&configuration, &mut connector, &Settings::default());

    let fragments: Vec<_> = outcome.document.fragments().collect();
    assert!(fragments[0].text.contains("[ERROR]"));
    assert!(fragments[0].text.contains("index out of range"));
    assert_eq!(fragments[1].text, "fine");
    assert!(outcome.findings.get("fragile").unwrap().is_error());
}

#[test]
fn test_reported_findings_are_kept() {
    let mut registry = ModuleRegistry::new();
    registry.register_connector_check("partial", "run", "fails after reporting", |_connector, _settings| {
        let mut findings = healthcheck_report::Findings::new();
        findings.insert("partial".to_string(), StructuredFinding::error("timed out after 3 of 5 nodes"));
        findings.insert("partial_nodes".to_string(), StructuredFinding::success(json!(3)));
        Err(CheckError::Reported {
            message: "collection incomplete".to_string(),
            findings,
        })
    });

    let configuration = ConfigLoader::parse(
        r#"[{"title": "T", "actions": [{"type": "module", "module": "partial", "function": "run"}]}]"#,
    )
    .unwrap();
    let resources = resources();
    let mut connector = MockConnector::new(15, 0);
    let outcome = ReportRunner::new(&registry, &resources).run(&configuration, &mut connector, &Settings::default());

    let own = outcome.findings.get("partial").unwrap();
    assert_eq!(own.details.as_deref(), Some("timed out after 3 of 5 nodes"));
    assert!(outcome.findings.contains_key("partial_nodes"));
}

#[test]
fn test_repeated_module_last_write_wins() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut registry = ModuleRegistry::new();
    registry.register_connector_check("counter", "tick", "counts calls", move |_connector, _settings| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckOutput::new(format!("tick {}", n)).with_finding("ticks", StructuredFinding::success(json!(n))))
    });

    let configuration = ConfigLoader::parse(
        r#"[
          {"title": "First", "actions": [{"type": "module", "module": "counter", "function": "tick"}]},
          {"title": "Second", "actions": [{"type": "module", "module": "counter", "function": "tick"}]}
        ]"#,
    )
    .unwrap();
    let resources = resources();
    let mut connector = MockConnector::new(15, 0);
    let outcome = ReportRunner::new(&registry, &resources).run(&configuration, &mut connector, &Settings::default());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.findings.get("ticks").unwrap().data, Some(json!(2)));
    assert_eq!(outcome.findings.len(), 1);
    assert_eq!(outcome.findings.write_count(), 2);
}

#[test]
fn test_cancel_between_sections() {
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();

    let mut registry = ModuleRegistry::new();
    registry.register_connector_check("control", "stop", "requests cancellation", move |_connector, _settings| {
        trigger.cancel();
        Ok(CheckOutput::new("stopping after this section"))
    });
    registry.register_connector_check("control", "after", "never reached", |_connector, _settings| {
        Ok(CheckOutput::new("too late"))
    });

    let configuration = ConfigLoader::parse(
        r#"[
          {"title": "One", "actions": [
            {"type": "module", "module": "control", "function": "stop"},
            {"type": "module", "module": "control", "function": "after"}
          ]},
          {"title": "Two", "actions": [{"type": "module", "module": "control", "function": "after"}]}
        ]"#,
    )
    .unwrap();
    let resources = resources();
    let mut connector = MockConnector::new(15, 0);
    let outcome = ReportRunner::new(&registry, &resources)
        .with_cancel_flag(cancel)
        .run(&configuration, &mut connector, &Settings::default());

    // The section in flight finishes; the next never starts
    assert!(outcome.document.cancelled);
    assert_eq!(outcome.document.sections.len(), 1);
    assert_eq!(outcome.document.sections[0].fragments.len(), 2);
    assert!(outcome.render().contains("[NOTE]"));
}

#[test]
fn test_runs_are_deterministic() {
    let settings = Settings::from_pairs([("has_pgstat", json!(true)), ("show_qry", json!(true))]);

    let mut first = healthy_connector().with_failure("pg_locks", "boom");
    let mut second = healthy_connector().with_failure("pg_locks", "boom");
    let a = run_config(FULL_CONFIG, &mut first, &settings);
    let b = run_config(FULL_CONFIG, &mut second, &settings);

    assert_eq!(a.render(), b.render());
    assert_eq!(a.findings.to_json_string(true), b.findings.to_json_string(true));
    assert_eq!(first.executed, second.executed);
}

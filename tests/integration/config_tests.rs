//! Configuration and end-to-end entry point tests.

use crate::mocks::MockConnector;
use healthcheck_report::{
    run_report, Action, CancelFlag, ConfigError, ConfigLoader, ReportError, RunOptions, Settings,
};
use serde_json::json;
use std::fs;

#[test]
fn test_run_report_from_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("report.json"),
        r#"[
          {"title": "Intro", "actions": [{"type": "header", "file": "header.adoc"}]},
          {"title": "Locks", "actions": [
            {"type": "module", "module": "postgres_locks", "function": "get_blocking_queries"}
          ]}
        ]"#,
    )
    .unwrap();
    fs::write(dir.path().join("header.adoc"), "Nightly health check.\n").unwrap();
    fs::write(dir.path().join("settings.toml"), "show_qry = true\nrow_limit = 5\n").unwrap();

    let settings = Settings::load(dir.path().join("settings.toml")).unwrap();
    let mut connector = MockConnector::new(9, 6);
    let options = RunOptions {
        title: Some("Nightly".to_string()),
        ..RunOptions::default()
    };
    let outcome = run_report(dir.path().join("report.json"), &mut connector, &settings, options).unwrap();

    let rendered = outcome.render();
    assert!(rendered.starts_with("= Nightly\n"));
    assert!(rendered.contains("Nightly health check."));
    // show_qry echoes the legacy query text
    assert!(rendered.contains("[,sql]"));
    assert_eq!(
        outcome.findings.get("blocking_queries").unwrap().data.as_ref().unwrap()["variant"],
        json!("legacy_blocking")
    );
}

#[test]
fn test_resource_dir_override() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("header.adoc"), "From docs.\n").unwrap();
    fs::write(
        dir.path().join("report.json"),
        r#"[{"title": "Intro", "actions": [{"type": "header", "file": "header.adoc"}]}]"#,
    )
    .unwrap();

    let mut connector = MockConnector::new(15, 0);
    let options = RunOptions {
        resource_dir: Some(docs),
        ..RunOptions::default()
    };
    let outcome = run_report(dir.path().join("report.json"), &mut connector, &Settings::default(), options).unwrap();
    assert!(outcome.render().contains("From docs."));
}

#[test]
fn test_cancelled_before_start() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("report.json"),
        r#"[{"title": "Locks", "actions": [
            {"type": "module", "module": "postgres_locks", "function": "get_blocking_queries"}
        ]}]"#,
    )
    .unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut connector = MockConnector::new(15, 0);
    let options = RunOptions {
        cancel: Some(cancel),
        ..RunOptions::default()
    };
    let outcome = run_report(dir.path().join("report.json"), &mut connector, &Settings::default(), options).unwrap();

    assert!(outcome.document.cancelled);
    assert!(outcome.document.sections.is_empty());
    assert!(connector.executed.is_empty());
}

#[test]
fn test_malformed_configuration_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    fs::write(&path, r#"[{"title": "No actions"}]"#).unwrap();

    let mut connector = MockConnector::new(15, 0);
    let err = run_report(&path, &mut connector, &Settings::default(), RunOptions::default()).unwrap_err();

    // Configuration is the only fatal error class
    match err {
        ReportError::Config(e) => assert!(matches!(e, ConfigError::MissingActions { section: 0, .. })),
    }
    assert!(connector.executed.is_empty());
}

#[test]
fn test_missing_configuration_file() {
    let mut connector = MockConnector::new(15, 0);
    let err = run_report(
        "/nonexistent/report.json",
        &mut connector,
        &Settings::default(),
        RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::Config(ConfigError::Io { .. })));
}

#[test]
fn test_configuration_errors() {
    let unknown = ConfigLoader::parse(r#"[{"title": "T", "actions": [{"type": "plot"}]}]"#);
    assert!(matches!(unknown, Err(ConfigError::UnknownActionType { .. })));

    let no_function = ConfigLoader::parse(r#"[{"title": "T", "actions": [{"type": "module", "module": "m"}]}]"#);
    assert!(matches!(
        no_function,
        Err(ConfigError::MissingField { field: "function", .. })
    ));

    let no_file = ConfigLoader::parse(r#"[{"title": "T", "actions": [{"type": "comments"}]}]"#);
    assert!(matches!(no_file, Err(ConfigError::MissingField { field: "file", .. })));

    let bad_condition = ConfigLoader::parse(
        r#"[{"title": "T", "actions": [
            {"type": "module", "module": "m", "function": "f", "condition": {"value": true}}
        ]}]"#,
    );
    assert!(matches!(
        bad_condition,
        Err(ConfigError::InvalidCondition { field: "var", .. })
    ));

    assert!(matches!(ConfigLoader::parse("{not json"), Err(ConfigError::Parse(_))));
}

#[test]
fn test_configuration_shape() {
    let configuration = ConfigLoader::parse(
        r#"[
          {"actions": []},
          {"title": "Checks", "actions": [
            {"type": "module", "module": "aurora", "function": "get_aurora_notes",
             "condition": {"var": "is_aurora", "value": true, "fallback": false}},
            {"type": "comments", "file": "a.adoc", "display_title": "About"}
          ]}
        ]"#,
    )
    .unwrap();

    assert_eq!(configuration.sections.len(), 2);
    assert_eq!(configuration.sections[0].title, "");
    assert_eq!(configuration.action_count(), 2);
    match &configuration.sections[1].actions[0] {
        Action::Module { condition: Some(c), .. } => {
            assert_eq!(c.variable, "is_aurora");
            assert_eq!(c.expected_value, json!(true));
            assert!(!c.fallback);
        }
        other => panic!("unexpected action {:?}", other),
    }
}

#[test]
fn test_settings_formats() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("settings.json");
    fs::write(&json_path, r#"{"has_pgstat": true, "row_limit": "25", "primary_node": "db-1"}"#).unwrap();

    let settings = Settings::load(&json_path).unwrap();
    assert!(settings.has_pgstat());
    assert_eq!(settings.row_limit(), 25);
    assert_eq!(settings.primary_node(), "db-1");

    let yaml_path = dir.path().join("settings.yaml");
    fs::write(&yaml_path, "show_qry: true").unwrap();
    assert!(Settings::load(&yaml_path).is_err());
}

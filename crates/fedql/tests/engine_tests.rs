use fedql::source::{only_columns, row};
use fedql::{
    EngineConfig, Error, MemorySource, Predicate, Query, QueryEngine, ResultSet, Result, Source,
    SourceRequest,
};
use std::sync::{Arc, Mutex};
use std::thread;

/// Adapter that records what it was asked for and ignores filters.
#[derive(Clone, Default)]
struct FakeSource {
    passed_filters: Arc<Mutex<Vec<Predicate>>>,
    passed_columns: Arc<Mutex<Vec<String>>>,
}

impl Source for FakeSource {
    fn schema_for_table(&self, _table: &str) -> Vec<String> {
        vec![
            "startedby".to_string(),
            "started".to_string(),
            "ended".to_string(),
        ]
    }

    fn get(&self, request: &SourceRequest<'_>) -> Result<ResultSet> {
        *self.passed_filters.lock().unwrap() = request.filters.to_vec();
        *self.passed_columns.lock().unwrap() = request.columns.to_vec();

        let mut rows = vec![
            row([("startedby", "bob"), ("started", "monday"), ("ended", "wednesday")]),
            row([("startedby", "alice"), ("started", "thursday"), ("ended", "friday")]),
        ];
        only_columns(&mut rows, request.columns);
        Ok(rows)
    }
}

/// Adapter whose backend is unreachable.
struct FailingSource;

impl Source for FailingSource {
    fn schema_for_table(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }

    fn get(&self, _request: &SourceRequest<'_>) -> Result<ResultSet> {
        Err(Error::Source("connection refused".to_string()))
    }
}

fn create_engine() -> (QueryEngine, FakeSource) {
    let engine = QueryEngine::new();
    let source = FakeSource::default();
    engine
        .register_source("azureDevOps", source.clone())
        .unwrap();
    (engine, source)
}

#[test]
fn test_select_all_returns_everything() {
    let (engine, _) = create_engine();

    let result = engine
        .execute(&Query::new("azureDevOps", "builds"))
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.results[0]["startedby"], "bob");
    assert_eq!(result.results[1]["startedby"], "alice");
}

#[test]
fn test_select_all_reports_schema_columns() {
    let (engine, _) = create_engine();

    let result = engine
        .execute(&Query::new("azureDevOps", "builds"))
        .unwrap();

    assert_eq!(result.columns, vec!["startedby", "started", "ended"]);
    assert_eq!(result.results[0].len(), 3);
}

#[test]
fn test_select_specific_columns() {
    let (engine, source) = create_engine();

    let result = engine
        .execute(&Query::new("azureDevOps", "builds").with_columns(["started", "ended"]))
        .unwrap();

    assert_eq!(*source.passed_columns.lock().unwrap(), vec!["started", "ended"]);
    for row in &result.results {
        assert_eq!(row.len(), 2);
        assert!(!row["started"].is_empty());
        assert!(!row["ended"].is_empty());
        assert!(!row.contains_key("startedby"));
    }
}

#[test]
fn test_selected_columns_keep_requested_order() {
    let (engine, _) = create_engine();

    let result = engine
        .execute(&Query::new("azureDevOps", "builds").with_columns(["ended", "started"]))
        .unwrap();

    assert_eq!(result.columns, vec!["ended", "started"]);
}

#[test]
fn test_projection_is_reapplied_by_engine() {
    let engine = QueryEngine::new();
    engine
        .register_source(
            "raw",
            MemorySource::new().with_table(
                "t",
                ["a", "b", "c"],
                vec![row([("a", "1"), ("b", "2"), ("c", "3")])],
            ),
        )
        .unwrap();

    let result = engine
        .execute(&Query::new("raw", "t").with_columns(["b"]))
        .unwrap();

    assert_eq!(result.columns, vec!["b"]);
    assert_eq!(result.results, vec![row([("b", "2")])]);
}

#[test]
fn test_limit_keeps_first_rows() {
    let (engine, _) = create_engine();

    let result = engine
        .execute(&Query::new("azureDevOps", "builds").with_limit(1))
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.results[0]["startedby"], "bob");
}

#[test]
fn test_limit_larger_than_results() {
    let (engine, _) = create_engine();

    let result = engine
        .execute(&Query::new("azureDevOps", "builds").with_limit(50))
        .unwrap();

    assert_eq!(result.len(), 2);
}

#[test]
fn test_passes_filters_to_source() {
    let (engine, source) = create_engine();

    engine
        .execute(
            &Query::new("azureDevOps", "builds")
                .with_columns(["startedby"])
                .with_filter(Predicate::eq("startedby", "bob")),
        )
        .unwrap();

    assert_eq!(
        *source.passed_filters.lock().unwrap(),
        vec![Predicate::eq("startedby", "bob")]
    );
}

#[test]
fn test_residual_filters_applied_when_source_ignores_them() {
    let (engine, source) = create_engine();

    let result = engine
        .execute(
            &Query::new("azureDevOps", "builds")
                .with_columns(["started"])
                .with_filter(Predicate::eq("startedby", "ALICE")),
        )
        .unwrap();

    // filter field is fetched for the residual pass, then pruned away
    assert_eq!(
        *source.passed_columns.lock().unwrap(),
        vec!["started", "startedby"]
    );
    assert_eq!(result.results, vec![row([("started", "thursday")])]);
}

#[test]
fn test_residual_filtering_can_be_disabled() {
    let engine = QueryEngine::with_config(EngineConfig::new().without_residual_filtering());
    let source = FakeSource::default();
    engine.register_source("azureDevOps", source.clone()).unwrap();

    let result = engine
        .execute(
            &Query::new("azureDevOps", "builds")
                .with_columns(["started"])
                .with_filter(Predicate::eq("startedby", "alice")),
        )
        .unwrap();

    assert_eq!(*source.passed_columns.lock().unwrap(), vec!["started"]);
    assert_eq!(result.len(), 2);
}

#[test]
fn test_builder_query_matches_table_in_any_case() {
    let engine = QueryEngine::new();
    engine
        .register_source(
            "s",
            MemorySource::new().with_table("T", ["a"], vec![row([("a", "1")])]),
        )
        .unwrap();

    let result = engine.execute(&Query::new("S", "T")).unwrap();

    assert_eq!(result.columns, vec!["a"]);
    assert_eq!(result.results, vec![row([("a", "1")])]);
}

#[test]
fn test_deeply_nested_statement_is_a_parse_error() {
    let engine = QueryEngine::new();
    let sql = format!(
        "SELECT * FROM s.t WHERE {}a = '1'{}",
        "(".repeat(2000),
        ")".repeat(2000)
    );

    assert!(matches!(
        engine.query(&sql),
        Err(Error::Parse(fedql::ParseError::NestingTooDeep(_)))
    ));
}

#[test]
fn test_unknown_source_is_an_error() {
    let (engine, _) = create_engine();

    let err = engine.execute(&Query::new("jira", "issues")).unwrap_err();

    assert!(matches!(err, Error::UnknownSource(ref name) if name == "jira"));
}

#[test]
fn test_source_errors_propagate_unchanged() {
    let engine = QueryEngine::new();
    engine.register_source("broken", FailingSource).unwrap();

    let err = engine.execute(&Query::new("broken", "anything")).unwrap_err();

    assert!(matches!(err, Error::Source(ref msg) if msg == "connection refused"));
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let (engine, _) = create_engine();

    let err = engine
        .register_source("AZUREDEVOPS", FakeSource::default())
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateSource(_)));

    assert!(engine
        .replace_source("azuredevops", FakeSource::default())
        .unwrap());
    assert_eq!(engine.sources().unwrap(), vec!["azuredevops"]);
}

#[test]
fn test_deregister_source() {
    let (engine, _) = create_engine();

    assert!(engine.deregister_source("azureDevOps").unwrap());
    assert!(!engine.deregister_source("azureDevOps").unwrap());
    assert!(engine.sources().unwrap().is_empty());
}

#[test]
fn test_query_from_statement() {
    let (engine, _) = create_engine();

    let result = engine
        .query("SELECT ended FROM azuredevops.builds WHERE started LIKE 'mon%'")
        .unwrap();

    assert_eq!(result.columns, vec!["ended"]);
    assert_eq!(result.results, vec![row([("ended", "wednesday")])]);
}

#[test]
fn test_query_rejects_bad_input() {
    let engine = QueryEngine::with_config(EngineConfig::new().with_max_statement_length(32));

    assert!(matches!(engine.query("  "), Err(Error::InvalidInput(_))));
    assert!(matches!(
        engine.query("SELECT started, ended, startedby FROM azuredevops.builds"),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        engine.query("SELECT * FROM s.t WHERE a > '1'"),
        Err(Error::Parse(_))
    ));
}

#[test]
fn test_required_filter_surfaces_as_source_error() {
    let engine = QueryEngine::new();
    engine
        .register_source(
            "devops",
            MemorySource::new()
                .with_table(
                    "pipelines",
                    ["id", "project", "folder", "name"],
                    vec![
                        row([("id", "1"), ("project", "web"), ("folder", "\\"), ("name", "ci")]),
                        row([("id", "2"), ("project", "api"), ("folder", "\\"), ("name", "ci")]),
                        row([("id", "3"), ("project", "api"), ("folder", "\\ops"), ("name", "cd")]),
                    ],
                )
                .require_equality("pipelines", "project"),
        )
        .unwrap();

    assert!(matches!(
        engine.query("SELECT * FROM devops.pipelines"),
        Err(Error::Source(_))
    ));

    let result = engine
        .query("SELECT id FROM devops.pipelines WHERE project = 'api' AND name != 'ci'")
        .unwrap();
    assert_eq!(result.results, vec![row([("id", "3")])]);
}

#[test]
fn test_concurrent_queries_and_registration() {
    let (engine, _) = create_engine();
    let query = Arc::new(
        Query::new("azureDevOps", "builds").with_filter(Predicate::or(vec![
            Predicate::eq("startedby", "bob"),
            Predicate::like("ended", "fri%"),
        ])),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            let query = Arc::clone(&query);
            thread::spawn(move || {
                if i % 2 == 0 {
                    engine
                        .register_source(&format!("extra{}", i), MemorySource::new())
                        .unwrap();
                }
                engine.execute(&query).unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(engine.sources().unwrap().len(), 5);
}

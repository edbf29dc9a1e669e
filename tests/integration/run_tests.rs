//! Integration tests for run, page, show, list and evict

use crate::common::{sample_data, CliTestRunner};
use tabrecon::{EvictionPolicy, PrePost, ReconError, RowStatus};

#[test]
fn test_run_persists_result() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();
    let target = fixture.create_csv("file.csv", &sample_data::file_side()).unwrap();

    let handle = runner.run_keyed(&source, &target);
    let result = fixture.workspace.load_result(&handle).unwrap();
    let summary = &result.summary;

    assert_eq!(summary.total_sql_rows, 3);
    assert_eq!(summary.total_file_rows, 3);
    assert_eq!(summary.mismatches, 1);
    assert_eq!(summary.only_on_sql, 1);
    assert_eq!(summary.only_on_file, 1);
    assert_eq!(summary.matched_rows, 1);
    assert_eq!(summary.key_columns, vec!["id".to_string()]);
    assert_eq!(result.columns, vec!["id", "name", "price"]);

    let layout: Vec<(RowStatus, PrePost)> = result.rows.iter().map(|r| (r.status, r.pre_post)).collect();
    assert_eq!(
        layout,
        vec![
            (RowStatus::Mismatch, PrePost::Pre),
            (RowStatus::Mismatch, PrePost::Post),
            (RowStatus::OnlyInSql, PrePost::Absent),
            (RowStatus::OnlyInFile, PrePost::Absent),
        ]
    );
    assert_eq!(result.rows[0].mismatch_columns, vec!["price".to_string()]);
    assert_eq!(result.rows[0].values["price"], "0.75");
    assert_eq!(result.rows[1].values["price"], "0.8");
    assert_eq!(result.rows[2].values["name"], "Cherry");
    assert_eq!(result.rows[3].values["name"], "Date");
}

#[test]
fn test_run_with_explicit_mapping_renamed_columns() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture
        .create_file("sql.csv", "order_id,total,note\n1,10.00,a\n2,20.00,b\n")
        .unwrap();
    let target = fixture
        .create_file("file.csv", "OrderID,Amount,Comment\n1,10,x\n2,25,y\n")
        .unwrap();

    runner.expect_success(&[
        "run",
        "--source",
        &source.to_string_lossy(),
        "--target",
        &target.to_string_lossy(),
        "--map",
        "order_id=OrderID",
        "--map",
        "total=Amount",
        "--key",
        "order_id",
    ]);

    let result = fixture.workspace.load_result(&fixture.latest_handle()).unwrap();
    assert_eq!(result.columns, vec!["OrderID", "Amount"]);
    assert_eq!(result.summary.mismatches, 1);
    assert_eq!(result.summary.matched_rows, 1);
    assert_eq!(result.rows[0].values["OrderID"], "2");
    assert_eq!(result.rows[0].values["Amount"], "20");
    assert_eq!(result.rows[1].values["Amount"], "25");
    assert!(result.rows.iter().all(|r| !r.values.contains_key("Comment")));
}

#[test]
fn test_run_sequential_without_keys() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_file("sql.csv", "id,v\n1,a\n2,b\n3,c\n").unwrap();
    let target = fixture.create_file("file.csv", "id,v\n1,a\n2,x\n").unwrap();

    runner.expect_success(&[
        "run",
        "--source",
        &source.to_string_lossy(),
        "--target",
        &target.to_string_lossy(),
        "--auto-map",
    ]);

    let result = fixture.workspace.load_result(&fixture.latest_handle()).unwrap();
    assert_eq!(result.summary.comparison_mode.to_string(), "Sequential");
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.rows[2].status, RowStatus::OnlyInSql);
    assert_eq!(result.rows[2].values["id"], "3");
}

#[test]
fn test_run_rejects_unknown_column() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();
    let target = fixture.create_csv("file.csv", &sample_data::file_side()).unwrap();

    let err = runner.expect_failure(&[
        "run",
        "--source",
        &source.to_string_lossy(),
        "--target",
        &target.to_string_lossy(),
        "--map",
        "sku=name",
    ]);
    assert!(matches!(err, ReconError::Mapping(_)));
    assert!(fixture.workspace.list_results().unwrap().is_empty());
}

#[test]
fn test_run_rejects_unmapped_key() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();
    let target = fixture.create_csv("file.csv", &sample_data::file_side()).unwrap();

    let err = runner.expect_failure(&[
        "run",
        "--source",
        &source.to_string_lossy(),
        "--target",
        &target.to_string_lossy(),
        "--map",
        "name=name",
        "--key",
        "id",
    ]);
    assert!(matches!(err, ReconError::Mapping(_)));
}

#[test]
fn test_run_requires_mapping() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();

    let err = runner.expect_failure(&[
        "run",
        "--source",
        &source.to_string_lossy(),
        "--target",
        &source.to_string_lossy(),
    ]);
    assert!(matches!(err, ReconError::InvalidInput { .. }));
}

#[test]
fn test_page_show_list_commands() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();
    let target = fixture.create_csv("file.csv", &sample_data::file_side()).unwrap();
    let handle = runner.run_keyed(&source, &target);

    runner.expect_success(&["page", handle.as_str(), "--page", "2", "--size", "2"]);
    runner.expect_success(&["page", "latest", "--format", "json"]);
    runner.expect_success(&["page", handle.short(), "--page", "9"]);
    runner.expect_success(&["show", handle.short()]);
    runner.expect_success(&["show", "latest", "--format", "json"]);
    runner.expect_success(&["list"]);
    runner.expect_success(&["list", "--format", "json"]);

    let err = runner.expect_failure(&["page", "latest", "--format", "yaml"]);
    assert!(matches!(err, ReconError::InvalidInput { .. }));
}

#[test]
fn test_unknown_handle() {
    let runner = CliTestRunner::new().unwrap();
    let err = runner.expect_failure(&["page", "does-not-exist"]);
    assert!(matches!(err, ReconError::NotFound { .. }));

    let err = runner.expect_failure(&["show", "latest"]);
    assert!(matches!(err, ReconError::NotFound { .. }));
}

#[test]
fn test_evict_commands() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();
    let target = fixture.create_csv("file.csv", &sample_data::file_side()).unwrap();

    let first = runner.run_keyed(&source, &target);
    runner.run_keyed(&source, &target);
    assert_eq!(fixture.workspace.list_results().unwrap().len(), 2);

    runner.expect_success(&["evict", first.as_str()]);
    assert_eq!(fixture.workspace.list_results().unwrap().len(), 1);
    assert!(matches!(
        runner.expect_failure(&["page", first.as_str()]),
        ReconError::NotFound { .. }
    ));

    runner.expect_success(&["evict", "--all"]);
    assert!(fixture.workspace.list_results().unwrap().is_empty());
}

#[test]
fn test_max_entries_eviction_policy() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let config = tabrecon::config::ReconConfig {
        eviction: EvictionPolicy::MaxEntries { max: 2 },
        ..Default::default()
    };
    config.save(&fixture.workspace.config_path()).unwrap();

    let source = fixture.create_csv("sql.csv", &sample_data::sql_side()).unwrap();
    let target = fixture.create_csv("file.csv", &sample_data::file_side()).unwrap();

    let first = runner.run_keyed(&source, &target);
    runner.run_keyed(&source, &target);
    let third = runner.run_keyed(&source, &target);

    let handles: Vec<_> = fixture
        .workspace
        .list_results()
        .unwrap()
        .into_iter()
        .map(|r| r.handle)
        .collect();
    assert_eq!(handles.len(), 2);
    assert!(!handles.contains(&first));
    assert!(handles.contains(&third));
}

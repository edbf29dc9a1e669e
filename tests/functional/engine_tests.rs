//! Functional tests of the reconciliation engine through the public API

use std::sync::Arc;
use std::thread;
use tabrecon::matcher::MatchMode;
use tabrecon::value::Value;
use tabrecon::{
    ColumnPair, Dataset, EvictionPolicy, NormalizerConfig, PrePost, ReconEngine, ReconError,
    RowStatus,
};

fn dataset(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
    Dataset::from_records(columns, rows).unwrap()
}

fn pairs(names: &[(&str, &str)]) -> Vec<ColumnPair> {
    names.iter().map(|(s, t)| ColumnPair::new(*s, *t)).collect()
}

#[test]
fn test_normalization_equivalences_do_not_mismatch() {
    let source = dataset(
        &["id", "amount", "posted", "flag", "note"],
        vec![
            vec![1.into(), 1750.into(), "2024-03-01".into(), true.into(), Value::Null],
            vec![2.into(), (-0.0).into(), "2024-03-02 00:00:00".into(), "FALSE".into(), "None".into()],
            vec![3.into(), "12.50".into(), "2024-03-03T10:15:00".into(), false.into(), "  ok ".into()],
        ],
    );
    let target = dataset(
        &["ID", "Amount", "Posted", "Flag", "Note"],
        vec![
            vec!["1".into(), "1750.00".into(), chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().into(), "true".into(), "".into()],
            vec!["2".into(), 0.into(), "2024-03-02".into(), false.into(), "nan".into()],
            vec!["3".into(), 12.5.into(), "2024-03-03 10:15:00".into(), "False".into(), "ok".into()],
        ],
    );

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(
            &source,
            &target,
            &pairs(&[
                ("id", "ID"),
                ("amount", "Amount"),
                ("posted", "Posted"),
                ("flag", "Flag"),
                ("note", "Note"),
            ]),
            &["id".to_string()],
        )
        .unwrap();

    assert_eq!(receipt.summary.matched_rows, 3);
    assert!(!receipt.summary.has_discrepancies());
    assert!(engine.stream(&receipt.handle).unwrap().is_empty());
}

#[test]
fn test_null_versus_value_mismatches() {
    let source = dataset(&["id", "v"], vec![vec![1.into(), Value::Null]]);
    let target = dataset(&["id", "v"], vec![vec![1.into(), 0.into()]]);

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(&source, &target, &pairs(&[("id", "id"), ("v", "v")]), &["id".to_string()])
        .unwrap();

    let rows = engine.stream(&receipt.handle).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values["v"], "");
    assert_eq!(rows[1].values["v"], "0");
}

#[test]
fn test_composite_keys() {
    let source = dataset(
        &["region", "sku", "qty"],
        vec![
            vec!["EU".into(), 1.into(), 5.into()],
            vec!["US".into(), 1.into(), 7.into()],
        ],
    );
    let target = dataset(
        &["region", "sku", "qty"],
        vec![
            vec!["US".into(), "1".into(), "7".into()],
            vec!["EU".into(), "1".into(), "6".into()],
        ],
    );

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(
            &source,
            &target,
            &pairs(&[("region", "region"), ("sku", "sku"), ("qty", "qty")]),
            &["region".to_string(), "sku".to_string()],
        )
        .unwrap();

    assert_eq!(receipt.summary.comparison_mode, MatchMode::KeyBased);
    assert_eq!(receipt.summary.mismatches, 1);
    assert_eq!(receipt.summary.matched_rows, 1);

    let rows = engine.stream(&receipt.handle).unwrap();
    assert_eq!(rows[0].values["region"], "EU");
    assert_eq!(rows[0].mismatch_columns, vec!["qty".to_string()]);
}

#[test]
fn test_duplicate_keys_on_both_sides() {
    let source = dataset(
        &["id", "v"],
        vec![
            vec![5.into(), "a".into()],
            vec![5.into(), "b".into()],
            vec![5.into(), "c".into()],
        ],
    );
    let target = dataset(&["id", "v"], vec![vec![5.into(), "a".into()], vec![5.into(), "x".into()]]);

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(&source, &target, &pairs(&[("id", "id"), ("v", "v")]), &["id".to_string()])
        .unwrap();

    let rows = engine.stream(&receipt.handle).unwrap();
    let shape: Vec<(RowStatus, PrePost, &str)> = rows
        .iter()
        .map(|r| (r.status, r.pre_post, r.values["v"].as_str()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (RowStatus::Mismatch, PrePost::Pre, "b"),
            (RowStatus::Mismatch, PrePost::Post, "x"),
            (RowStatus::OnlyInSql, PrePost::Absent, "c"),
        ]
    );
}

#[test]
fn test_every_mismatch_row_has_its_partner() {
    let source = dataset(
        &["id", "v"],
        (0..50).map(|i| vec![Value::from(i as i64), Value::from((i % 3) as i64)]).collect(),
    );
    let target = dataset(
        &["id", "v"],
        (0..50).rev().map(|i| vec![Value::from(i as i64), Value::from((i % 2) as i64)]).collect(),
    );

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(&source, &target, &pairs(&[("id", "id"), ("v", "v")]), &["id".to_string()])
        .unwrap();
    let rows = engine.stream(&receipt.handle).unwrap();

    assert_eq!(rows.len(), receipt.summary.mismatches * 2);
    for group in rows.chunks(2) {
        assert_eq!(group[0].pre_post, PrePost::Pre);
        assert_eq!(group[1].pre_post, PrePost::Post);
        assert_eq!(group[0].values["id"], group[1].values["id"]);
        assert_eq!(group[0].mismatch_columns, group[1].mismatch_columns);
    }

    // pairs follow source order
    let ids: Vec<i64> = rows
        .iter()
        .step_by(2)
        .map(|r| r.values["id"].parse().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn test_page_contract() {
    let source = dataset(&["id"], (0..10).map(|i| vec![Value::from(i as i64)]).collect());
    let target = dataset(&["id"], Vec::new());

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(&source, &target, &pairs(&[("id", "id")]), &["id".to_string()])
        .unwrap();

    let page = engine.get_page(&receipt.handle, 1, 4).unwrap();
    assert_eq!(page.rows.len(), 4);
    assert!(page.has_more);
    assert_eq!(page.total_rows, 10);

    let last = engine.get_page(&receipt.handle, 3, 4).unwrap();
    assert_eq!(last.rows.len(), 2);
    assert!(!last.has_more);

    let exact = engine.get_page(&receipt.handle, 2, 5).unwrap();
    assert!(!exact.has_more);

    assert!(matches!(
        engine.get_page(&receipt.handle, 0, 4),
        Err(ReconError::InvalidInput { .. })
    ));
    assert!(matches!(
        engine.get_page(&receipt.handle, 1, 0),
        Err(ReconError::InvalidInput { .. })
    ));
}

#[test]
fn test_max_entries_store_policy() {
    let engine = ReconEngine::new(NormalizerConfig::default(), EvictionPolicy::MaxEntries { max: 2 });
    let data = dataset(&["id"], vec![vec![1.into()]]);
    let mapping = pairs(&[("id", "id")]);

    let first = engine.run_comparison(&data, &data, &mapping, &[]).unwrap();
    let second = engine.run_comparison(&data, &data, &mapping, &[]).unwrap();
    let third = engine.run_comparison(&data, &data, &mapping, &[]).unwrap();

    assert!(matches!(engine.summary(&first.handle), Err(ReconError::NotFound { .. })));
    assert!(engine.summary(&second.handle).is_ok());
    assert!(engine.summary(&third.handle).is_ok());
}

#[test]
fn test_concurrent_runs_and_reads() {
    let engine = Arc::new(ReconEngine::default());
    let mapping = pairs(&[("id", "id"), ("v", "v")]);

    let workers: Vec<_> = (0..4)
        .map(|n| {
            let engine = Arc::clone(&engine);
            let mapping = mapping.clone();
            thread::spawn(move || {
                let source = dataset(
                    &["id", "v"],
                    (0..100).map(|i| vec![Value::from(i as i64), Value::from(n as i64)]).collect(),
                );
                let target = dataset(
                    &["id", "v"],
                    (0..100).map(|i| vec![Value::from(i as i64), Value::from(0i64)]).collect(),
                );
                let receipt = engine
                    .run_comparison(&source, &target, &mapping, &["id".to_string()])
                    .unwrap();
                let streamed = engine.stream(&receipt.handle).unwrap();
                let mut paged = Vec::new();
                let mut page = 1;
                loop {
                    let p = engine.get_page(&receipt.handle, page, 33).unwrap();
                    paged.extend(p.rows);
                    if !p.has_more {
                        break;
                    }
                    page += 1;
                }
                assert_eq!(paged, streamed);
                receipt.summary.mismatches
            })
        })
        .collect();

    let mismatches: Vec<usize> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert_eq!(mismatches, vec![0, 100, 100, 100]);
    assert_eq!(engine.store().len(), 4);
}

#[test]
fn test_styled_export_differs_from_plain_only_in_format() {
    let source = dataset(&["id", "v"], vec![vec![1.into(), "a".into()]]);
    let target = dataset(&["id", "v"], vec![vec![1.into(), "b".into()]]);

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(&source, &target, &pairs(&[("id", "id"), ("v", "v")]), &["id".to_string()])
        .unwrap();

    let plain = String::from_utf8(engine.export_plain(&receipt.handle).unwrap()).unwrap();
    assert_eq!(plain.lines().count(), 3);

    let mut buf = std::io::Cursor::new(Vec::new());
    engine.write_styled(&receipt.handle, &mut buf).unwrap();
    assert_eq!(buf.into_inner(), engine.export_styled(&receipt.handle).unwrap());

    let mut written = Vec::new();
    engine.write_plain(&receipt.handle, &mut written).unwrap();
    assert_eq!(String::from_utf8(written).unwrap(), plain);
}

#[test]
fn test_integers_beyond_float_precision_pair_exactly() {
    let source = dataset(
        &["id", "v"],
        vec![
            vec![9_007_199_254_740_993i64.into(), "a".into()],
            vec![9_007_199_254_740_992i64.into(), "b".into()],
        ],
    );
    let target = dataset(
        &["id", "v"],
        vec![
            vec!["9007199254740992".into(), "b".into()],
            vec!["9007199254740993".into(), "z".into()],
        ],
    );

    let engine = ReconEngine::default();
    let receipt = engine
        .run_comparison(&source, &target, &pairs(&[("id", "id"), ("v", "v")]), &["id".to_string()])
        .unwrap();

    assert_eq!(receipt.summary.matched_rows, 1);
    assert_eq!(receipt.summary.mismatches, 1);
    let rows = engine.stream(&receipt.handle).unwrap();
    assert_eq!(rows[0].values["id"], "9007199254740993");
    assert_eq!(rows[1].values["v"], "z");
}

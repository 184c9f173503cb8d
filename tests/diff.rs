mod common;

use covpeek::aggregate::{check_threshold, diff, filter_below};

#[test]
fn diff_is_antisymmetric() {
    let a = common::report(vec![
        common::file("a.go", &[(1, 1), (2, 0), (3, 0)]),
        common::file("b.go", &[(1, 1)]),
    ]);
    let b = common::report(vec![
        common::file("a.go", &[(1, 1), (2, 1), (3, 0)]),
        common::file("c.go", &[(1, 0), (2, 1)]),
    ]);

    let ab = diff(&a, &b);
    let ba = diff(&b, &a);

    assert_eq!(ab.overall_delta, -ba.overall_delta);
    let universe = |d: &covpeek::aggregate::CoverageDiff| {
        d.file_changes
            .iter()
            .map(|c| c.path.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(universe(&ab), universe(&ba));
    assert_eq!(universe(&ab), vec!["a.go", "b.go", "c.go"]);
    for (x, y) in ab.file_changes.iter().zip(&ba.file_changes) {
        assert_eq!(x.delta, -y.delta);
    }
}

#[test]
fn file_only_in_b() {
    let a = common::report(vec![]);
    let b = common::report(vec![common::file("new.py", &[(1, 1), (2, 1), (3, 0), (4, 1)])]);

    let d = diff(&a, &b);
    assert_eq!(d.file_changes.len(), 1);
    let change = &d.file_changes[0];
    assert_eq!(change.coverage_a, 0.0);
    assert_eq!(change.coverage_b, 75.0);
    assert_eq!(change.delta, 75.0);
    assert_eq!(d.overall_a, 0.0);
    assert_eq!(d.overall_delta, 75.0);
}

#[test]
fn unchanged_files_are_reported() {
    let a = common::report(vec![common::file("same.rs", &[(1, 1)])]);
    let d = diff(&a, &a.clone());
    assert_eq!(d.file_changes.len(), 1);
    assert_eq!(d.file_changes[0].delta, 0.0);
    assert_eq!(d.regressions().count(), 0);
}

#[test]
fn diff_serializes() {
    let a = common::report(vec![common::file("x.rs", &[(1, 0)])]);
    let b = common::report(vec![common::file("x.rs", &[(1, 1)])]);
    let json = serde_json::to_value(diff(&a, &b)).unwrap();
    assert_eq!(json["overall_delta"], 100.0);
    assert_eq!(json["file_changes"][0]["path"], "x.rs");
}

#[test]
fn threshold_ignores_warnings() {
    let input = b"SF:a.rs\nDA:1,1\nBOGUS\nLF:1\nLH:1\nend_of_record\n";
    let outcome = covpeek::parsers::lcov::parse(input).unwrap();
    assert!(!outcome.warnings.is_empty());

    let gate = check_threshold(&outcome.report, 90.0).unwrap();
    assert!(gate.passed);
    assert_eq!(gate.actual, 100.0);
}

#[test]
fn threshold_out_of_range() {
    let report = common::report(vec![]);
    let err = check_threshold(&report, 101.0).unwrap_err();
    assert_eq!(err.to_string(), "threshold must be between 0 and 100, got 101.00");
}

#[test]
fn filter_keeps_only_low_files() {
    let report = common::report(vec![
        common::file("low.rs", &[(1, 1), (2, 0), (3, 0)]),
        common::file("high.rs", &[(1, 1), (2, 1), (3, 0)]),
    ]);
    let low = filter_below(&report, 50.0);
    assert_eq!(low.len(), 1);
    assert!(low.contains_file("low.rs"));
}

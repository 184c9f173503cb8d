mod common;

use covpeek::parsers::lcov::LcovParser;
use covpeek::parsers::CoverageParser;

#[test]
fn literal_round_trip() {
    let input = b"TN:t\nSF:f.go\nDA:1,1\nDA:2,0\nLH:1\nLF:2\nend_of_record\n";
    let outcome = LcovParser.parse(input).unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.report.test_name.as_deref(), Some("t"));
    assert_eq!(outcome.report.len(), 1);

    let file = outcome.report.file("f.go").unwrap();
    assert_eq!(file.total_lines, 2);
    assert_eq!(file.covered_lines, 1);
    assert_eq!(file.coverage_pct, 50.0);
}

#[test]
fn invalid_da_line_is_tolerated() {
    let input = b"SF:f.rs\nDA:1,oops\nDA:2,7\nLH:1\nLF:1\nend_of_record\n";
    let outcome = covpeek::parsers::lcov::parse(input).unwrap();

    let file = outcome.report.file("f.rs").unwrap();
    assert_eq!(file.lines.len(), 1);
    assert_eq!(file.lines[&2].execution_count, 7);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].starts_with("line 2: "));
}

#[test]
fn percentages_match_counts() {
    let outcome = covpeek::parsers::lcov::parse(&common::fixture("sample.lcov")).unwrap();
    for file in outcome.report.files() {
        let expected = file.covered_lines as f64 / file.total_lines as f64 * 100.0;
        common::assert_pct(file.coverage_pct, expected);
    }
    common::assert_pct(outcome.report.totals().coverage_pct, 5.0 / 7.0 * 100.0);
}

#[test]
fn crlf_and_blank_lines() {
    let input = b"TN:win\r\n\r\nSF:C:\\src\\main.c\r\nDA:1,1\r\nLF:1\r\nLH:1\r\nend_of_record\r\n";
    let outcome = covpeek::parsers::lcov::parse(input).unwrap();
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    let file = outcome.report.file("C:\\src\\main.c").unwrap();
    assert_eq!(file.coverage_pct, 100.0);
}

#[test]
fn report_serializes_to_json() {
    let outcome = covpeek::parsers::lcov::parse(&common::fixture("sample.lcov")).unwrap();
    let json = serde_json::to_value(&outcome.report).unwrap();
    assert_eq!(json["test_name"], "unit");
    assert_eq!(json["files"]["/src/lib.rs"]["covered_lines"], 4);
    assert_eq!(json["files"]["/src/lib.rs"]["functions"][0]["name"], "main");
}

#![no_main]
use libfuzzer_sys::fuzz_target;

use covpeek::config::ParseOptions;

fuzz_target!(|data: &[u8]| {
    // Detection plus whichever parser it picks must not panic.
    if let Ok(ingested) = covpeek::ingest::parse_report(data, None, &ParseOptions::default()) {
        for file in ingested.report.files() {
            assert!(file.coverage_pct.is_finite());
        }
        let _ = covpeek::aggregate::merge([&ingested.report, &ingested.report]);
    }
});

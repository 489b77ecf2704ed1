//! Fuzz target for single-line label parsing.
//!
//! Feeds arbitrary UTF-8 lines to the record parser and checks that a line
//! the parser accepts also passes the validator's structural check.

#![no_main]

use labelaudit::label::{has_record_shape, parse_record, LineOutcome};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    if let LineOutcome::Record(record) = parse_record(line) {
        assert!(has_record_shape(line));
        let _ = record.size_class();
        let _ = record.aspect_ratio();
    }
});

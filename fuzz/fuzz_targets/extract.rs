#![no_main]

use chrono::{TimeZone, Utc};
use sqltrail_core::{extract, tokenize, Dialect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        if let Ok(tokens) = tokenize(sql, Dialect::Generic) {
            let executed_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let _ = extract(&tokens, "DB", "SCHEMA", executed_at);
        }
    }
});

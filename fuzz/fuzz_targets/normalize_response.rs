// SPDX-License-Identifier: Apache-2.0

#![no_main]

use bugcap_core::{IssueSuggestion, LogAnalysis, assemble_payload, normalize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = normalize::<LogAnalysis>(s);
        if let Ok(parsed) = normalize::<IssueSuggestion>(s) {
            let payload = assemble_payload(&parsed.value, "FUZZ");
            assert!(payload.fields.contains_key("summary"));
        }
        let _ = normalize::<serde_json::Value>(s);
    }
});

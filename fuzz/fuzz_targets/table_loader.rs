#![no_main]

use deviance_engine::config::DevianceConfig;
use deviance_engine::deviance;
use deviance_engine::table::{DecimalParser, DecimalSeparator, LenientParser, TableLoader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Loading and analysing arbitrary text must never panic
        for decimal in [DecimalSeparator::Comma, DecimalSeparator::Period] {
            for delimiter in [',', ';'] {
                let loader = TableLoader::new(delimiter, decimal);
                if let Ok(table) = loader.load_str(input) {
                    let _ = deviance::analyze(&table, &DevianceConfig::default());
                }
            }
        }

        for line in input.lines() {
            let _ = LenientParser.parse(line);
        }
    }
});

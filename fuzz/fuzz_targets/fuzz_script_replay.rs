#![no_main]

use libfuzzer_sys::fuzz_target;
use moving_window::script::{Script, replay};
use moving_window::trial::TrialParams;

fuzz_target!(|data: &[u8]| {
    let Ok(yaml_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(script) = Script::from_yaml(yaml_str) else {
        return;
    };

    if let Ok(report) = replay(&script, TrialParams::default(), None) {
        if let Some(result) = report.result {
            assert_eq!(result.word_geometry().len(), script.sentence.split_whitespace().count());
            assert!(
                result
                    .word_events()
                    .windows(2)
                    .all(|w| w[0].elapsed_ms <= w[1].elapsed_ms)
            );
        }
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use taskdeck_core::config::BoardConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Anything that loads has already passed validation.
    let loaded = [BoardConfig::from_toml_str(text), BoardConfig::from_json_str(text)];
    for config in loaded.into_iter().flatten() {
        assert!(config.validate().is_empty());
        assert!(config.drag.activation_distance.is_finite());
        assert!(config.drag.activation_distance >= 0.0);
    }
});

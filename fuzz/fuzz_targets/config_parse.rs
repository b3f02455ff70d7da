#![no_main]

use libfuzzer_sys::fuzz_target;
use logcap_core::config::LogcapConfig;

fuzz_target!(|data: &[u8]| {
    // 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = LogcapConfig::parse_toml(text) {
            let _ = config.validate();
        }
        if let Ok(config) = LogcapConfig::parse_yaml(text) {
            let _ = config.validate();
        }
    }
});

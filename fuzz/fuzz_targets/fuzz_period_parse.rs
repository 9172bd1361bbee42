#![no_main]

use filterprobe::Period;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(period) = data.parse::<Period>() {
        assert!(period.total_hours() > 0, "Parsed period must not be empty");

        // Display drops zero parts and leading zeros, so compare values
        let reparsed: Period = period
            .to_string()
            .parse()
            .expect("Displayed period should re-parse");
        assert_eq!(reparsed, period);
    }
});

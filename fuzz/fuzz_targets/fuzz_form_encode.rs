#![no_main]

use filterprobe::reseller::api::{url_encode, Form};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Vec<(&str, &str)>| {
    for (key, value) in &data {
        for encoded in [url_encode(key), url_encode(value)] {
            assert!(
                encoded
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_.~*+%".contains(c)),
                "Unexpected character in {encoded:?}"
            );
        }
    }

    let form = data
        .iter()
        .fold(Form::new(), |form, (key, value)| form.field(key, value));
    let encoded = form.encode();
    if data.is_empty() {
        assert!(encoded.is_empty());
    } else {
        assert_eq!(encoded.split('&').count(), data.len());
    }
});

#![no_main]

use filterprobe::rpc::api::render_request;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str, &str)| {
    let (template, method, params) = data;
    let rendered = render_request(template, method, params);

    // Without placeholders the template passes through untouched
    if !template.contains("{method}") && !template.contains("{params}") {
        assert_eq!(rendered, template);
    }

    // Substituted text is never expanded again
    let fixed = render_request("{method}{params}", method, params);
    assert_eq!(fixed, format!("{method}{params}"));
});

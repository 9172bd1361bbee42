#![no_main]

//! Fuzz testing for positional parameter rendering.
//!
//! Builds parameter lists from structured input and checks that the
//! rendered request is always valid JSON with the expected arity.

use arbitrary::Arbitrary;
use filterprobe::rpc::api::{Params, RpcCall};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Param {
    Int(i64),
    Str(String),
    Bool(bool),
    Flag(bool),
    Toggle(bool),
    IntList(Vec<u32>),
}

#[derive(Debug, Arbitrary)]
struct Input {
    method: String,
    params: Vec<Param>,
}

fuzz_target!(|input: Input| {
    let params = input.params.iter().fold(Params::new(), |p, param| match param {
        Param::Int(n) => p.int(*n),
        Param::Str(s) => p.string(s),
        Param::Bool(b) => p.bool(*b),
        Param::Flag(b) => p.quoted_flag(*b),
        Param::Toggle(b) => p.toggle(*b),
        Param::IntList(v) => p.int_list(v),
    });
    assert_eq!(params.len(), input.params.len());

    // Method names are inserted verbatim, so only plain names are checked
    if !input.method.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return;
    }

    let body = RpcCall::new(input.method.as_str(), params).render();
    let json: serde_json::Value =
        serde_json::from_str(&body).expect("Rendered request must be valid JSON");
    assert_eq!(
        json["params"].as_array().map(Vec::len),
        Some(input.params.len())
    );
});

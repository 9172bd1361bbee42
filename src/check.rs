//! Response-shape checks.
//!
//! The service's responses are not schema-validated; callers look up the keys
//! they expect and treat anything else as a failure. These helpers make that
//! failure carry the whole response body, so a broken assertion reads like
//! "no key `result` in response: {...}" instead of a bare panic.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde_json::Value;

/// A response did not have the expected shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("no key {key:?} in response: {body}")]
    MissingKey { key: String, body: String },

    #[error("expected {expected} at {path:?} in response: {body}")]
    WrongType {
        path: String,
        expected: &'static str,
        body: String,
    },
}

/// Looks up `key` in a JSON object.
///
/// Fails with the serialized `value` if `value` is not an object or has no
/// such key.
pub fn key<'a>(value: &'a Value, key: &str) -> Result<&'a Value, ShapeError> {
    value.get(key).ok_or_else(|| ShapeError::MissingKey {
        key: key.to_string(),
        body: value.to_string(),
    })
}

/// Follows a path of object keys, e.g. `["plan", "features", "safe_search"]`.
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Value, ShapeError> {
    keys.iter().try_fold(value, |current, k| {
        current.get(*k).ok_or_else(|| ShapeError::MissingKey {
            key: keys.join("."),
            body: value.to_string(),
        })
    })
}

/// Returns the string at `value`, or a type error naming `path`.
pub fn as_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, ShapeError> {
    value.as_str().ok_or_else(|| ShapeError::WrongType {
        path: path.to_string(),
        expected: "string",
        body: value.to_string(),
    })
}

/// Truthiness of a JSON value as the service's own clients judge it.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are falsy; everything else is
/// truthy. Many mutating RPC methods return a falsy value on success.
///
/// ```
/// use filterprobe::check::truthy;
/// use serde_json::json;
///
/// assert!(!truthy(&json!(null)));
/// assert!(!truthy(&json!([])));
/// assert!(truthy(&json!([true])));
/// assert!(truthy(&json!(-1)));
/// ```
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Returns true if `addr` is a globally routable IPv4 address.
///
/// Excludes `0.0.0.0/8`, private ranges, shared address space
/// (`100.64.0.0/10`), loopback, link-local, the IETF protocol block
/// (`192.0.0.0/24`), documentation ranges, benchmarking (`198.18.0.0/15`),
/// multicast and the reserved `240.0.0.0/4` block including broadcast.
pub fn is_public_ipv4(addr: Ipv4Addr) -> bool {
    let [a, b, c, _] = addr.octets();

    let shared = a == 100 && (64..128).contains(&b);
    let ietf = a == 192 && b == 0 && c == 0;
    let benchmarking = a == 198 && (b == 18 || b == 19);

    !(a == 0
        || addr.is_private()
        || shared
        || addr.is_loopback()
        || addr.is_link_local()
        || ietf
        || addr.is_documentation()
        || benchmarking
        || addr.is_multicast()
        || a >= 240)
}

/// Returns true if `addr` is a globally routable IPv6 address.
pub fn is_public_ipv6(addr: Ipv6Addr) -> bool {
    let segments = addr.segments();

    let unique_local = (segments[0] & 0xfe00) == 0xfc00;
    let link_local = (segments[0] & 0xffc0) == 0xfe80;
    let documentation = segments[0] == 0x2001 && segments[1] == 0x0db8;

    if let Some(v4) = addr.to_ipv4_mapped() {
        return is_public_ipv4(v4);
    }

    !(addr.is_unspecified()
        || addr.is_loopback()
        || addr.is_multicast()
        || unique_local
        || link_local
        || documentation)
}

/// Returns true if `addr` is a globally routable address of either family.
pub fn is_public_ip(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_public_ipv4(v4),
        IpAddr::V6(v6) => is_public_ipv6(v6),
    }
}

/// Parses `s` and checks that it is a public IPv4 address.
pub fn public_ipv4(s: &str) -> Option<Ipv4Addr> {
    s.parse::<Ipv4Addr>().ok().filter(|addr| is_public_ipv4(*addr))
}

//! Resources compiled into the binary.

/// Name of the built-in hint rule resource.
pub const BASE_HINTS_NAME: &str = "base-hints.xml";

/// The built-in hint rules.
pub const BASE_HINTS: &str = include_str!("../resources/base-hints.xml");

/// Look up an embedded resource by name. A leading `/` is ignored.
pub fn embedded(name: &str) -> Option<&'static str> {
    match name.trim_start_matches('/') {
        BASE_HINTS_NAME => Some(BASE_HINTS),
        _ => None,
    }
}

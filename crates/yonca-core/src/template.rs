//! Message template rendering.
//!
//! Rule messages carry `{name}` placeholders. Each placeholder is resolved in
//! one pass against the context: first the bare key, then the key under each
//! of [`FALLBACK_PREFIXES`] in order. Unresolved placeholders are left in the
//! output verbatim.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::context::{Context, ContextValue};

/// Prefixes tried, in order, when a placeholder is not a bare context key.
pub const FALLBACK_PREFIXES: [&str; 5] = [
    "weather.",
    "soil.",
    "crop_context.",
    "livestock_context.",
    "greenhouse_context.",
];

lazy_static! {
    /// `{word}` placeholder.
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(\w+)\}").unwrap();
}

/// Look up `name` as a bare key, then under each fallback prefix.
pub fn resolve<'a>(name: &str, ctx: &'a Context) -> Option<&'a ContextValue> {
    ctx.get(name).or_else(|| {
        FALLBACK_PREFIXES
            .iter()
            .find_map(|prefix| ctx.get(&format!("{}{}", prefix, name)))
    })
}

/// Render `template` against `ctx`.
pub fn render<'t>(template: &'t str, ctx: &Context) -> Cow<'t, str> {
    PLACEHOLDER.replace_all(template, |caps: &Captures| match resolve(&caps[1], ctx) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
}

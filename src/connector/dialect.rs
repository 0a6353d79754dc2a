//! Version-aware query dialect selection.
//!
//! Checks declare every variant of a query with the minimum major version it
//! needs. Selection picks the highest variant the backend satisfies and falls
//! back to the oldest variant when none does.

use super::VersionInfo;

/// One dialect variant of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryVariant {
    pub name: &'static str,
    pub min_major: u32,
    pub query: &'static str,
}

/// Select the best variant for `version`.
///
/// Returns `None` only when `variants` is empty.
pub fn select_variant<'a>(variants: &'a [QueryVariant], version: &VersionInfo) -> Option<&'a QueryVariant> {
    let supported = variants
        .iter()
        .filter(|v| v.min_major <= version.major_version)
        .max_by_key(|v| v.min_major);

    supported.or_else(|| variants.iter().min_by_key(|v| v.min_major))
}

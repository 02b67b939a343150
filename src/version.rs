//! Elasticsearch version parsing.

pub use semver::Version;

use crate::error::{Error, Result};

/// Parse an Elasticsearch version string.
///
/// Accepts full semver strings (`7.4.0`, `7.4.0-SNAPSHOT`) as well as the
/// shortened `7` and `7.4` forms, which are expanded with zero components.
pub fn parse(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let (core, suffix) = match trimmed.find(['-', '+']) {
        Some(idx) => trimmed.split_at(idx),
        None => (trimmed, ""),
    };

    let normalized = match core.matches('.').count() {
        0 => format!("{}.0.0{}", core, suffix),
        1 => format!("{}.0{}", core, suffix),
        _ => trimmed.to_string(),
    };

    Version::parse(&normalized).map_err(|source| Error::Version {
        version: version.to_string(),
        source,
    })
}

/*
 * version.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Version strings.
//!
//! Templates test `pandoc-version` to decide which features are available,
//! so the value reported there is the pandoc release whose template
//! behaviour this crate tracks, not the crate's own version.

/// The pandoc release whose templates and options this crate follows.
const PANDOC_COMPAT_VERSION: &str = "3.6.4";

/// Version string exposed to templates as `pandoc-version`.
pub fn pandoc_version() -> &'static str {
    PANDOC_COMPAT_VERSION
}

/// The Cargo package version.
pub fn cargo_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pandoc_version_is_dotted_numeric() {
        assert!(
            pandoc_version()
                .split('.')
                .all(|part| part.parse::<u32>().is_ok())
        );
    }

    #[test]
    fn test_cargo_version_matches_manifest() {
        assert_eq!(cargo_version(), env!("CARGO_PKG_VERSION"));
    }
}

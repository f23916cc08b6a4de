//! Byte-comparable sort key for card versions.
//!
//! Comparing two keys as plain strings gives semantic-version precedence, so
//! the SQLite store can `ORDER BY version_key DESC` and the in-memory store
//! can sort on the same key. Build metadata is ignored. Versions that do not
//! parse as semver sort below every valid one.

use semver::{Prerelease, Version};

// Between pre-release identifiers; below every identifier character.
const IDENT_SEPARATOR: char = '!';
// Marks a release; above every encoded pre-release.
const RELEASE_MARKER: &str = "~";
const UNPARSABLE_PREFIX: &str = "!";

pub fn version_sort_key(version: &str) -> String {
    match Version::parse(version.trim()) {
        Ok(parsed) => format!(
            "{:020}.{:020}.{:020}.{}",
            parsed.major,
            parsed.minor,
            parsed.patch,
            prerelease_key(&parsed.pre)
        ),
        Err(_) => format!("{UNPARSABLE_PREFIX}{version}"),
    }
}

fn prerelease_key(pre: &Prerelease) -> String {
    if pre.is_empty() {
        return RELEASE_MARKER.to_string();
    }
    pre.as_str()
        .split('.')
        .map(|ident| {
            // Numeric identifiers rank below alphanumeric ones. They carry no
            // leading zeros, so length then digits orders them at any size.
            if ident.bytes().all(|b| b.is_ascii_digit()) {
                format!("0{:020}{ident}", ident.len())
            } else {
                format!("1{ident}")
            }
        })
        .collect::<Vec<_>>()
        .join(&IDENT_SEPARATOR.to_string())
}

//! Text-level helpers for the package index commit.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::manifest::fields;
use crate::package::PackageRecord;

/// Matches a `PROFILE:` line directly followed by a `TIMESTAMP:` line.
fn profile_timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(PROFILE:.*\n)(TIMESTAMP:.*\n)").unwrap())
}

/// Insert a `URI:` line between the `PROFILE:` and `TIMESTAMP:` header lines.
///
/// Text without that line pair is returned unchanged.
///
/// # Examples
///
/// ```
/// use binhost::publisher::insert_header_uri;
///
/// let text = "PACKAGES: 1\nPROFILE: default/linux/amd64/23.0\nTIMESTAMP: 1\n\nPATH: a\n";
/// assert_eq!(
///     insert_header_uri(text, "https://example.org/dl"),
///     "PACKAGES: 1\nPROFILE: default/linux/amd64/23.0\nURI: https://example.org/dl\nTIMESTAMP: 1\n\nPATH: a\n"
/// );
/// ```
pub fn insert_header_uri(text: &str, uri: &str) -> String {
    profile_timestamp_pattern()
        .replace_all(text, |caps: &Captures| {
            format!("{}{}: {}\n{}", &caps[1], fields::URI, uri, &caps[2])
        })
        .into_owned()
}

/// Commit message of an index update.
pub fn commit_message(package: &PackageRecord, replaced: bool) -> String {
    format!(
        "{} {}",
        package.cpv(),
        if replaced { "updated" } else { "added" }
    )
}

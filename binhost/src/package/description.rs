//! Category descriptions from ebuild repository `metadata.xml` files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

/// Description used when a category has no usable `metadata.xml`.
pub const CUSTOM_CATEGORY_DESCRIPTION: &str = "custom category";

/// Matches `<longdescription ...>text</longdescription>`.
///
/// - Group 1: attributes of the opening tag
/// - Group 2: element text
fn long_description_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<longdescription\b([^>]*)>(.*?)</longdescription\s*>").unwrap()
    })
}

fn english_lang_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\blang\s*=\s*["']en["']"#).unwrap())
}

/// `metadata.xml` of the category an ebuild belongs to.
///
/// Ebuilds live at `<repo>/<category>/<package>/<file>.ebuild`, so this is two
/// directories up from the ebuild.
fn category_metadata_path(ebuild: &Path) -> Option<PathBuf> {
    ebuild
        .parent()
        .and_then(Path::parent)
        .map(|category| category.join("metadata.xml"))
}

/// Long description of the category an ebuild belongs to.
///
/// Falls back to [`CUSTOM_CATEGORY_DESCRIPTION`] when the category has no
/// `metadata.xml` or no English long description.
pub fn category_description(ebuild: &Path) -> String {
    let Some(path) = category_metadata_path(ebuild) else {
        return CUSTOM_CATEGORY_DESCRIPTION.to_string();
    };

    if !path.is_file() {
        return CUSTOM_CATEGORY_DESCRIPTION.to_string();
    }

    match fs::read_to_string(&path) {
        Ok(xml) => parse_long_description(&xml)
            .unwrap_or_else(|| CUSTOM_CATEGORY_DESCRIPTION.to_string()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read category metadata");
            CUSTOM_CATEGORY_DESCRIPTION.to_string()
        }
    }
}

/// Extract the English `<longdescription>` of a `metadata.xml` document.
///
/// The text is trimmed, leading whitespace is stripped from every line and
/// the lines are joined with single spaces.
///
/// # Examples
///
/// ```
/// use binhost::package::parse_long_description;
///
/// let xml = r#"<catmetadata>
///     <longdescription lang="de">Verschiedenes</longdescription>
///     <longdescription lang="en">
///         Miscellaneous applications
///         &amp; tools.
///     </longdescription>
/// </catmetadata>"#;
///
/// assert_eq!(
///     parse_long_description(xml).as_deref(),
///     Some("Miscellaneous applications & tools.")
/// );
/// ```
pub fn parse_long_description(xml: &str) -> Option<String> {
    let captures = long_description_pattern()
        .captures_iter(xml)
        .find(|c| english_lang_pattern().is_match(&c[1]))?;

    let text = unescape_xml(captures[2].trim());
    let joined = text
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Some(joined)
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_metadata_uses_placeholder() {
        let repo = TempDir::new().unwrap();
        let ebuild = repo.path().join("app-misc/foo/foo-1.0.ebuild");

        assert_eq!(category_description(&ebuild), CUSTOM_CATEGORY_DESCRIPTION);
    }

    #[test]
    fn test_reads_category_metadata() {
        let repo = TempDir::new().unwrap();
        let category = repo.path().join("app-misc");
        fs::create_dir_all(category.join("foo")).unwrap();
        fs::write(
            category.join("metadata.xml"),
            "<?xml version=\"1.0\"?>\n<catmetadata>\n\t<longdescription lang=\"en\">\n\t\tThe app-misc category\n\t\tcontains miscellaneous applications.\n\t</longdescription>\n</catmetadata>\n",
        )
        .unwrap();

        let ebuild = category.join("foo/foo-1.0.ebuild");
        assert_eq!(
            category_description(&ebuild),
            "The app-misc category contains miscellaneous applications."
        );
    }

    #[test]
    fn test_without_english_description() {
        let xml = "<catmetadata><longdescription lang=\"ja\">x</longdescription></catmetadata>";
        assert_eq!(parse_long_description(xml), None);
    }

    #[test]
    fn test_blank_lines_collapse() {
        let xml = "<longdescription lang='en'>first\n\n   second\n</longdescription>";
        assert_eq!(parse_long_description(xml).as_deref(), Some("first second"));
    }

    #[test]
    fn test_non_english_before_english() {
        let xml = "<longdescription lang=\"de\">eins</longdescription>\
                   <longdescription lang=\"en\">one</longdescription>";
        assert_eq!(parse_long_description(xml).as_deref(), Some("one"));
    }
}

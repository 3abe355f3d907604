//! Centralized binary package naming conventions.
//!
//! This module is the single source of truth for:
//! - Archive file names (e.g., `foo-1.0.tbz2`, `foo-1.0-3.xpak`)
//! - Index paths (e.g., `app-misc/foo-1.0.tbz2`, `app-misc/foo/foo-1.0-3.xpak`)
//! - Release tags (e.g., `binhost-x86_64-pc-linux-gnu/app-misc`)

/// Archive extension of single-instance packages.
pub const SINGLE_INSTANCE_EXT: &str = "tbz2";

/// Archive extension of multi-instance packages.
pub const MULTI_INSTANCE_EXT: &str = "xpak";

/// Archive file name for a package.
///
/// # Examples
///
/// ```
/// use binhost::package::archive_filename;
///
/// assert_eq!(archive_filename("foo-1.0", None), "foo-1.0.tbz2");
/// assert_eq!(archive_filename("foo-1.0", Some(3)), "foo-1.0-3.xpak");
/// ```
pub fn archive_filename(full_name: &str, build_id: Option<u64>) -> String {
    match build_id {
        Some(id) => format!("{}-{}.{}", full_name, id, MULTI_INSTANCE_EXT),
        None => format!("{}.{}", full_name, SINGLE_INSTANCE_EXT),
    }
}

/// Path of an archive relative to `PKGDIR`; also its `PATH` in the index.
///
/// # Examples
///
/// ```
/// use binhost::package::archive_path;
///
/// assert_eq!(archive_path("app-misc", "foo", "foo-1.0.tbz2", false), "app-misc/foo-1.0.tbz2");
/// assert_eq!(archive_path("app-misc", "foo", "foo-1.0-3.xpak", true), "app-misc/foo/foo-1.0-3.xpak");
/// ```
pub fn archive_path(category: &str, name: &str, file_name: &str, multi_instance: bool) -> String {
    if multi_instance {
        format!("{}/{}/{}", category, name, file_name)
    } else {
        format!("{}/{}", category, file_name)
    }
}

/// Extract the build id from a multi-instance archive file name.
///
/// Returns `None` unless `file_name` is exactly `<full_name>-<digits>.xpak`.
///
/// # Examples
///
/// ```
/// use binhost::package::parse_build_id;
///
/// assert_eq!(parse_build_id("foo-1.0-10.xpak", "foo-1.0"), Some(10));
/// assert_eq!(parse_build_id("foo-1.0-r1-2.xpak", "foo-1.0"), None);
/// assert_eq!(parse_build_id("foo-1.0.tbz2", "foo-1.0"), None);
/// ```
pub fn parse_build_id(file_name: &str, full_name: &str) -> Option<u64> {
    let id = file_name
        .strip_prefix(full_name)?
        .strip_prefix('-')?
        .strip_suffix(MULTI_INSTANCE_EXT)?
        .strip_suffix('.')?;

    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// Release tag holding the archives of a category, or of a single package in
/// the multi-instance layout.
///
/// # Examples
///
/// ```
/// use binhost::package::release_tag;
///
/// assert_eq!(release_tag("binhost-x", "app-misc", None), "binhost-x/app-misc");
/// assert_eq!(release_tag("binhost-x", "app-misc", Some("foo")), "binhost-x/app-misc/foo");
/// ```
pub fn release_tag(branch: &str, category: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{}/{}/{}", branch, category, name),
        None => format!("{}/{}", branch, category),
    }
}

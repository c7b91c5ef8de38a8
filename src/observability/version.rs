//! Version lookup for the `version` field.

/// Resolve the version: the explicit override first, then the revision
/// baked in at compile time (`GIT_REVISION`, suffixed with `-modified` when
/// `GIT_MODIFIED=true`). `None` when neither is available.
pub fn resolve_version(explicit: Option<&str>) -> Option<String> {
    if let Some(version) = explicit.filter(|v| !v.is_empty()) {
        return Some(version.to_string());
    }
    from_revision(option_env!("GIT_REVISION"), option_env!("GIT_MODIFIED"))
}

fn from_revision(revision: Option<&str>, modified: Option<&str>) -> Option<String> {
    let revision = revision.filter(|r| !r.is_empty())?;
    if modified == Some("true") {
        Some(format!("{revision}-modified"))
    } else {
        Some(revision.to_string())
    }
}

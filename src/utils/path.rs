//! Helpers for the `/`-separated paths used inside an EPUB container.
//! These are package paths, never OS paths.

/// Normalize a package path, resolving ".." and "." components
pub fn normalize_path(path: &str) -> String {
    let mut result: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            ".." => {
                // Go up one level unless we're at the root
                result.pop();
            }
            "." | "" => {}
            other => result.push(other),
        }
    }

    result.join("/")
}

/// Directory part of a package path ("" for a root-level file)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Resolve an href found in a file located in `base_dir` to a full package path.
/// Fragments are dropped and percent-escapes decoded.
pub fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string());

    if base_dir.is_empty() {
        normalize_path(&decoded)
    } else {
        normalize_path(&format!("{}/{}", base_dir, decoded))
    }
}

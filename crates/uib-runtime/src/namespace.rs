//! Namespace derivation from the page path.

/// Derive the channel namespace from the page's URL path.
///
/// Splits on `/`, drops empty segments, and rejoins with a leading `/`.
/// `/uibuilder/app/` and `uibuilder//app` both give `/uibuilder/app`; an
/// empty or root path gives `/`.
pub fn derive_namespace(page_path: &str) -> String {
    let segments: Vec<&str> = page_path
        .split('/')
        .filter(|segment| !segment.trim().is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

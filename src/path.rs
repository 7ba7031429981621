//! Object-key path helpers.
//!
//! Object keys are assembled from a configured prefix, an optional per-file
//! path and the `hash + ext` filename. These helpers guarantee the result has
//! no leading slash and no double slash introduced by the join itself.

/// Normalize a configured key prefix.
///
/// Strips all leading and trailing slashes and surrounding whitespace. An
/// empty result stays empty; anything else gets exactly one trailing slash,
/// so it can be concatenated directly in front of another segment.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Join path segments with single forward slashes.
///
/// Every segment but the last gets a trailing slash unless it is empty or
/// already ends in one; the last segment is appended verbatim. Double slashes
/// already present inside a segment are left alone.
pub fn join_segments(segments: &[&str]) -> String {
    let mut joined = String::new();
    if let Some((last, init)) = segments.split_last() {
        for segment in init {
            joined.push_str(segment);
            if !segment.is_empty() && !segment.ends_with('/') {
                joined.push('/');
            }
        }
        joined.push_str(last);
    }
    joined
}

/// Normalize a file extension to exactly one leading dot.
///
/// Callers supply extensions both as `"txt"` and `".txt"`; both forms yield
/// `".txt"`. An empty or whitespace-only extension contributes nothing.
pub fn normalize_ext(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{trimmed}")
    }
}

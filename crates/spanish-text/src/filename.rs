//! Safe file-name components

/// Replace characters that are unsafe in a file name with `_`
///
/// Whitespace runs collapse into a single `_`. Letters with accents are kept,
/// so "García, Ana" becomes "García_Ana".
///
/// # Examples
/// ```
/// use spanish_text::sanitize_file_component;
/// assert_eq!(sanitize_file_component("García, Ana"), "García_Ana");
/// assert_eq!(sanitize_file_component("../x"), ".._x");
/// ```
pub fn sanitize_file_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_gap = false;

    for c in value.trim().chars() {
        if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            if pending_gap {
                out.push('_');
                pending_gap = false;
            }
            out.push(c);
        } else if c.is_whitespace() {
            pending_gap = true;
        } else {
            out.push('_');
            pending_gap = false;
        }
    }

    // "García, Ana" -> "García__Ana" otherwise
    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out
}

//! Identifier and filename normalisation.

/// Keep letters and digits of any script plus `_` and `-`. Applied to every
/// id taken from a query string; anything [`slugify`] produces passes intact.
pub fn clean_slug(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Lowercase and join alphanumeric runs with single dashes.
///
/// Letters and digits from any script survive; everything else becomes a
/// separator. Never returns an empty string.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() { "item".to_string() } else { out }
}

/// Make `name` safe as a single path component.
///
/// Runs outside `[A-Za-z0-9._-]` become `_`, underscores collapse, and leading
/// or trailing underscores are dropped. Falls back to `image`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let keep = c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
        let c = if keep { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('_');
    // "." and ".." would escape the directory they are joined onto.
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "image".to_string()
    } else {
        trimmed.to_string()
    }
}

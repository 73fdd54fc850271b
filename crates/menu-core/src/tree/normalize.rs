/// Canonical form of a raw menu path.
///
/// Drops everything from the first `#` or `?`, then trailing slashes unless
/// the path is exactly `/`. Empty results are `None`. Idempotent.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    let cut = trimmed.find(['#', '?']).unwrap_or(trimmed.len());
    let mut path = trimmed[..cut].trim();

    while path.len() > 1 && path.ends_with('/') {
        path = path[..path.len() - 1].trim_end();
    }

    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Derive a display name from an archive filename: strip the
/// extension, turn underscores into spaces, trim.
pub fn collection_name_from_archive(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    let name = stem.replace('_', " ").trim().to_string();
    if name.is_empty() {
        "Collection".to_string()
    } else {
        name
    }
}

/// Lowercase, URL-safe slug: alphanumeric runs joined by single
/// hyphens. Falls back to "collection" when nothing survives.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "collection".to_string()
    } else {
        slug
    }
}

use super::error::ImportError;

/// Normalize an archive entry name to a relative path confined to
/// the collection namespace, or fail with [`ImportError::UnsafePath`].
///
/// The returned path uses `/` separators and contains no `.` or `..`
/// segments, no absolute prefix, no backslashes and no null bytes.
/// Rejection of a single entry aborts the whole import; a hostile
/// archive never gets partial acceptance.
pub fn sanitize_entry_name(raw: &str) -> Result<String, ImportError> {
    let unsafe_path = || ImportError::UnsafePath(raw.to_string());

    if raw.is_empty() || raw.contains('\0') {
        return Err(unsafe_path());
    }

    // Windows-style separators and drive prefixes are never valid
    // inside our archives; treat them as hostile rather than
    // guessing at normalization.
    if raw.contains('\\') {
        return Err(unsafe_path());
    }

    if raw.starts_with('/') {
        return Err(unsafe_path());
    }

    if raw.len() >= 2 && raw.as_bytes()[1] == b':' && raw.as_bytes()[0].is_ascii_alphabetic() {
        return Err(unsafe_path());
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            // "a//b" and a trailing "/" produce empty segments; the
            // trailing case is handled by the caller as a directory
            // marker before sanitization.
            "" | "." => continue,
            ".." => return Err(unsafe_path()),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(unsafe_path());
    }

    Ok(segments.join("/"))
}

/// Directory markers carry no content and are skipped, not stored.
pub fn is_directory_marker(raw_name: &str, uncompressed_size: u64) -> bool {
    raw_name.ends_with('/') && uncompressed_size == 0
}

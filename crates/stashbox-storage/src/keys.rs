//! Naming policy for stored objects.

use uuid::Uuid;

/// Reduce an uploaded file name to a safe single path segment.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`;
/// everything else is dropped. Leading dots and underscores are stripped so
/// the result is never hidden or empty.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_']).trim_end_matches(['.', '_']);
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Extension including the dot, lowercased, or empty.
pub fn dotted_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Object key: `<prefix>/<owner>/<owner>_<32 hex><ext>`.
pub fn remote_key(prefix: &str, owner_id: Uuid, logical_name: &str) -> String {
    let ext = dotted_extension(&sanitize_file_name(logical_name));
    let prefix = prefix.trim_matches('/');
    format!("{prefix}/{owner_id}/{owner_id}_{}{ext}", Uuid::new_v4().simple())
}

/// Local path relative to the storage root: `<owner>/<32 hex>_<sanitized>`.
pub fn local_path(owner_id: Uuid, logical_name: &str) -> String {
    format!(
        "{owner_id}/{}_{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(logical_name)
    )
}

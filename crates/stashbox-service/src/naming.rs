//! Name rules shared by folders and files.

use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;

/// Trim `raw` and check it is a usable folder or file name.
pub(crate) fn clean_name(raw: &str, max_length: usize, what: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation(format!("{what} name is required")));
    }
    if name.chars().count() > max_length {
        return Err(AppError::validation(format!(
            "{what} name must be at most {max_length} characters"
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(AppError::validation(format!(
            "{what} name cannot contain path separators"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation(format!("'{name}' is not a valid {what} name")));
    }
    Ok(name.to_string())
}

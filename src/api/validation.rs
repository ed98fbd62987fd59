use super::ApiError;
use crate::constants::files::INVALID_NAME_CHARS;

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

/// IMDb ids look like `tt0133093`.
pub fn validate_imdb_id(id: &str) -> Result<&str, ApiError> {
    let trimmed = id.trim();
    let digits = trimmed.strip_prefix("tt").unwrap_or("");
    if digits.len() < 7 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(format!(
            "Invalid IMDb id: {trimmed:?}. Expected something like tt0133093"
        )));
    }
    Ok(trimmed)
}

pub fn validate_path(path: &str) -> Result<&str, ApiError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Path cannot be empty"));
    }
    if trimmed.contains('\0') {
        return Err(ApiError::validation("Path contains a null byte"));
    }
    Ok(trimmed)
}

pub fn validate_new_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("New name cannot be empty"));
    }
    if trimmed.len() > 255 {
        return Err(ApiError::validation("New name must be 255 characters or less"));
    }
    if trimmed.contains(INVALID_NAME_CHARS) {
        return Err(ApiError::validation(format!(
            "New name contains invalid characters: {trimmed:?}"
        )));
    }
    Ok(trimmed)
}

pub fn validate_max_age_hours(hours: u64) -> Result<u64, ApiError> {
    const MAX_HOURS: u64 = 24 * 365;

    if !(1..=MAX_HOURS).contains(&hours) {
        return Err(ApiError::validation(format!(
            "Invalid max_age_hours: {hours}. Must be between 1 and {MAX_HOURS}"
        )));
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("Inception").is_ok());
        assert_eq!(validate_search_query("  trimmed  ").unwrap(), "trimmed");
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query("   ").is_err());
    }

    #[test]
    fn test_validate_imdb_id() {
        assert!(validate_imdb_id("tt1375666").is_ok());
        assert!(validate_imdb_id("tt10872600").is_ok());
        assert!(validate_imdb_id("1375666").is_err());
        assert!(validate_imdb_id("tt12").is_err());
        assert!(validate_imdb_id("ttabcdefg").is_err());
    }

    #[test]
    fn test_validate_new_name() {
        assert!(validate_new_name("Inception (2010)").is_ok());
        assert!(validate_new_name("a/b").is_err());
        assert!(validate_new_name("what?").is_err());
        assert!(validate_new_name(" ").is_err());
        assert!(validate_new_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_max_age_hours() {
        assert!(validate_max_age_hours(24).is_ok());
        assert!(validate_max_age_hours(0).is_err());
        assert!(validate_max_age_hours(100_000).is_err());
    }
}

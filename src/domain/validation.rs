//! Input rules applied before anything reaches the store.

use crate::domain::error::DomainError;

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 20_000;
pub const REVIEW_MAX_CHARS: usize = 4_000;
pub const MESSAGE_MAX_CHARS: usize = 2_000;
pub const MAX_TAGS: usize = 10;
pub const TAG_MAX_CHARS: usize = 32;

/// Trim and require `1..=max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Lowercase, dedupe and bound the tag list, preserving first occurrence order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, DomainError> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || normalized.contains(&tag) {
            continue;
        }
        if tag.chars().count() > TAG_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "tag `{tag}` exceeds {TAG_MAX_CHARS} characters"
            )));
        }
        normalized.push(tag);
    }
    if normalized.len() > MAX_TAGS {
        return Err(DomainError::validation(format!(
            "at most {MAX_TAGS} tags are allowed"
        )));
    }
    Ok(normalized)
}

pub fn rating(value: u8) -> Result<u8, DomainError> {
    if (1..=5).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::validation("rating must be between 1 and 5"))
    }
}

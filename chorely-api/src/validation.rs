//! Field rules shared by request types
//!
//! Used through `#[validate(custom(function = "..."))]`.

use chorely_shared::models::comment::normalize_content;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidateEmail, ValidationError};

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\+]?[1-9][\d\s\-\(\)]{0,15}$").expect("phone validation pattern to compile")
});

static COLOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color validation pattern to compile"));

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Rejects strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "Must not be blank"));
    }
    Ok(())
}

/// Optional leading `+`, a non-zero first digit, then up to 15 digits, spaces,
/// dashes or parentheses. Blank input is accepted and later treated as "no phone".
pub fn valid_phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || PHONE_PATTERN.is_match(value) {
        return Ok(());
    }
    Err(error("phone", "Please enter a valid phone number"))
}

/// Email format check that accepts blank input (blank clears the field)
pub fn optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || value.validate_email() {
        return Ok(());
    }
    Err(error("email", "Please enter a valid email address"))
}

/// `#RRGGBB`
pub fn valid_color(value: &str) -> Result<(), ValidationError> {
    if COLOR_PATTERN.is_match(value.trim()) {
        return Ok(());
    }
    Err(error("color", "Color must be a hex value like #3B82F6"))
}

/// Comment text, judged on its trimmed form so it matches what gets stored
pub fn comment_content(value: &str) -> Result<(), ValidationError> {
    normalize_content(value).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("content");
        err.message = Some(e.to_string().into());
        err
    })
}

/// Trims a string and maps blank input to `None`
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Dishes").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(valid_phone("+1 (555) 123-4567").is_ok());
        assert!(valid_phone("0612345678").is_err());
        assert!(valid_phone("call me").is_err());
        assert!(valid_phone("  ").is_ok());
    }

    #[test]
    fn test_optional_email() {
        assert!(optional_email("sam@example.com").is_ok());
        assert!(optional_email(" ").is_ok());
        assert!(optional_email("sam@").is_err());
    }

    #[test]
    fn test_comment_content_uses_trimmed_length() {
        assert!(comment_content("   ").is_err());
        assert!(comment_content(&"a".repeat(2001)).is_err());

        let padded = format!("  {}  ", "a".repeat(2000));
        assert!(comment_content(&padded).is_ok());
    }

    #[test]
    fn test_color() {
        assert!(valid_color("#3B82F6").is_ok());
        assert!(valid_color("#ef4444").is_ok());
        assert!(valid_color("3B82F6").is_err());
        assert!(valid_color("#3B82F").is_err());
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("  Attic ".to_string())), Some("Attic".to_string()));
        assert_eq!(blank_to_none(Some("   ".to_string())), None);
        assert_eq!(blank_to_none(None), None);
    }
}

//! Post Model
//!
//! The post record as published to readers, plus the content rules
//! enforced before a post is ever submitted to the ledger.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum post length in characters, after trimming
pub const MIN_CONTENT_CHARS: usize = 3;

/// Maximum post length in characters, after trimming
pub const MAX_CONTENT_CHARS: usize = 500;

/// A single post read back from a timeline's post table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Table key of the post (assigned by the contract, monotonically increasing)
    pub id: u64,
    /// Address of the account that submitted the post
    pub author: String,
    /// Post body
    pub content: String,
    /// Milliseconds since epoch, taken from the ledger clock at submission
    pub timestamp: u64,
}

impl Post {
    /// Shortened author address for display, e.g. `0x1234...abcd`
    pub fn short_author(&self) -> String {
        truncate_address(&self.author)
    }
}

/// Shorten an address to its first 6 and last 4 characters
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Content validation failures, raised before any ledger call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Content cannot be empty")]
    Empty,

    #[error("Post must be at least {MIN_CONTENT_CHARS} characters")]
    TooShort,

    #[error("Post content must be {MAX_CONTENT_CHARS} characters or less")]
    TooLong,
}

/// Validate raw post content and return the trimmed text to submit
pub fn validate_content(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();

    if len == 0 {
        return Err(ValidationError::Empty);
    }
    if len < MIN_CONTENT_CHARS {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_CONTENT_CHARS {
        return Err(ValidationError::TooLong);
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims() {
        assert_eq!(validate_content("  hello world \n").unwrap(), "hello world");
    }

    #[test]
    fn test_validate_empty_and_whitespace() {
        assert_eq!(validate_content(""), Err(ValidationError::Empty));
        assert_eq!(validate_content("   \t\n"), Err(ValidationError::Empty));
    }

    #[test]
    fn test_validate_length_bounds() {
        assert_eq!(validate_content("ab"), Err(ValidationError::TooShort));
        assert!(validate_content("abc").is_ok());

        let max = "x".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&max).is_ok());

        let over = "x".repeat(MAX_CONTENT_CHARS + 1);
        assert_eq!(validate_content(&over), Err(ValidationError::TooLong));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        // 500 two-byte characters is still within the limit
        let accented = "é".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&accented).is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ValidationError::Empty.to_string(), "Content cannot be empty");
        assert_eq!(
            ValidationError::TooShort.to_string(),
            "Post must be at least 3 characters"
        );
        assert_eq!(
            ValidationError::TooLong.to_string(),
            "Post content must be 500 characters or less"
        );
    }

    #[test]
    fn test_truncate_address() {
        let addr = "0x1234567890abcdef1234567890abcdef";
        assert_eq!(truncate_address(addr), "0x1234...cdef");
        assert_eq!(truncate_address("0xA"), "0xA");
        assert_eq!(truncate_address(""), "");
    }
}

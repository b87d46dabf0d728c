/**
 * Input Validation
 *
 * Pure normalization and validation helpers for everything a client can
 * submit: emails, passwords, display names, post bodies, tags and comments.
 * Each function returns the cleaned value so callers never persist raw
 * input.
 */

use serde::Deserialize;

use crate::shared::error::SharedError;

/// Inclusive password length bounds, in characters
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 32;

pub const TITLE_MAX_LEN: usize = 200;
pub const CONTENT_MAX_LEN: usize = 10_000;
pub const COMMENT_MAX_LEN: usize = 1_000;
pub const TAG_MAX_LEN: usize = 50;
pub const MAX_TAGS: usize = 10;

/// Lower-cased, trimmed email used as the account uniqueness key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address and return its normalized form
///
/// Accepts `local@domain.tld` where no part is empty and no part contains
/// whitespace.
pub fn validate_email(email: &str) -> Result<String, SharedError> {
    let normalized = normalize_email(email);
    let invalid = || SharedError::validation("email", "Email is invalid");

    if normalized.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = normalized.rsplit_once('@').ok_or_else(invalid)?;
    if local.is_empty() {
        return Err(invalid());
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(normalized),
        _ => Err(invalid()),
    }
}

/// Validate password length (characters, not bytes)
pub fn validate_password(password: &str) -> Result<(), SharedError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(SharedError::validation(
            "password",
            format!("Password must have at least {} characters", PASSWORD_MIN_LEN),
        ));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(SharedError::validation(
            "password",
            format!("Password cannot have more than {} characters", PASSWORD_MAX_LEN),
        ));
    }
    Ok(())
}

/// Trim a display name, rejecting blank input
pub fn validate_name(name: &str) -> Result<String, SharedError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SharedError::validation("name", "User name is required"));
    }
    Ok(name.to_string())
}

/// Title and content of a post after trimming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}

/// Validate and trim a post's title and content
pub fn validate_post_input(title: &str, content: &str) -> Result<PostInput, SharedError> {
    let title = title.trim();
    let content = content.trim();

    if title.is_empty() {
        return Err(SharedError::validation("title", "Title is required"));
    }
    if content.is_empty() {
        return Err(SharedError::validation("content", "Content is required"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(SharedError::validation(
            "title",
            format!("Title must be less than {} characters", TITLE_MAX_LEN),
        ));
    }
    if content.chars().count() > CONTENT_MAX_LEN {
        return Err(SharedError::validation(
            "content",
            format!("Content must be less than {} characters", CONTENT_MAX_LEN),
        ));
    }

    Ok(PostInput {
        title: title.to_string(),
        content: content.to_string(),
    })
}

/// Tags as clients send them: one string or a list
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TagsInput {
    One(String),
    Many(Vec<String>),
}

/// Normalize tags: trim, lower-case, drop empty or over-long entries
///
/// A single string is taken as one tag. More than [`MAX_TAGS`] surviving
/// tags is an error.
pub fn normalize_tags(tags: Option<TagsInput>) -> Result<Vec<String>, SharedError> {
    let tags: Vec<String> = match tags {
        None => Vec::new(),
        Some(TagsInput::One(tag)) => {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() { Vec::new() } else { vec![tag] }
        }
        Some(TagsInput::Many(tags)) => tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty() && tag.chars().count() <= TAG_MAX_LEN)
            .map(str::to_lowercase)
            .collect(),
    };

    if tags.len() > MAX_TAGS {
        return Err(SharedError::validation(
            "tags",
            format!("Maximum {} tags allowed", MAX_TAGS),
        ));
    }
    Ok(tags)
}

/// Validate and trim comment text
pub fn validate_comment(text: &str) -> Result<String, SharedError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SharedError::validation("text", "Comment text is required"));
    }
    if text.chars().count() > COMMENT_MAX_LEN {
        return Err(SharedError::validation(
            "text",
            format!("Comment must be less than {} characters", COMMENT_MAX_LEN),
        ));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.com "), "alice@x.com");
    }

    #[test]
    fn test_validate_email_accepts_and_normalizes() {
        assert_eq!(validate_email(" Bob@Example.ORG").unwrap(), "bob@example.org");
    }

    #[test]
    fn test_validate_email_rejects_malformed() {
        for email in ["", "alice", "alice@", "@x.com", "alice@x", "alice@.com", "alice@x.", "a b@x.com"] {
            assert!(validate_email(email).is_err(), "accepted {email:?}");
        }
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(32)).is_ok());
        assert!(validate_password(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_validate_post_input_trims() {
        let input = validate_post_input("  Hello ", "\n body \n").unwrap();
        assert_eq!(input.title, "Hello");
        assert_eq!(input.content, "body");
    }

    #[test]
    fn test_validate_post_input_limits() {
        assert_eq!(validate_post_input(" ", "body").unwrap_err().field(), "title");
        assert_eq!(validate_post_input("title", "").unwrap_err().field(), "content");
        assert!(validate_post_input(&"t".repeat(201), "body").is_err());
        assert!(validate_post_input("title", &"c".repeat(10_001)).is_err());
    }

    #[test]
    fn test_normalize_tags_from_list() {
        let tags = TagsInput::Many(vec![
            " Rust ".to_string(),
            "".to_string(),
            "x".repeat(51),
            "WEB".to_string(),
        ]);
        assert_eq!(normalize_tags(Some(tags)).unwrap(), vec!["rust", "web"]);
    }

    #[test]
    fn test_normalize_tags_single_string() {
        let tags = TagsInput::One(" Travel ".to_string());
        assert_eq!(normalize_tags(Some(tags)).unwrap(), vec!["travel"]);
        assert!(normalize_tags(None).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_tags_too_many() {
        let tags = TagsInput::Many((0..11).map(|i| format!("tag{i}")).collect());
        assert!(normalize_tags(Some(tags)).is_err());
    }

    #[test]
    fn test_tags_input_deserializes_both_shapes() {
        let one: TagsInput = serde_json::from_str("\"rust\"").unwrap();
        let many: TagsInput = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(one, TagsInput::One("rust".to_string()));
        assert_eq!(many, TagsInput::Many(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_validate_comment() {
        assert_eq!(validate_comment("  nice post ").unwrap(), "nice post");
        assert!(validate_comment("  ").is_err());
        assert!(validate_comment(&"c".repeat(1001)).is_err());
    }
}

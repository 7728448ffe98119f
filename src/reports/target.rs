//! Validation of report targets.
//!
//! A target is either a public username (`@name`) or a `t.me` link,
//! including private invite links (`https://t.me/+hash`).

/// Minimum length of a Telegram username, without the `@`.
pub const MIN_USERNAME_LENGTH: usize = 5;

/// Maximum length of a Telegram username, without the `@`.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Checks whether the text is a username or Telegram link that can be reported.
///
/// The text is expected to be trimmed already.
#[must_use]
pub fn is_valid_target(target: &str) -> bool {
    if let Some(username) = target.strip_prefix('@') {
        let len = username.chars().count();
        return (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len)
            && username.chars().all(is_word_char);
    }

    let Some(path) = strip_link_prefix(target) else {
        return false;
    };

    // Private invite: `+` followed by the hash, no trailing slash
    if let Some(hash) = path.strip_prefix('+')
        && !hash.is_empty()
        && hash.chars().all(is_word_char)
    {
        return true;
    }

    let name = path.strip_suffix('/').unwrap_or(path);
    !name.is_empty() && name.chars().all(|c| is_word_char(c) || c == '+')
}

/// Strips `http://t.me/` or `https://t.me/` from the link.
fn strip_link_prefix(link: &str) -> Option<&str> {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))?;
    rest.strip_prefix("t.me/")
}

/// Letters, digits and underscore (Unicode aware).
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(is_valid_target("@username"));
        assert!(is_valid_target("@user_name_123"));
        assert!(is_valid_target("@abcde"));
        assert!(is_valid_target(&format!("@{}", "a".repeat(32))));
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(!is_valid_target("@abcd"));
        assert!(!is_valid_target(&format!("@{}", "a".repeat(33))));
        assert!(!is_valid_target("@user-name"));
        assert!(!is_valid_target("@user name"));
        assert!(!is_valid_target("username"));
        assert!(!is_valid_target("@"));
    }

    #[test]
    fn test_valid_links() {
        assert!(is_valid_target("https://t.me/username"));
        assert!(is_valid_target("http://t.me/username/"));
        assert!(is_valid_target("https://t.me/+abc123"));
        assert!(is_valid_target("https://t.me/joinchat+x"));
    }

    #[test]
    fn test_invalid_links() {
        assert!(!is_valid_target("https://t.me/"));
        assert!(!is_valid_target("https://t.me/user/123"));
        assert!(!is_valid_target("https://telegram.me/username"));
        assert!(!is_valid_target("ftp://t.me/username"));
        assert!(!is_valid_target("https://t.me/user?start=1"));
        assert!(!is_valid_target("t.me/username"));
    }
}

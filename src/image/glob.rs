//! Glob matching for image name parts.

/// Matches `text` against a glob `pattern`.
///
/// `*` matches any run of characters (including none) and `?` matches exactly
/// one character. Everything else matches literally.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star_pi = None;
    let mut star_ti = 0;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(sp) = star_pi {
            // Let the last star swallow one more character.
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        assert!(glob_match("nginx", "nginx"));
        assert!(!glob_match("nginx", "nginx2"));
        assert!(!glob_match("nginx", ""));
        assert!(glob_match("", ""));
    }

    #[test]
    fn test_star() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("nginx*", "nginx-alpine"));
        assert!(glob_match("*alpine", "nginx-alpine"));
        assert!(glob_match("repo.io/*", "repo.io/account/bucket"));
        assert!(glob_match("*.io/*/bucket", "repo.io/account/bucket"));
        assert!(!glob_match("nginx*", "httpd"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("v1.?", "v1.2"));
        assert!(!glob_match("v1.?", "v1.23"));
    }
}

//! Glob-style key patterns as understood by `SCAN ... MATCH`.

use regex::Regex;

/// Escapes glob metacharacters so `text` matches only itself.
pub fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the pattern that lists every key under a namespace prefix.
pub fn prefix_pattern(prefix: &str) -> String {
    format!("{}*", escape_glob(prefix))
}

/// Compiles a glob pattern into an anchored regex.
///
/// Supports `*`, `?`, `[...]` classes (with `^` negation and ranges) and
/// backslash escapes. An unclosed `[` matches a literal bracket.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                out.push_str(&regex::escape(&chars[i].to_string()));
            }
            '[' => match chars[i + 1..].iter().position(|&c| c == ']') {
                Some(len) => {
                    let class: String = chars[i + 1..i + 1 + len].iter().collect();
                    out.push('[');
                    match class.strip_prefix('^') {
                        Some(rest) => {
                            out.push('^');
                            out.push_str(&escape_class(rest));
                        }
                        None => out.push_str(&escape_class(&class)),
                    }
                    out.push(']');
                    i += len + 1;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    Regex::new(&out)
}

/// Escapes characters that are special inside a regex class, keeping `-` ranges.
fn escape_class(class: &str) -> String {
    class
        .chars()
        .map(|c| match c {
            '\\' | '[' | ']' | '^' | '&' | '~' => format!("\\{c}"),
            c => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, key: &str) -> bool {
        glob_to_regex(pattern).unwrap().is_match(key)
    }

    #[test]
    fn test_star_and_question() {
        assert!(matches("*", "anything:at:all"));
        assert!(matches("user:*", "user:1"));
        assert!(!matches("user:*", "session:1"));
        assert!(matches("h?llo", "hello"));
        assert!(!matches("h?llo", "heello"));
    }

    #[test]
    fn test_classes() {
        assert!(matches("h[ae]llo", "hallo"));
        assert!(!matches("h[ae]llo", "hillo"));
        assert!(matches("h[^e]llo", "hallo"));
        assert!(!matches("h[^e]llo", "hello"));
        assert!(matches("key[0-9]", "key7"));
    }

    #[test]
    fn test_regex_metachars_are_literal() {
        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "axb"));
        assert!(matches("(x)+", "(x)+"));
    }

    #[test]
    fn test_escape_glob_round_trip() {
        let prefix = "weird*[key]?:";
        let pattern = prefix_pattern(prefix);
        assert_eq!(pattern, r"weird\*\[key\]\?:*");
        assert!(matches(&pattern, "weird*[key]?:child"));
        assert!(!matches(&pattern, "weirdXkey]?:child"));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        assert!(matches("a[b", "a[b"));
    }
}

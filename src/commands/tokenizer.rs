//! Tokenizer for command lines.
//!
//! Splits a raw command line into the positional arguments sent to the
//! server, with shell-like handling of:
//! - Single and double quoted regions
//! - Backslash escapes (inside or outside quotes)
//! - Tokens built from several adjacent segments (`key"value"` → `keyvalue`)
//!
//! Malformed input is never an error. An unterminated quote or a trailing
//! backslash simply ends the scan, and whatever was accumulated is kept.

/// Tokenizes a command line into an argument vector.
///
/// Handles:
/// - Space-separated tokens: `GET mykey` → `["GET", "mykey"]`
/// - Double quotes: `SET k "hello world"` → `["SET", "k", "hello world"]`
/// - Single quotes: `SET k 'hello world'` → `["SET", "k", "hello world"]`
/// - Escapes: `SET k hello\ world` → `["SET", "k", "hello world"]`
/// - Explicit empty strings: `SET k ""` → `["SET", "k", ""]`
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Set once a quote pair closes, so `""` still produces a token.
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '"' | '\'' if quote.is_none() => quote = Some(c),
            c if quote == Some(c) => {
                quote = None;
                quoted = true;
            }
            ' ' if quote.is_none() => {
                flush(&mut tokens, &mut current, &mut quoted);
            }
            c => current.push(c),
        }
    }

    flush(&mut tokens, &mut current, &mut quoted);
    tokens
}

/// Pushes the accumulated token, if there is one, and resets the buffer.
fn flush(tokens: &mut Vec<String>, current: &mut String, quoted: &mut bool) {
    if !current.is_empty() || *quoted {
        tokens.push(std::mem::take(current));
    }
    *quoted = false;
}

/// Splits a tokenized line into an upper-cased command name and its arguments.
///
/// Returns `None` for an empty argument vector.
pub fn split_command(tokens: &[String]) -> Option<(String, &[String])> {
    let (name, args) = tokens.split_first()?;
    Some((name.to_uppercase(), args))
}

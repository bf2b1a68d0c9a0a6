pub fn is_valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}

/// `NAME=value` where NAME is a valid variable name; the value may be empty.
pub fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => is_valid_var_name(name),
        None => false,
    }
}

/// Text after the final `/`, or the whole token.
pub fn base_name(token: &str) -> &str {
    match token.rsplit_once('/') {
        Some((_, base)) => base,
        None => token,
    }
}

/// Quote a word so `sh` passes it through as a single literal argument.
pub fn shell_quote(token: &str) -> String {
    if token.is_empty() || token.chars().any(needs_quotes) {
        single_quote(token)
    } else {
        token.to_string()
    }
}

/// Quote a word only when it would otherwise re-split or lose characters.
///
/// Unlike `shell_quote` this leaves `$`, redirections and globs alone so the rendered
/// command keeps its shell meaning when replayed.
pub fn quote_word(token: &str) -> String {
    if token.is_empty() || token.chars().any(breaks_word) {
        single_quote(token)
    } else {
        token.to_string()
    }
}

fn single_quote(token: &str) -> String {
    let mut out = String::from("'");
    for ch in token.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

fn breaks_word(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '\'' | '"' | '\\' | ';' | '&' | '|')
}

fn needs_quotes(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '\'' | '"'
                | '\\'
                | '$'
                | '`'
                | '#'
                | '|'
                | '&'
                | ';'
                | '<'
                | '>'
                | '('
                | ')'
                | '{'
                | '}'
                | '*'
                | '?'
                | '['
                | ']'
                | '~'
        )
}

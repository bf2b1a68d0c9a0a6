use log::debug;

use crate::parse::{join_raw, tokenize, Token, MAX_WRAPPER_DEPTH, NO_OP_COMMANDS};
use crate::utils::base_name;

/// Find the token naming the program a statement really runs.
///
/// Leading `NAME=value` words are skipped and `bash`/`sh` wrappers are unwrapped.
/// Returns `None` for pure assignments, empty wrappers and no-op programs.
pub fn real_command(tokens: &[Token]) -> Option<String> {
    resolve_at_depth(tokens, 0)
}

/// Display name of a program token: the text after the final `/`.
pub fn command_display_name(token: &str) -> &str {
    base_name(token)
}

fn resolve_at_depth(tokens: &[Token], depth: usize) -> Option<String> {
    let rest = strip_leading_env(tokens);
    let first = rest.first()?;

    if first.is_shell_wrapper() {
        if depth >= MAX_WRAPPER_DEPTH {
            debug!("resolve event=depth-limit depth={depth}");
            return None;
        }
        let inner = unwrap_shell(rest)?;
        let inner_tokens = match tokenize(&inner) {
            Ok(tokens) => tokens,
            Err(err) => {
                debug!("resolve event=tokenize-failed err={}", err.display_simple());
                return None;
            }
        };
        return resolve_at_depth(&inner_tokens, depth + 1);
    }

    if NO_OP_COMMANDS
        .iter()
        .any(|name| first.as_str().eq_ignore_ascii_case(name))
    {
        return None;
    }

    Some(first.as_str().to_string())
}

pub(crate) fn strip_leading_env(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|token| !token.is_env_assignment())
        .unwrap_or(tokens.len());
    &tokens[start..]
}

/// Drop the wrapper program and its flags, returning the inner command line.
pub(crate) fn unwrap_shell(tokens: &[Token]) -> Option<String> {
    let body = tokens.get(1..)?;
    let start = body
        .iter()
        .position(|token| !token.as_str().starts_with('-'))
        .unwrap_or(body.len());
    // A single payload word is the script itself; several unquoted words are the
    // script as written.
    let inner = match &body[start..] {
        [only] => only.as_str().to_string(),
        words => join_raw(words),
    };
    let inner = inner.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(line: &str) -> Option<String> {
        real_command(&tokenize(line).unwrap())
    }

    #[test]
    fn direct_command() {
        assert_eq!(resolve("/path/to/c2abc arg1").as_deref(), Some("/path/to/c2abc"));
        assert_eq!(command_display_name("/path/to/c2abc"), "c2abc");
    }

    #[test]
    fn env_prefix_is_skipped() {
        assert_eq!(resolve("A=1 B=2 /bin/tool -x").as_deref(), Some("/bin/tool"));
        assert_eq!(resolve("VAR=value"), None);
    }

    #[test]
    fn wrappers_are_unwrapped() {
        assert_eq!(
            resolve("bash -ce /media/bin/ark_aot --flag; /media/bin/ark --run").as_deref(),
            Some("/media/bin/ark_aot")
        );
        assert_eq!(resolve("sh -c \"/media/bin/ark --arg\"").as_deref(), Some("/media/bin/ark"));
        assert_eq!(
            resolve("X=1 /bin/bash -e -c 'sh -c \"Y=2 /opt/tool\"'").as_deref(),
            Some("/opt/tool")
        );
    }

    #[test]
    fn empty_wrapper_has_no_command() {
        assert_eq!(resolve("bash"), None);
        assert_eq!(resolve("sh -c -e"), None);
    }

    #[test]
    fn echo_is_a_no_op() {
        assert_eq!(resolve("echo Exit code: $?"), None);
        assert_eq!(resolve("ECHO hi"), None);
        assert_eq!(resolve("bash -c 'echo hi; /bin/x'"), None);
    }

    #[test]
    fn broken_inner_quoting_resolves_to_nothing() {
        assert_eq!(resolve("sh -c \"tool 'oops\""), None);
    }

    #[test]
    fn unwrap_shell_keeps_operators() {
        let tokens = tokenize("bash -ce a --flag; b").unwrap();
        assert_eq!(unwrap_shell(&tokens).as_deref(), Some("a --flag ; b"));
    }
}

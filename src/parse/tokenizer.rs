//! Tokenizer for recorded command lines.
//!
//! Uses Normal/Single/Double modes to follow POSIX quoting while emitting a flat
//! token stream for the command parser. Runs of `;`, `&`, `|` outside quotes become
//! operator tokens; `#` is an ordinary character. Words that used quotes or
//! backslashes keep their source text so they can be rendered back unchanged.
use crate::error::{ErrorKind, ReplayError};
use crate::parse::Token;

#[derive(Copy, Clone, Eq, PartialEq)]
enum ParseMode {
    Normal,
    Single,
    Double,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ReplayError> {
    let mut tokens = Vec::new();
    let mut word = WordBuf::default();
    let mut chars = input.chars().enumerate().peekable();
    let mut mode = ParseMode::Normal;
    let mut quote_start = 0usize;

    while let Some((pos, ch)) = chars.next() {
        match mode {
            ParseMode::Normal => match ch {
                ';' | '&' | '|' => {
                    word.flush(&mut tokens);
                    let mut op = String::from(ch);
                    while let Some(&(_, next)) = chars.peek() {
                        if !is_punctuation(next) {
                            break;
                        }
                        op.push(next);
                        chars.next();
                    }
                    tokens.push(Token::Op(op));
                }
                '\\' => match chars.next() {
                    Some((_, next)) => {
                        word.quoted_char(ch);
                        word.push(next);
                    }
                    None => {
                        return Err(ReplayError::new(ErrorKind::Tokenize, "No escaped character")
                            .with_context("A trailing backslash must escape something")
                            .with_position(pos));
                    }
                },
                '\'' => {
                    word.quoted_char(ch);
                    quote_start = pos;
                    mode = ParseMode::Single;
                }
                '"' => {
                    word.quoted_char(ch);
                    quote_start = pos;
                    mode = ParseMode::Double;
                }
                _ if ch.is_whitespace() => word.flush(&mut tokens),
                _ => word.push(ch),
            },
            ParseMode::Single => {
                if ch == '\'' {
                    word.raw.push(ch);
                    mode = ParseMode::Normal;
                } else {
                    word.push(ch);
                }
            }
            ParseMode::Double => match ch {
                '"' => {
                    word.raw.push(ch);
                    mode = ParseMode::Normal;
                }
                '\\' => match chars.peek() {
                    Some(&(_, next)) if matches!(next, '\\' | '"' | '$' | '`' | '\n') => {
                        chars.next();
                        word.raw.push(ch);
                        word.push(next);
                    }
                    _ => word.push(ch),
                },
                _ => word.push(ch),
            },
        }
    }

    if mode != ParseMode::Normal {
        let quote_char = match mode {
            ParseMode::Single => "'",
            ParseMode::Double => "\"",
            ParseMode::Normal => unreachable!(),
        };
        return Err(ReplayError::new(
            ErrorKind::Tokenize,
            format!("Unterminated {} quote", quote_char),
        )
        .with_context("No closing quotation before end of line")
        .with_position(quote_start));
    }

    word.flush(&mut tokens);
    Ok(tokens)
}

/// The word being built: its unquoted text and the source text it came from.
#[derive(Default)]
struct WordBuf {
    text: String,
    raw: String,
    started: bool,
    quoted: bool,
}

impl WordBuf {
    fn push(&mut self, ch: char) {
        self.started = true;
        self.text.push(ch);
        self.raw.push(ch);
    }

    /// A quote or backslash that is part of the source but not of the text.
    fn quoted_char(&mut self, raw: char) {
        self.started = true;
        self.quoted = true;
        self.raw.push(raw);
    }

    fn flush(&mut self, tokens: &mut Vec<Token>) {
        if !self.started {
            return;
        }
        let WordBuf { text, raw, quoted, .. } = std::mem::take(self);
        tokens.push(if quoted {
            Token::Quoted { text, raw }
        } else {
            Token::Word(text)
        });
    }
}

fn is_punctuation(ch: char) -> bool {
    matches!(ch, ';' | '&' | '|')
}

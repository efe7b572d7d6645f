// Shell-style argument splitting
//
// POSIX word splitting without expansion: whitespace separates words, single
// quotes are literal, double quotes honour `\"` and `\\`, and a backslash
// outside quotes escapes the next character. `#` has no special meaning.

use thiserror::Error;

/// Malformed argument string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("No closing quotation")]
    UnclosedQuote,

    #[error("No escaped character")]
    TrailingEscape,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Whitespace,
    Word,
    Single,
    Double,
}

/// Split an argument string into words
pub fn split(input: &str) -> Result<Vec<String>, SplitError> {
    let mut words = Vec::new();
    // `Some` once a word has started, even if it is an empty quoted string
    let mut current: Option<String> = None;
    let mut state = State::Whitespace;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Whitespace | State::Word => match c {
                c if c.is_whitespace() => {
                    if let Some(word) = current.take() {
                        words.push(word);
                    }
                    state = State::Whitespace;
                }
                '\'' => {
                    current.get_or_insert_with(String::new);
                    state = State::Single;
                }
                '"' => {
                    current.get_or_insert_with(String::new);
                    state = State::Double;
                }
                '\\' => {
                    let escaped = chars.next().ok_or(SplitError::TrailingEscape)?;
                    current.get_or_insert_with(String::new).push(escaped);
                    state = State::Word;
                }
                c => {
                    current.get_or_insert_with(String::new).push(c);
                    state = State::Word;
                }
            },
            State::Single => match c {
                '\'' => state = State::Word,
                c => current.get_or_insert_with(String::new).push(c),
            },
            State::Double => match c {
                '"' => state = State::Word,
                '\\' => {
                    let word = current.get_or_insert_with(String::new);
                    match chars.next() {
                        Some(next @ ('"' | '\\')) => word.push(next),
                        Some(next) => {
                            word.push('\\');
                            word.push(next);
                        }
                        None => return Err(SplitError::UnclosedQuote),
                    }
                }
                c => current.get_or_insert_with(String::new).push(c),
            },
        }
    }

    if matches!(state, State::Single | State::Double) {
        return Err(SplitError::UnclosedQuote);
    }
    if let Some(word) = current {
        words.push(word);
    }

    Ok(words)
}

/// Join words into a string that [`split`] turns back into the same words
pub fn join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| quote(word.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if plain {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r#"'"'"'"#))
}

/// Whether a token is flag-shaped
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

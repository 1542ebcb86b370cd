//! Splitting an input line into words.
//!
//! Words are separated by spaces, tabs and newlines. There is no quoting and no
//! escaping: operators must be written as separate words (`ls | wc`, not `ls|wc`).

use crate::command::TokenizedCommand;

const SEPARATORS: [char; 3] = [' ', '\t', '\n'];

/// Split `line` into words. Returns `None` when the line holds no word at all.
pub fn split_into_tokens(line: &str) -> Option<TokenizedCommand> {
    let words = line
        .split(SEPARATORS)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();
    TokenizedCommand::new(words)
}

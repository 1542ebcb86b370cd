use crate::command::TokenizedCommand;

/// Runs the command in the background: `cmd args... &`.
pub const BACKGROUND: &str = "&";
/// Connects two programs: `left... | right...`.
pub const PIPE: &str = "|";
/// Reads standard input from a file: `cmd args... < path`.
pub const REDIRECT_IN: &str = "<";
/// Writes standard output to a file, truncating it: `cmd args... > path`.
pub const REDIRECT_OUT: &str = ">";
/// Writes standard output to the end of a file: `cmd args... >> path`.
pub const REDIRECT_APPEND: &str = ">>";

/// How a command line is executed.
///
/// Computed once per command by [`classify`]. Indices point into the
/// [`TokenizedCommand`] the mode was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One program in the foreground; every word is part of its argument vector.
    Simple,
    /// One program, not waited for. The trailing `&` is not passed to it.
    Background,
    /// Two programs joined by a pipe. `split` is the index of the `|` token.
    Pipeline { split: usize },
    /// Standard input comes from the file named by the token at `target`.
    InputRedirect { target: usize },
    /// Standard output goes to the file named by the token at `target`.
    OutputRedirect { target: usize, append: bool },
}

/// Kind of redirection
///
/// Defines how the redirection target is opened in the child (`<`, `>`, `>>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): the file must exist and is opened read-only.
    Input,
    /// Output redirection (`>`): the file is created if missing and **truncated** if present.
    Output,
    /// Output redirection with append (`>>`): the file is created if missing and written at its end.
    Append,
}

/// A control token left one side of the command without a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsingError {
    /// `&` with nothing before it.
    #[error("syntax error: nothing to run before `&`")]
    EmptyBackground,
    /// `| cmd` or `cmd |`.
    #[error("syntax error: pipeline is missing a command on one side of `|`")]
    EmptyPipeline,
    /// `< file` or `> file` with no command in front.
    #[error("syntax error: nothing to run before `{0}`")]
    EmptyRedirect(String),
}

/// Decide how `command` is executed.
///
/// Control tokens are only recognized in a fixed position:
/// - `&` as the last word;
/// - `|` at the first occurrence, scanning left to right;
/// - `<`, `>` and `>>` as the second-to-last word, the last word being the file.
///
/// Rules are tried in that order; a word equal to an operator anywhere else is
/// passed to the program as an ordinary argument.
pub fn classify(command: &TokenizedCommand) -> Result<ExecutionMode, ParsingError> {
    let count = command.len();

    if command.last() == BACKGROUND {
        if count < 2 {
            return Err(ParsingError::EmptyBackground);
        }
        return Ok(ExecutionMode::Background);
    }

    if let Some(split) = command.tokens().iter().position(|t| t == PIPE) {
        if split == 0 || split == count - 1 {
            return Err(ParsingError::EmptyPipeline);
        }
        return Ok(ExecutionMode::Pipeline { split });
    }

    if count >= 2 {
        let operator = count - 2;
        let target = count - 1;
        let mode = match command.get(operator) {
            Some(REDIRECT_IN) => Some(ExecutionMode::InputRedirect { target }),
            Some(REDIRECT_OUT) => Some(ExecutionMode::OutputRedirect {
                target,
                append: false,
            }),
            Some(REDIRECT_APPEND) => Some(ExecutionMode::OutputRedirect {
                target,
                append: true,
            }),
            _ => None,
        };
        if let Some(mode) = mode {
            if operator == 0 {
                return Err(ParsingError::EmptyRedirect(
                    command.get(operator).unwrap_or_default().to_string(),
                ));
            }
            return Ok(mode);
        }
    }

    Ok(ExecutionMode::Simple)
}

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal map to `128 + signal`, as POSIX shells report them.
pub type ExitCode = i32;

/// What the read loop should do after a command was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read and dispatch the next line.
    Continue,
    /// Stop reading; the dispatcher could not set up the command at all.
    Stop,
}

/// The words of one input line, in order. Never empty.
///
/// Executors never modify the tokens. They take views instead: the words before a
/// control token become the argument vector of one program, the words after a `|`
/// become the argument vector of the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedCommand {
    tokens: Vec<String>,
}

impl TokenizedCommand {
    /// Wrap a list of words. Returns `None` for an empty list.
    pub fn new(tokens: Vec<String>) -> Option<Self> {
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    /// Convenience constructor from borrowed words.
    pub fn from_words(words: &[&str]) -> Option<Self> {
        Self::new(words.iter().map(|w| w.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn last(&self) -> &str {
        // non-empty by construction
        self.tokens.last().map(String::as_str).unwrap_or_default()
    }

    /// Words strictly before `index`, i.e. the argument vector left of a control token.
    pub fn before(&self, index: usize) -> &[String] {
        &self.tokens[..index.min(self.tokens.len())]
    }

    /// Words strictly after `index`, i.e. the argument vector right of a `|`.
    pub fn after(&self, index: usize) -> &[String] {
        let start = (index + 1).min(self.tokens.len());
        &self.tokens[start..]
    }
}

impl std::fmt::Display for TokenizedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

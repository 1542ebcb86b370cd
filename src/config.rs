use std::fmt;
use std::str::FromStr;

/// How terminated background children are reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaperPolicy {
    /// Set SIGCHLD to "ignore"; the kernel then reaps every child on its own.
    #[default]
    Ignore,
    /// Install a SIGCHLD handler that reaps whatever has terminated.
    Handler,
}

impl FromStr for ReaperPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(ReaperPolicy::Ignore),
            "handler" => Ok(ReaperPolicy::Handler),
            other => Err(format!(
                "unknown reaper policy `{other}`, expected `ignore` or `handler`"
            )),
        }
    }
}

impl fmt::Display for ReaperPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaperPolicy::Ignore => write!(f, "ignore"),
            ReaperPolicy::Handler => write!(f, "handler"),
        }
    }
}

/// Settings the dispatcher runs under.
///
/// Built once by the entry point and handed to both
/// [`SignalDisposition::install`](crate::signals::SignalDisposition::install) and the
/// [`Dispatcher`](crate::Dispatcher); nothing reads it from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix of every diagnostic the calling process prints.
    pub program_name: String,
    /// Prompt of the interactive loop.
    pub prompt: String,
    pub reaper: ReaperPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program_name: env!("CARGO_PKG_NAME").to_string(),
            prompt: "$ ".to_string(),
            reaper: ReaperPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaper_policy_parses() {
        assert_eq!("ignore".parse(), Ok(ReaperPolicy::Ignore));
        assert_eq!("handler".parse(), Ok(ReaperPolicy::Handler));
        assert!("reap".parse::<ReaperPolicy>().is_err());
    }

    #[test]
    fn test_reaper_policy_display_round_trips() {
        for policy in [ReaperPolicy::Ignore, ReaperPolicy::Handler] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.program_name, "shell_dispatch");
        assert_eq!(config.reaper, ReaperPolicy::Ignore);
        assert_eq!(config.prompt, "$ ");
    }
}

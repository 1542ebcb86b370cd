//! Errors reported by the calling process.
//!
//! Failures inside a child (signal reset, open, dup, exec) never show up here: the
//! child reports them on its own standard error and exits with status 1.

use crate::parser::ParsingError;
use nix::errno::Errno;
use nix::unistd::Pid;
use std::ffi::NulError;

/// The process could not be created.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("fork failed: {0}")]
    Fork(Errno),

    #[error("argument contains a NUL byte: {0}")]
    Nul(#[from] NulError),

    #[error("empty argument vector")]
    EmptyArgv,
}

/// Descriptor setup in the calling process failed before anything was spawned.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("cannot create pipe: {0}")]
    Pipe(Errno),
}

/// Waiting for a child failed with something other than `ECHILD` or `EINTR`.
#[derive(Debug, thiserror::Error)]
#[error("waiting for {program} (pid {pid}) failed: {errno}")]
pub struct WaitError {
    pub pid: Pid,
    pub program: String,
    pub errno: Errno,
}

/// Why a command could not be executed as requested.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    Parse(#[from] ParsingError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Wait(#[from] WaitError),
}

impl ExecError {
    /// Whether the read loop should stop after this error.
    ///
    /// Only setup failures qualify: they happen before any child exists and mean the
    /// calling process is out of descriptors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::Setup(_))
    }
}

/// Print a diagnostic for the user, prefixed with the program name.
pub(crate) fn report(program_name: &str, err: &dyn std::error::Error) {
    eprintln!("{}: {}", program_name, err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_setup_errors_are_fatal() {
        assert!(ExecError::from(SetupError::Pipe(Errno::EMFILE)).is_fatal());
        assert!(!ExecError::from(SpawnError::Fork(Errno::EAGAIN)).is_fatal());
        assert!(!ExecError::from(ParsingError::EmptyPipeline).is_fatal());
        let wait = WaitError {
            pid: Pid::from_raw(42),
            program: "ls".to_string(),
            errno: Errno::EINVAL,
        };
        assert!(!ExecError::from(wait).is_fatal());
    }

    #[test]
    fn test_wait_error_names_the_child() {
        let wait = WaitError {
            pid: Pid::from_raw(42),
            program: "ls".to_string(),
            errno: Errno::EINVAL,
        };
        let text = ExecError::from(wait).to_string();
        assert!(text.contains("ls"), "{text}");
        assert!(text.contains("42"), "{text}");
    }
}

//! One executor per [`ExecutionMode`].
//!
//! Each executor spawns its children through [`process::spawn`](crate::process::spawn)
//! and decides whether the caller blocks. Foreground executors return every child's
//! [`ChildExit`]; the background executor returns as soon as the child exists.

use crate::command::TokenizedCommand;
use crate::config::Config;
use crate::error::{ExecError, report};
use crate::parser::{ExecutionMode, RedirectKind};
use crate::process::{ChildExit, Pipe, SpawnConfig, StdioTarget, spawn};
use crate::signals;
use nix::unistd::Pid;

/// What happened to the children of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Foreground: every child was waited for, in spawn order.
    Waited(Vec<ChildExit>),
    /// Background: the child runs on; the SIGCHLD disposition reaps it.
    Detached(Pid),
}

/// Run `command` the way `mode` says.
pub fn execute(
    mode: ExecutionMode,
    command: &TokenizedCommand,
    config: &Config,
) -> Result<Outcome, ExecError> {
    match mode {
        ExecutionMode::Simple => run_simple(command),
        ExecutionMode::Background => run_background(command),
        ExecutionMode::Pipeline { split } => run_pipeline(command, split, config),
        ExecutionMode::InputRedirect { target } => {
            run_redirect(command, target, RedirectKind::Input)
        }
        ExecutionMode::OutputRedirect { target, append } => {
            let kind = if append {
                RedirectKind::Append
            } else {
                RedirectKind::Output
            };
            run_redirect(command, target, kind)
        }
    }
}

/// Every word is the argument vector; wait for the child.
pub fn run_simple(command: &TokenizedCommand) -> Result<Outcome, ExecError> {
    let child = spawn(&SpawnConfig::new(command.tokens())?)?;
    Ok(Outcome::Waited(vec![child.wait()?]))
}

/// Drop the trailing `&` and return without waiting.
///
/// The child keeps SIGINT ignored, so Ctrl-C meant for a foreground job leaves it alone.
pub fn run_background(command: &TokenizedCommand) -> Result<Outcome, ExecError> {
    let args = command.before(command.len() - 1);
    let config = SpawnConfig::new(args)?.reset_signals(signals::BACKGROUND_RESET);
    let child = spawn(&config)?;
    Ok(Outcome::Detached(child.detach()))
}

/// `producer... | consumer...`, with `split` the index of the `|`.
///
/// Both children are spawned before the orchestrator closes its pipe copies, and both
/// copies are closed before either child is waited for. A failed wait on one child does
/// not skip the wait on the other.
pub fn run_pipeline(
    command: &TokenizedCommand,
    split: usize,
    config: &Config,
) -> Result<Outcome, ExecError> {
    let producer = SpawnConfig::new(command.before(split))?;
    let consumer = SpawnConfig::new(command.after(split))?;

    let pipe = Pipe::new()?;
    let producer = producer
        .close_in_child(pipe.read_end())
        .stdout(StdioTarget::Fd(pipe.write_end()));
    let consumer = consumer
        .close_in_child(pipe.write_end())
        .stdin(StdioTarget::Fd(pipe.read_end()));

    let first = spawn(&producer)?;
    let second = match spawn(&consumer) {
        Ok(child) => child,
        Err(err) => {
            pipe.close();
            // the producer sees EPIPE or finishes on its own; don't leave it a zombie
            if let Err(wait_err) = first.wait() {
                report(&config.program_name, &wait_err);
            }
            return Err(err.into());
        }
    };
    pipe.close();

    match (first.wait(), second.wait()) {
        (Ok(first), Ok(second)) => Ok(Outcome::Waited(vec![first, second])),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err.into()),
        (Err(first), Err(second)) => {
            report(&config.program_name, &first);
            Err(second.into())
        }
    }
}

/// `cmd... < path`, `cmd... > path` or `cmd... >> path`, with `target` the index of
/// `path`. The file is opened by the child; if that fails, only the child fails.
pub fn run_redirect(
    command: &TokenizedCommand,
    target: usize,
    kind: RedirectKind,
) -> Result<Outcome, ExecError> {
    let operator = target - 1;
    let path = command.get(target).unwrap_or_default();
    let file = StdioTarget::file(path, kind)?;

    let config = SpawnConfig::new(command.before(operator))?;
    let config = match kind {
        RedirectKind::Input => config.stdin(file),
        RedirectKind::Output | RedirectKind::Append => config.stdout(file),
    };

    let child = spawn(&config)?;
    Ok(Outcome::Waited(vec![child.wait()?]))
}

//! A minimal command dispatcher for an interactive shell.
//!
//! Given the words of one command line, the [`Dispatcher`] decides how to run it
//! (a plain foreground program, a background program, a two-stage pipeline, or a
//! program with its input or output redirected to a file), spawns the children, wires
//! their standard streams and waits for the foreground ones.
//!
//! The entry point owns everything around it: reading lines, splitting them into words
//! ([`lexer`]), and installing the process-wide [`signals::SignalDisposition`] once,
//! before the first dispatch.

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod process;
pub mod signals;

/// Just a convenient re-export of the dispatcher and its input and output types.
///
/// See [`Dispatcher`] for the high-level API.
pub use command::{ExitCode, Flow, TokenizedCommand};
pub use config::{Config, ReaperPolicy};
pub use executor::Outcome;
pub use interpreter::Dispatcher;

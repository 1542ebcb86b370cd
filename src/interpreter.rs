use crate::command::{Flow, TokenizedCommand};
use crate::config::Config;
use crate::error::{ExecError, report};
use crate::executor::{self, Outcome};
use crate::parser;

/// Classifies tokenized command lines and runs them.
///
/// The dispatcher keeps no state between calls apart from its [`Config`]. Signal
/// dispositions are installed separately, once, by the entry point (see
/// [`SignalDisposition`](crate::signals::SignalDisposition)).
///
/// Example
/// ```no_run
/// use shell_dispatch::{Dispatcher, Flow, TokenizedCommand};
/// let sh = Dispatcher::default();
/// let line = TokenizedCommand::from_words(&["echo", "hi"]).unwrap();
/// assert_eq!(sh.dispatch(&line), Flow::Continue);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: Config,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classify `command`, execute it and report what happened to its children.
    pub fn run(&self, command: &TokenizedCommand) -> Result<Outcome, ExecError> {
        let mode = parser::classify(command)?;
        log::debug!("`{}` classified as {:?}", command, mode);
        executor::execute(mode, command, &self.config)
    }

    /// Run one command line and tell the read loop whether to go on.
    ///
    /// Errors are printed to standard error. Only failures that happen before any child
    /// exists and point at resource exhaustion (the pipe cannot be created) yield
    /// [`Flow::Stop`]; a child that fails to start or exits non-zero does not.
    pub fn dispatch(&self, command: &TokenizedCommand) -> Flow {
        match self.run(command) {
            Ok(outcome) => {
                log::debug!("`{}` finished: {:?}", command, outcome);
                Flow::Continue
            }
            Err(err) => {
                report(&self.config.program_name, &err);
                if err.is_fatal() {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
        }
    }
}

use anyhow::{Context, Result};
use argh::FromArgs;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use shell_dispatch::signals::SignalDisposition;
use shell_dispatch::{Config, Dispatcher, Flow, ReaperPolicy, lexer};

#[derive(FromArgs)]
/// Run external programs, with `|` pipelines, `<`, `>` and `>>` redirections and `&`
/// background jobs. Reads command lines interactively unless -c is given.
struct Args {
    #[argh(option, short = 'c')]
    /// run this single command line, then exit.
    command: Option<String>,

    #[argh(option, default = "ReaperPolicy::Ignore")]
    /// how finished background jobs are reaped: `ignore` (default) or `handler`.
    reaper: ReaperPolicy,

    #[argh(option, default = "String::from(\"$ \")")]
    /// prompt of the interactive loop.
    prompt: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();
    let config = Config {
        prompt: args.prompt,
        reaper: args.reaper,
        ..Config::default()
    };

    let disposition =
        SignalDisposition::install(config.reaper).context("can't install signal dispositions")?;
    let dispatcher = Dispatcher::new(config);

    let flow = match args.command {
        Some(line) => run_once(&dispatcher, &line),
        None => repl(&dispatcher)?,
    };

    disposition
        .restore()
        .context("can't restore signal dispositions")?;

    if flow == Flow::Stop {
        std::process::exit(1);
    }
    Ok(())
}

fn run_once(dispatcher: &Dispatcher, line: &str) -> Flow {
    match lexer::split_into_tokens(line) {
        Some(command) => dispatcher.dispatch(&command),
        None => Flow::Continue,
    }
}

/// Read-eval loop. Ends on end-of-input, or with [`Flow::Stop`] when a command could
/// not be set up.
fn repl(dispatcher: &Dispatcher) -> Result<Flow> {
    let mut rl = DefaultEditor::new().context("can't initialize line editor")?;
    let prompt = dispatcher.config().prompt.clone();

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let Some(command) = lexer::split_into_tokens(&line) else {
                    continue;
                };
                rl.add_history_entry(line.as_str())?;
                if dispatcher.dispatch(&command) == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => return Ok(Flow::Continue),
            Err(err) => return Err(err).context("can't read command line"),
        }
    }
}

//! A pipe end that lands on descriptor 0 still reaches the consumer.
//!
//! Closes this process's standard input, so it runs as its own test binary.
#![cfg(target_os = "linux")]

use nix::fcntl::{OFlag, open};
use nix::sys::stat::Mode;
use nix::unistd::close;
use shell_dispatch::process::ChildExit;
use shell_dispatch::{Dispatcher, Outcome, TokenizedCommand};
use std::fs;

#[test]
fn test_pipeline_with_stdin_closed() {
    let out = std::env::temp_dir().join(format!("closed_stdin_{}", std::process::id()));
    let sink = format!("cat > {}", out.display());
    let line = TokenizedCommand::from_words(&["printf", "through\\n", "|", "sh", "-c", &sink])
        .unwrap();

    // the pipe's read end now takes descriptor 0, already the consumer's stdin
    close(0).unwrap();
    let outcome = Dispatcher::default().run(&line);
    let reopened = open("/dev/null", OFlag::O_RDONLY, Mode::empty()).unwrap();
    assert_eq!(reopened, 0);

    assert_eq!(
        outcome.unwrap(),
        Outcome::Waited(vec![ChildExit::Exited(0), ChildExit::Exited(0)])
    );
    assert_eq!(fs::read_to_string(&out).unwrap(), "through\n");

    let _ = fs::remove_file(out);
}

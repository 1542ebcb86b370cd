//! Running out of descriptors before anything is spawned stops the read loop.
#![cfg(target_os = "linux")]

use nix::sys::resource::{Resource, getrlimit, setrlimit};
use shell_dispatch::{Dispatcher, Flow, TokenizedCommand};
use std::fs::{self, File};

fn highest_open_descriptor() -> u64 {
    fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u64>().ok())
        .max()
        .unwrap()
}

#[test]
fn test_pipe_failure_stops_the_loop() {
    let sh = Dispatcher::default();
    let pipeline = TokenizedCommand::from_words(&["ls", "|", "wc", "-l"]).unwrap();
    let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).unwrap();

    setrlimit(Resource::RLIMIT_NOFILE, highest_open_descriptor() + 1, hard).unwrap();
    // fill whatever gaps are left below the limit
    let mut filler = Vec::new();
    while let Ok(file) = File::open("/dev/null") {
        filler.push(file);
    }

    let flow = sh.dispatch(&pipeline);

    drop(filler);
    setrlimit(Resource::RLIMIT_NOFILE, soft, hard).unwrap();

    assert_eq!(flow, Flow::Stop);
    assert_eq!(sh.dispatch(&pipeline), Flow::Continue);
}

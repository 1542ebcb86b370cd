use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

fn shell() -> Command {
    Command::new(env!("CARGO_BIN_EXE_shell_dispatch"))
}

fn run_line(line: &str) -> Output {
    shell().args(["-c", line]).output().expect("run shell_dispatch")
}

fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cli_tests_{}_{}", std::process::id(), tag))
}

#[test]
fn test_echo_reaches_stdout() {
    let output = run_line("echo hi");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "hi\n");
}

#[test]
fn test_pipeline_output() {
    let output = run_line("seq 1 1000 | wc -l");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim(), "1000");
}

#[test]
fn test_background_does_not_hold_the_shell() {
    let started = Instant::now();
    // the background child inherits these streams, so don't capture them
    let status = shell()
        .args(["-c", "sleep 5 &"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_input_redirection_twice_gives_same_output() {
    let input = temp_path("sort_in");
    fs::write(&input, "b\nc\na\n").unwrap();
    let line = format!("sort < {}", input.display());

    let first = run_line(&line);
    let second = run_line(&line);
    assert_eq!(String::from_utf8(first.stdout).unwrap(), "a\nb\nc\n");
    assert_eq!(String::from_utf8(second.stdout).unwrap(), "a\nb\nc\n");

    let _ = fs::remove_file(input);
}

#[test]
fn test_missing_input_is_reported_by_the_child() {
    let missing = temp_path("missing.txt");
    let _ = fs::remove_file(&missing);

    let output = run_line(&format!("cat < {}", missing.display()));
    assert!(output.status.success(), "the shell itself keeps going");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cat: cannot open"), "{stderr}");
    assert!(stderr.contains("missing.txt"), "{stderr}");
}

#[test]
fn test_unknown_program_is_reported_by_the_child() {
    let output = run_line("no-such-program-for-cli-tests");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        stderr.contains("no-such-program-for-cli-tests: cannot execute"),
        "{stderr}"
    );
}

#[test]
fn test_syntax_error_is_reported() {
    let output = run_line("ls |");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("shell_dispatch: syntax error"), "{stderr}");
}

#[test]
fn test_blank_command_does_nothing() {
    let output = run_line("   ");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unknown_reaper_policy_is_rejected() {
    let output = shell().args(["--reaper", "bogus"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_handler_reaper_runs_commands() {
    let output = shell()
        .args(["--reaper", "handler", "-c", "echo reaped"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "reaped\n");
}

#[test]
fn test_reads_lines_until_end_of_input() {
    let out = temp_path("loop_out");
    let _ = fs::remove_file(&out);

    let mut child = shell()
        .args(["--prompt", ""])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "echo one").unwrap();
        writeln!(stdin).unwrap();
        writeln!(stdin, "echo two > {}", out.display()).unwrap();
        writeln!(stdin, "echo three").unwrap();
    }
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("one\n"), "{stdout}");
    assert!(stdout.contains("three\n"), "{stdout}");
    assert!(!stdout.contains("two"), "{stdout}");
    assert_eq!(fs::read_to_string(&out).unwrap(), "two\n");

    let _ = fs::remove_file(out);
}

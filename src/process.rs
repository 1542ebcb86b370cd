//! Child processes: spawn, descriptor wiring, waiting.
//!
//! [`spawn`] forks and, in the child, applies a [`SpawnConfig`] (close inherited pipe
//! ends, reset signal dispositions, redirect standard streams) before replacing the image
//! with `execvp`. Everything the child needs is prepared in the parent, so the child
//! itself only issues async-signal-safe system calls. A child that fails on the way
//! writes a diagnostic to its standard error and exits with status 1; the parent only
//! ever sees that exit status.

use crate::command::ExitCode;
use crate::error::{SetupError, SpawnError, WaitError};
use crate::parser::RedirectKind;
use crate::signals;
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl, open};
use nix::libc;
use nix::sys::signal::Signal;
use nix::sys::stat::Mode;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, close, dup2, fork};
use std::ffi::{CString, c_char};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

/// Exit status of a child that failed before or during exec.
const CHILD_FAILURE: i32 = 1;

/// Where a child's standard input or output comes from.
#[derive(Debug)]
pub enum StdioTarget {
    /// Keep the stream inherited from the dispatcher.
    Inherit,
    /// Duplicate this descriptor onto the stream, then close the original.
    Fd(RawFd),
    /// Open `path` in the child and duplicate it onto the stream.
    File { path: CString, kind: RedirectKind },
}

impl StdioTarget {
    pub fn file(path: &str, kind: RedirectKind) -> Result<Self, SpawnError> {
        Ok(StdioTarget::File {
            path: CString::new(path)?,
            kind,
        })
    }
}

/// Everything a child does between fork and exec.
///
/// In order, the child:
/// 1. closes the descriptors registered with [`close_in_child`](Self::close_in_child);
/// 2. restores the default action of the configured signals;
/// 3. wires standard input, then standard output;
/// 4. replaces its image with `argv[0]`, searched in `PATH`.
pub struct SpawnConfig {
    argv: Vec<CString>,
    // NULL-terminated, points into `argv`
    argv_ptrs: Vec<*const c_char>,
    stdin: StdioTarget,
    stdout: StdioTarget,
    close_first: Vec<RawFd>,
    reset: &'static [Signal],
}

impl SpawnConfig {
    /// Run `args[0]` with `args` as its argument vector.
    ///
    /// Both streams are inherited and SIGINT, SIGCHLD and SIGPIPE are reset, until changed.
    pub fn new(args: &[String]) -> Result<Self, SpawnError> {
        if args.is_empty() {
            return Err(SpawnError::EmptyArgv);
        }
        let argv = args
            .iter()
            .map(|arg| CString::new(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|arg| arg.as_ptr()).collect();
        argv_ptrs.push(std::ptr::null());
        Ok(Self {
            argv,
            argv_ptrs,
            stdin: StdioTarget::Inherit,
            stdout: StdioTarget::Inherit,
            close_first: Vec::new(),
            reset: signals::FOREGROUND_RESET,
        })
    }

    pub fn stdin(mut self, target: StdioTarget) -> Self {
        self.stdin = target;
        self
    }

    pub fn stdout(mut self, target: StdioTarget) -> Self {
        self.stdout = target;
        self
    }

    /// Close `fd` in the child before anything else, e.g. the pipe end it never uses.
    pub fn close_in_child(mut self, fd: RawFd) -> Self {
        self.close_first.push(fd);
        self
    }

    /// Signals whose default action the child restores.
    pub fn reset_signals(mut self, signals: &'static [Signal]) -> Self {
        self.reset = signals;
        self
    }

    pub fn program(&self) -> String {
        self.argv[0].to_string_lossy().into_owned()
    }

    fn exec_child(&self) -> ! {
        let program = self.argv[0].as_bytes();

        for &fd in &self.close_first {
            let _ = close(fd);
        }

        if let Err(errno) = signals::reset_to_default(self.reset) {
            child_fail(program, b"cannot reset signal dispositions", None, errno);
        }

        wire(&self.stdin, libc::STDIN_FILENO, program);
        wire(&self.stdout, libc::STDOUT_FILENO, program);

        // SAFETY: `argv_ptrs` is NULL-terminated and points into `argv`, which outlives
        // this call. execvp only returns on failure.
        unsafe { libc::execvp(self.argv[0].as_ptr(), self.argv_ptrs.as_ptr()) };
        child_fail(program, b"cannot execute", None, Errno::last())
    }
}

/// Put `target` on descriptor `stream` inside the child.
fn wire(target: &StdioTarget, stream: RawFd, program: &[u8]) {
    let fd = match target {
        StdioTarget::Inherit => return,
        StdioTarget::Fd(fd) => *fd,
        StdioTarget::File { path, kind } => {
            let flags = match kind {
                RedirectKind::Input => OFlag::O_RDONLY,
                RedirectKind::Output => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                RedirectKind::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
            };
            match open(path.as_c_str(), flags, Mode::from_bits_truncate(0o644)) {
                Ok(fd) => fd,
                Err(errno) => child_fail(program, b"cannot open", Some(path.as_bytes()), errno),
            }
        }
    };

    if let Err(errno) = dup2(fd, stream) {
        let operation: &[u8] = if stream == libc::STDIN_FILENO {
            b"cannot redirect standard input"
        } else {
            b"cannot redirect standard output"
        };
        child_fail(program, operation, None, errno);
    }
    if fd == stream {
        // dup2 onto itself keeps FD_CLOEXEC, and exec would close the stream
        if let Err(errno) = fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())) {
            child_fail(program, b"cannot keep descriptor open", None, errno);
        }
    } else {
        let _ = close(fd);
    }
}

/// Report a failure from inside the child and terminate it.
fn child_fail(program: &[u8], operation: &[u8], subject: Option<&[u8]>, errno: Errno) -> ! {
    let emit = |bytes: &[u8]| {
        let mut rest = bytes;
        while !rest.is_empty() {
            // SAFETY: writes from a live slice; write(2) is async-signal-safe.
            let n = unsafe { libc::write(libc::STDERR_FILENO, rest.as_ptr().cast(), rest.len()) };
            if n <= 0 {
                break;
            }
            rest = &rest[n as usize..];
        }
    };
    emit(program);
    emit(b": ");
    emit(operation);
    if let Some(subject) = subject {
        emit(b" ");
        emit(subject);
    }
    emit(b": ");
    emit(errno.desc().as_bytes());
    emit(b"\n");
    // SAFETY: _exit skips atexit handlers and stdio flushing, both unsafe after fork.
    unsafe { libc::_exit(CHILD_FAILURE) }
}

/// Fork a child that runs `config`.
///
/// Fails only when the process cannot be created. Failures after the fork belong to
/// the child and surface as its exit status.
pub fn spawn(config: &SpawnConfig) -> Result<ChildHandle, SpawnError> {
    let program = config.program();
    // SAFETY: the child only performs async-signal-safe calls before exec or _exit.
    match unsafe { fork() } {
        Ok(ForkResult::Child) => config.exec_child(),
        Ok(ForkResult::Parent { child }) => {
            log::debug!("spawned `{}` as pid {}", program, child);
            Ok(ChildHandle {
                pid: child,
                program,
            })
        }
        Err(errno) => Err(SpawnError::Fork(errno)),
    }
}

/// How a waited-for child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Normal termination with this status.
    Exited(i32),
    /// Killed by a signal.
    Signaled(Signal),
    /// The child was gone before the wait: SIGCHLD is ignored and the kernel reaped it.
    Reaped,
}

impl ChildExit {
    /// The status a shell would report, `None` when it is unknown.
    pub fn code(&self) -> Option<ExitCode> {
        match self {
            ChildExit::Exited(code) => Some(*code),
            ChildExit::Signaled(signal) => Some(128 + *signal as i32),
            ChildExit::Reaped => None,
        }
    }
}

/// A spawned child, owned by the executor that spawned it.
///
/// Consumed exactly once: by [`wait`](Self::wait) in the foreground, or by
/// [`detach`](Self::detach) when reaping is left to the SIGCHLD disposition.
#[derive(Debug)]
#[must_use = "a child must be waited for or explicitly detached"]
pub struct ChildHandle {
    pid: Pid,
    program: String,
}

impl ChildHandle {
    /// Block until this child terminates.
    ///
    /// `EINTR` restarts the wait. `ECHILD` means the kernel already reaped the child
    /// (SIGCHLD ignored) and is not an error.
    pub fn wait(self) -> Result<ChildExit, WaitError> {
        loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    log::debug!("pid {} (`{}`) exited with {}", self.pid, self.program, code);
                    return Ok(ChildExit::Exited(code));
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    log::debug!("pid {} (`{}`) killed by {}", self.pid, self.program, signal);
                    return Ok(ChildExit::Signaled(signal));
                }
                Ok(status) => log::trace!("pid {}: {:?}", self.pid, status),
                Err(Errno::EINTR) => log::trace!("wait for pid {} interrupted", self.pid),
                Err(Errno::ECHILD) => {
                    log::debug!("pid {} (`{}`) was already reaped", self.pid, self.program);
                    return Ok(ChildExit::Reaped);
                }
                Err(errno) => {
                    return Err(WaitError {
                        pid: self.pid,
                        program: self.program,
                        errno,
                    });
                }
            }
        }
    }

    /// Give up ownership without waiting.
    ///
    /// The pid is handed to the SIGCHLD reaper, which only ever collects detached
    /// children, never one a foreground [`wait`](Self::wait) is blocked on.
    pub fn detach(self) -> Pid {
        log::debug!("pid {} (`{}`) left to run in the background", self.pid, self.program);
        signals::adopt(self.pid);
        self.pid
    }
}

/// The two ends of a pipe, held by the orchestrating process.
///
/// Hand-off: the producer child closes the read end, duplicates the write end onto its
/// standard output and closes the original; the consumer mirrors that with the read end.
/// Once both children are spawned the orchestrator must [`close`](Self::close) its own
/// copies, otherwise the consumer never sees end-of-file.
#[derive(Debug)]
pub struct Pipe {
    read: OwnedFd,
    write: OwnedFd,
}

impl Pipe {
    pub fn new() -> Result<Self, SetupError> {
        let (read, write) = create_pipe().map_err(SetupError::Pipe)?;
        log::trace!("pipe created: read {} write {}", read.as_raw_fd(), write.as_raw_fd());
        Ok(Self { read, write })
    }

    pub fn read_end(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    pub fn write_end(&self) -> RawFd {
        self.write.as_raw_fd()
    }

    /// Release the orchestrator's copies of both ends.
    pub fn close(self) {
        log::trace!(
            "closing pipe copies: read {} write {}",
            self.read.as_raw_fd(),
            self.write.as_raw_fd()
        );
        drop(self.read);
        drop(self.write);
    }
}

// Close-on-exec keeps unrelated children spawned meanwhile from holding the pipe open.
// The dup2'd copies in our own children do not inherit the flag.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn create_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(OFlag::O_CLOEXEC)
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn create_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe()
}

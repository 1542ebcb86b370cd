//! Signal dispositions of the dispatcher and of the children it spawns.
//!
//! The long-lived process ignores SIGINT, so Ctrl-C only reaches the foreground job,
//! and either ignores SIGCHLD or reaps through a handler, so background children never
//! linger as zombies. Foreground children put SIGINT and SIGCHLD back to default before
//! they replace their image; background children keep ignoring SIGINT.

use crate::config::ReaperPolicy;
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction, signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Detached children the SIGCHLD handler may reap. A zero slot is free.
const TRACKED_JOBS: usize = 256;

static BACKGROUND_JOBS: [AtomicI32; TRACKED_JOBS] = [const { AtomicI32::new(0) }; TRACKED_JOBS];

/// Set while [`ReaperPolicy::Handler`] is installed.
static REAPER_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Signals a foreground child restores to their default action.
///
/// SIGPIPE is on the list because the Rust runtime ignores it in the dispatcher, and an
/// ignored disposition survives exec.
pub const FOREGROUND_RESET: &[Signal] = &[Signal::SIGINT, Signal::SIGCHLD, Signal::SIGPIPE];

/// Signals a background child restores. SIGINT stays ignored so that Ctrl-C at the
/// prompt does not reach background jobs.
pub const BACKGROUND_RESET: &[Signal] = &[Signal::SIGCHLD, Signal::SIGPIPE];

/// Process-wide dispositions installed at startup.
///
/// Holds the actions that were in place before, so [`restore`](Self::restore) can put
/// them back at exit.
#[must_use = "dropping the disposition keeps the dispatcher's handlers installed"]
pub struct SignalDisposition {
    policy: ReaperPolicy,
    previous: Vec<(Signal, SigAction)>,
}

impl SignalDisposition {
    /// Ignore SIGINT and set up SIGCHLD according to `policy`.
    ///
    /// Call once, before the first dispatch.
    pub fn install(policy: ReaperPolicy) -> Result<Self, Errno> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let on_child = match policy {
            ReaperPolicy::Ignore => {
                SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty())
            }
            ReaperPolicy::Handler => SigAction::new(
                SigHandler::Handler(reap_children),
                SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
                SigSet::empty(),
            ),
        };

        let mut disposition = Self {
            policy,
            previous: Vec::with_capacity(2),
        };
        for (sig, action) in [(Signal::SIGINT, &ignore), (Signal::SIGCHLD, &on_child)] {
            // SAFETY: the installed handler only calls waitpid, which is async-signal-safe.
            match unsafe { sigaction(sig, action) } {
                Ok(old) => disposition.previous.push((sig, old)),
                Err(errno) => {
                    let _ = disposition.restore();
                    return Err(errno);
                }
            }
        }
        REAPER_ACTIVE.store(policy == ReaperPolicy::Handler, Ordering::Release);
        log::debug!("signal dispositions installed (reaper: {policy})");
        Ok(disposition)
    }

    pub fn policy(&self) -> ReaperPolicy {
        self.policy
    }

    /// Put back the actions that were in place before [`install`](Self::install).
    pub fn restore(self) -> Result<(), Errno> {
        REAPER_ACTIVE.store(false, Ordering::Release);
        for (sig, action) in self.previous.iter().rev() {
            // SAFETY: restoring an action previously returned by sigaction.
            unsafe { sigaction(*sig, action) }?;
        }
        log::debug!("signal dispositions restored");
        Ok(())
    }
}

/// Restore the default action of each signal in `signals`.
///
/// Runs in a freshly forked child, so it must stay async-signal-safe: no allocation,
/// no locks, no logging.
pub(crate) fn reset_to_default(signals: &[Signal]) -> Result<(), Errno> {
    for &sig in signals {
        // SAFETY: SIG_DFL is always a valid disposition.
        unsafe { signal(sig, SigHandler::SigDfl) }?;
    }
    Ok(())
}

/// Register a detached child with the reaper, then collect whatever already finished.
///
/// Without the handler installed this does nothing: SIGCHLD is ignored and the kernel
/// reaps on its own. The immediate sweep covers a child that exited before its pid was
/// registered, whose SIGCHLD found nothing to reap.
pub(crate) fn adopt(pid: Pid) {
    if !REAPER_ACTIVE.load(Ordering::Acquire) {
        return;
    }
    let raw = pid.as_raw();
    let stored = BACKGROUND_JOBS
        .iter()
        .any(|slot| slot.compare_exchange(0, raw, Ordering::AcqRel, Ordering::Relaxed).is_ok());
    if !stored {
        log::warn!(
            "{TRACKED_JOBS} background jobs already tracked; pid {pid} stays a zombie until exit"
        );
    }
    reap_background();
}

/// Collect every registered background child that has terminated.
///
/// Only registered pids are waited for, so a foreground child is always left to the
/// executor that spawned it. Async-signal-safe: atomics and waitpid only.
fn reap_background() {
    for slot in &BACKGROUND_JOBS {
        let raw = slot.load(Ordering::Acquire);
        if raw == 0 {
            continue;
        }
        match waitpid(Pid::from_raw(raw), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => {}
            // reaped here, or by a concurrent sweep
            _ => {
                let _ = slot.compare_exchange(raw, 0, Ordering::AcqRel, Ordering::Relaxed);
            }
        }
    }
}

extern "C" fn reap_children(_: libc::c_int) {
    let saved = Errno::last_raw();
    reap_background();
    Errno::set_raw(saved);
}

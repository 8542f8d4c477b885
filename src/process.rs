use std::fmt;
use std::io;

use crate::posix;

/// Exit status of the relayed child.
///
/// This wraps the raw status returned by `waitpid()`.  Use [`code`](Self::code) and
/// [`signal`](Self::signal) to inspect it, and [`relay_code`](Self::relay_code) to obtain
/// the status the relay itself exits with.
#[derive(Eq, PartialEq, Hash, Copy, Clone)]
pub struct ExitStatus(i32);

/// Exit code used when the child did not exit normally, or when the relay
/// could not be set up.
pub const FAILURE_CODE: u8 = posix::EXIT_FAILURE as u8;

impl ExitStatus {
    /// Create an `ExitStatus` from the raw `waitpid()` status.
    pub fn from_raw(raw: i32) -> ExitStatus {
        ExitStatus(raw)
    }

    /// Returns the raw `waitpid()` status.
    pub fn into_raw(self) -> i32 {
        self.0
    }

    /// Returns the exit code if the process exited normally.
    ///
    /// Returns `None` if the process was killed by a signal.
    pub fn code(&self) -> Option<u8> {
        libc::WIFEXITED(self.0).then(|| libc::WEXITSTATUS(self.0) as u8)
    }

    /// Returns the signal number if the process was killed by a signal.
    pub fn signal(&self) -> Option<i32> {
        libc::WIFSIGNALED(self.0).then(|| libc::WTERMSIG(self.0))
    }

    /// True if the exit status of the process is 0.
    pub fn success(&self) -> bool {
        self.code() == Some(0)
    }

    /// The code the relay should exit with: the child's own exit code if it exited
    /// normally, [`FAILURE_CODE`] otherwise.
    ///
    /// The signal number of a killed child is deliberately not exposed here.
    pub fn relay_code(&self) -> u8 {
        self.code().unwrap_or(FAILURE_CODE)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code(), self.signal()) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(sig)) => write!(f, "signal {}", sig),
            (None, None) => write!(f, "unrecognized wait status: {} {:#x}", self.0, self.0),
        }
    }
}

impl fmt::Debug for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code(), self.signal()) {
            (Some(code), _) => write!(f, "ExitStatus(Exited({}))", code),
            (None, Some(sig)) => write!(f, "ExitStatus(Signal({}))", sig),
            (None, None) => write!(f, "ExitStatus(Unknown({} {:#x}))", self.0, self.0),
        }
    }
}

/// Handle to the spawned child.
///
/// The handle is consumed by [`wait`](Self::wait), so a child can be reaped exactly once
/// and its pid cannot be used afterwards.
#[derive(Debug)]
pub(crate) struct Child {
    pid: u32,
}

impl Child {
    pub(crate) fn new(pid: u32) -> Child {
        Child { pid }
    }

    /// Returns the PID of the child.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Block until the child terminates and return its exit status.
    ///
    /// Interrupted waits are retried.
    pub fn wait(self) -> io::Result<ExitStatus> {
        posix::waitpid(self.pid).map(ExitStatus::from_raw)
    }

    /// Wait for a child whose status nobody will look at, so it does not linger as a
    /// zombie.  A failed wait is only logged.
    pub fn reap(self) -> Option<ExitStatus> {
        let pid = self.pid;
        match self.wait() {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!(pid, error = %e, "failed to reap child");
                None
            }
        }
    }
}

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read, Write};

use crate::error::{RelayError, Result};
use crate::posix::{self, ExecImage};
use crate::process::ExitStatus;
use crate::pump::{DEFAULT_BUFFER_SIZE, Join, PumpGroup};
use crate::spawn::{self, ParentEnds, RelayPipes};
use crate::stream::{StandardStream, StdStream};

/// Executable the `cmd-relay` binary wraps.
///
/// Fixed at build time; set `CMD_RELAY_TARGET` while building to change it.
pub const DEFAULT_TARGET: &str = match option_env!("CMD_RELAY_TARGET") {
    Some(target) => target,
    None => "/system/bin/cmd",
};

/// Runs a target executable as a child and relays its standard streams.
///
/// By default the parent side of each stream is the process's own descriptor 0, 1 or
/// 2, used unbuffered.  The builder methods replace them with arbitrary readers and
/// writers.
///
/// # Example
///
/// ```no_run
/// use cmd_relay::Relay;
///
/// let status = Relay::new("/bin/cat").run(&["cat"])?;
/// std::process::exit(status.relay_code().into());
/// # Ok::<(), cmd_relay::RelayError>(())
/// ```
pub struct Relay {
    target: OsString,
    stdin: Box<dyn Read + Send>,
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    buffer_size: usize,
}

impl Relay {
    /// Relay to `target`, which is executed by path without a `PATH` search.
    pub fn new(target: impl AsRef<OsStr>) -> Relay {
        Relay {
            target: target.as_ref().to_owned(),
            stdin: Box::new(StdStream::new(StandardStream::Input)),
            stdout: Box::new(StdStream::new(StandardStream::Output)),
            stderr: Box::new(StdStream::new(StandardStream::Error)),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Read the data forwarded to the child's standard input from `source`.
    pub fn stdin(mut self, source: impl Read + Send + 'static) -> Relay {
        self.stdin = Box::new(source);
        self
    }

    /// Write the child's standard output to `dest`.
    pub fn stdout(mut self, dest: impl Write + Send + 'static) -> Relay {
        self.stdout = Box::new(dest);
        self
    }

    /// Write the child's standard error to `dest`.
    pub fn stderr(mut self, dest: impl Write + Send + 'static) -> Relay {
        self.stderr = Box::new(dest);
        self
    }

    /// Size of the buffer each pump copies through.  Values below 1 are raised to 1.
    pub fn buffer_size(mut self, size: usize) -> Relay {
        self.buffer_size = size.max(1);
        self
    }

    /// Run the target with `argv` (including `argv[0]`) and relay its streams.
    ///
    /// Returns after the child terminated and everything it wrote to its standard
    /// output and error has been delivered.  The standard input pump is left running
    /// detached: it ends when its source reaches EOF or the child's stdin is gone, and
    /// otherwise lives until the process exits.
    pub fn run<S: AsRef<OsStr>>(self, argv: &[S]) -> Result<ExitStatus> {
        if argv.is_empty() {
            return Err(RelayError::InvalidInput("argv must not be empty"));
        }
        let image = ExecImage::new(&self.target, argv)
            .map_err(|_| RelayError::InvalidInput("nul byte in target or argument"))?;

        posix::ignore_sigpipe().map_err(RelayError::setup("signal"))?;

        let (parent, child_ends) = RelayPipes::new()?.split();
        let child = spawn::spawn(&image, child_ends)?;
        tracing::debug!(pid = child.pid(), path = ?self.target, "spawned child");

        let mut pumps = PumpGroup::new(self.buffer_size);
        let started = start_pumps(&mut pumps, parent, self.stdin, self.stdout, self.stderr);
        if let Err(e) = started {
            // Pipe ends of pumps that never started are closed by now, so the
            // child sees EOF or EPIPE and can be waited for.
            child.reap();
            return Err(RelayError::setup("thread")(e));
        }

        let status = child.wait().map_err(RelayError::setup("wait"))?;
        tracing::debug!(%status, "child terminated");

        for report in pumps.join() {
            tracing::trace!(?report, "output drained");
        }
        Ok(status)
    }
}

/// Start the three pumps; on error, the ends of the pumps not yet started are
/// dropped before returning.
fn start_pumps(
    pumps: &mut PumpGroup,
    parent: ParentEnds,
    stdin: Box<dyn Read + Send>,
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
) -> io::Result<()> {
    pumps.spawn(StandardStream::Input, stdin, parent.stdin, Join::Detach)?;
    pumps.spawn(StandardStream::Output, parent.stdout, stdout, Join::Wait)?;
    pumps.spawn(StandardStream::Error, parent.stderr, stderr, Join::Wait)?;
    Ok(())
}

impl fmt::Debug for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("target", &self.target)
            .field("buffer_size", &self.buffer_size)
            .finish_non_exhaustive()
    }
}

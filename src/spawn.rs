use std::fs::File;
use std::io::{self, Read, Write};

use crate::error::{RelayError, Result};
use crate::posix::{self, ExecImage};
use crate::process::{Child, FAILURE_CODE};
use crate::stream::StandardStream;

/// One pipe, split by role: the end the parent keeps and the end the child gets.
#[derive(Debug)]
pub(crate) struct PipePair {
    pub parent: File,
    pub child: File,
}

impl PipePair {
    fn new(parent_writes: bool) -> io::Result<PipePair> {
        let (read, write) = posix::pipe()?;
        let read = posix::move_above_std(read)?;
        let write = posix::move_above_std(write)?;
        Ok(if parent_writes {
            PipePair {
                parent: write,
                child: read,
            }
        } else {
            PipePair {
                parent: read,
                child: write,
            }
        })
    }
}

/// The three pipes connecting the relay to its child, for one run.
#[derive(Debug)]
pub(crate) struct RelayPipes {
    pub stdin: PipePair,
    pub stdout: PipePair,
    pub stderr: PipePair,
}

/// The parent's ends: write end of the stdin pipe, read ends of the output pipes.
#[derive(Debug)]
pub(crate) struct ParentEnds {
    pub stdin: File,
    pub stdout: File,
    pub stderr: File,
}

/// The ends to be remapped onto the child's standard descriptors.
#[derive(Debug)]
pub(crate) struct ChildEnds {
    pub stdin: File,
    pub stdout: File,
    pub stderr: File,
}

impl RelayPipes {
    pub fn new() -> Result<RelayPipes> {
        let pipe = |parent_writes| PipePair::new(parent_writes).map_err(RelayError::setup("pipe"));
        Ok(RelayPipes {
            stdin: pipe(true)?,
            stdout: pipe(false)?,
            stderr: pipe(false)?,
        })
    }

    pub fn split(self) -> (ParentEnds, ChildEnds) {
        (
            ParentEnds {
                stdin: self.stdin.parent,
                stdout: self.stdout.parent,
                stderr: self.stderr.parent,
            },
            ChildEnds {
                stdin: self.stdin.child,
                stdout: self.stdout.child,
                stderr: self.stderr.child,
            },
        )
    }
}

// Steps the child can fail in before the target takes over, reported to the
// parent over the exec-fail pipe together with errno.
const STAGE_DUP2: u32 = 0;
const STAGE_SIGNAL: u32 = 1;
const STAGE_EXEC: u32 = 2;

/// Pipe over which the child reports a failure before exec.  Like the stream pipes,
/// its ends must stay clear of 0..=2 or the child's remapping would overwrite them.
pub(crate) fn exec_fail_pipe() -> io::Result<(File, File)> {
    let (read, write) = posix::pipe()?;
    Ok((posix::move_above_std(read)?, posix::move_above_std(write)?))
}

/// Read exactly N bytes, or return None on immediate EOF.  A partial read is
/// treated as an error.
fn read_exact_or_eof<const N: usize>(source: &mut File) -> io::Result<Option<[u8; N]>> {
    let mut buf = [0u8; N];
    let mut total_read = 0;
    while total_read < N {
        let n = posix::retry_eintr(|| source.read(&mut buf[total_read..]))?;
        if n == 0 {
            break;
        }
        total_read += n;
    }
    match total_read {
        0 => Ok(None),
        n if n == N => Ok(Some(buf)),
        _ => Err(io::ErrorKind::UnexpectedEof.into()),
    }
}

/// Fork and execute `image` with `child_ends` as its standard streams.
///
/// Returns once the child has successfully exec'd.  The child ends are closed in the
/// parent before this returns, so the parent's pipe ends see EOF as soon as the child
/// closes its side.
pub(crate) fn spawn(image: &ExecImage, child_ends: ChildEnds) -> Result<Child> {
    let (mut fail_read, fail_write) = exec_fail_pipe().map_err(RelayError::setup("pipe"))?;

    let pid = match unsafe { posix::fork() }.map_err(RelayError::setup("fork"))? {
        Some(pid) => pid,
        None => {
            // Only async-signal-safe work from here on: no allocation, no logging.
            drop(fail_read);
            let (stage, error) = do_exec(image, &child_ends);
            let code = error.raw_os_error().unwrap_or(0) as u32;
            let mut report = [0u8; 8];
            report[..4].copy_from_slice(&stage.to_le_bytes());
            report[4..].copy_from_slice(&code.to_le_bytes());
            (&fail_write).write_all(&report).ok();
            posix::_exit(FAILURE_CODE);
        }
    };

    // Close the parent's copies of the child ends promptly, before blocking on
    // the exec-fail pipe.
    drop(child_ends);
    drop(fail_write);

    let report = read_exact_or_eof::<8>(&mut fail_read).map_err(RelayError::setup("exec"))?;
    let Some(report) = report else {
        return Ok(Child::new(pid));
    };

    // The child is gone or about to be; reap it before reporting.
    Child::new(pid).reap();
    let stage = u32::from_le_bytes([report[0], report[1], report[2], report[3]]);
    let error = io::Error::from_raw_os_error(
        u32::from_le_bytes([report[4], report[5], report[6], report[7]]) as i32,
    );
    Err(match stage {
        STAGE_DUP2 => RelayError::Setup {
            op: "dup2",
            source: error,
        },
        STAGE_SIGNAL => RelayError::Setup {
            op: "signal",
            source: error,
        },
        _ => RelayError::Exec(error),
    })
}

fn do_exec(image: &ExecImage, child_ends: &ChildEnds) -> (u32, io::Error) {
    let slots = [
        (&child_ends.stdin, StandardStream::Input),
        (&child_ends.stdout, StandardStream::Output),
        (&child_ends.stderr, StandardStream::Error),
    ];
    for (end, which) in slots {
        if let Err(e) = posix::replace_fd(end, which.fd()) {
            return (STAGE_DUP2, e);
        }
    }
    if let Err(e) = posix::reset_sigpipe() {
        return (STAGE_SIGNAL, e);
    }
    (STAGE_EXEC, image.exec())
}

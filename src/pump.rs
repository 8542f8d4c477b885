//! Byte pumps between a source and a destination, each on its own thread.

use std::io::{self, ErrorKind, Read, Write};
use std::thread::{self, JoinHandle};

use crate::posix;
use crate::stream::StandardStream;

/// Size of the intermediate buffer each pump copies through.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// How a pump stopped.
///
/// None of these are errors of the relay; they only tell why a stream is finished.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PumpEnd {
    /// The source reached end of input.
    Eof,
    /// Reading from the source failed.
    ReadFailed(ErrorKind),
    /// Writing to the destination failed, typically `BrokenPipe`.
    WriteFailed(ErrorKind),
}

/// Outcome of a finished pump.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PumpReport {
    /// The standard stream the pump served.
    pub stream: StandardStream,
    /// Number of bytes written to the destination, including the accepted part of a
    /// chunk whose write later failed.
    pub bytes: u64,
    pub end: PumpEnd,
}

/// Copy bytes from `source` to `dest` until end of input or an I/O error.
///
/// Reads and writes interrupted by a signal are retried; partial writes are continued
/// until the whole chunk is written.  Any other error stops the pump and is returned as
/// part of the result rather than propagated.  Unless writing failed, `dest` is flushed
/// before returning, and a failed flush counts as a write failure.
pub fn pump(
    source: &mut impl Read,
    dest: &mut impl Write,
    buffer_size: usize,
) -> (u64, PumpEnd) {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;
    let end = loop {
        let n = match posix::retry_eintr(|| source.read(&mut buf)) {
            Ok(0) => break PumpEnd::Eof,
            Ok(n) => n,
            Err(e) => break PumpEnd::ReadFailed(e.kind()),
        };
        let mut chunk = &buf[..n];
        while !chunk.is_empty() {
            match posix::retry_eintr(|| dest.write(chunk)) {
                Ok(0) => return (total, PumpEnd::WriteFailed(ErrorKind::WriteZero)),
                Ok(written) => {
                    total += written as u64;
                    chunk = &chunk[written..];
                }
                Err(e) => return (total, PumpEnd::WriteFailed(e.kind())),
            }
        }
    };
    match posix::retry_eintr(|| dest.flush()) {
        Ok(()) => (total, end),
        Err(e) => (total, PumpEnd::WriteFailed(e.kind())),
    }
}

/// Whether the owner of a [`PumpGroup`] waits for a pump.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Join {
    /// [`PumpGroup::join`] waits for the pump to finish.
    Wait,
    /// The pump runs unobserved; it may still be blocked when the process exits.
    Detach,
}

/// A group of pump threads, some of which are waited for and some abandoned.
///
/// Each pump owns its source, destination and buffer, and drops both endpoints when
/// it finishes, so closing a pipe end is tied to the pump that used it.  No pump can be
/// cancelled; they end on their own at end of input or on an I/O error.
#[derive(Debug)]
pub struct PumpGroup {
    buffer_size: usize,
    joined: Vec<JoinHandle<PumpReport>>,
}

impl PumpGroup {
    pub fn new(buffer_size: usize) -> PumpGroup {
        PumpGroup {
            buffer_size,
            joined: Vec::new(),
        }
    }

    /// Start a pump copying from `source` to `dest` on a new thread.
    pub fn spawn<R, W>(
        &mut self,
        stream: StandardStream,
        mut source: R,
        mut dest: W,
        join: Join,
    ) -> io::Result<()>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let buffer_size = self.buffer_size;
        let handle = thread::Builder::new()
            .name(format!("pump-{}", stream.name()))
            .spawn(move || {
                let (bytes, end) = pump(&mut source, &mut dest, buffer_size);
                tracing::debug!(stream = stream.name(), bytes, ?end, "pump finished");
                PumpReport { stream, bytes, end }
            })?;
        match join {
            Join::Wait => self.joined.push(handle),
            Join::Detach => drop(handle),
        }
        Ok(())
    }

    /// Number of pumps [`join`](Self::join) will wait for.
    pub fn waiting(&self) -> usize {
        self.joined.len()
    }

    /// Wait for every pump started with [`Join::Wait`], in start order.
    ///
    /// Detached pumps are not waited for.
    pub fn join(self) -> Vec<PumpReport> {
        self.joined
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    }
}

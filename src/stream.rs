use std::fs::File;
use std::io::{self, Read, Write};
use std::mem::ManuallyDrop;
use std::os::unix::io::FromRawFd;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StandardStream {
    Input = 0,
    Output = 1,
    Error = 2,
}

impl StandardStream {
    pub fn fd(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            StandardStream::Input => "stdin",
            StandardStream::Output => "stdout",
            StandardStream::Error => "stderr",
        }
    }
}

/// One of the process's own standard descriptors, used without buffering.
///
/// Dropping it does not close the descriptor.  For example:
///
/// ```ignore
/// let stdout = StdStream::new(StandardStream::Output);
/// ```
///
/// gives unbuffered writes to fd 1 without closing fd 1 when `stdout` goes out of
/// scope.  This is what the relay uses by default for its parent-side endpoints.
#[derive(Debug)]
pub struct StdStream {
    file: ManuallyDrop<File>,
}

impl StdStream {
    pub fn new(which: StandardStream) -> StdStream {
        // The descriptor is borrowed for the life of the process and never closed
        // here, so wrapping it in a File is sound as long as the File is not dropped.
        let file = unsafe { File::from_raw_fd(which.fd()) };
        StdStream {
            file: ManuallyDrop::new(file),
        }
    }
}

impl Read for StdStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self.file).read(buf)
    }
}

impl Write for StdStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.file).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

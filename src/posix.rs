use std::ffi::{CString, OsStr};
use std::fs::File;
use std::io::{Error, ErrorKind, Result};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, FromRawFd};
use std::ptr;

pub use libc::EXIT_FAILURE;

fn check_err<T: Ord + Default>(num: T) -> Result<T> {
    if num < T::default() {
        return Err(Error::last_os_error());
    }
    Ok(num)
}

/// Retry `f` for as long as it fails with `EINTR`.
pub fn retry_eintr<T>(mut f: impl FnMut() -> Result<T>) -> Result<T> {
    loop {
        match f() {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Create a pipe, returning `(read_end, write_end)`.
///
/// Both ends are close-on-exec, so no pipe descriptor reaches a child unless
/// it is explicitly remapped onto one of its standard slots.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn pipe() -> Result<(File, File)> {
    let mut fds = [0 as libc::c_int; 2];
    check_err(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) })?;
    Ok(unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) })
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn pipe() -> Result<(File, File)> {
    let mut fds = [0 as libc::c_int; 2];
    check_err(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    let ends = unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) };
    set_cloexec(ends.0.as_raw_fd(), true)?;
    set_cloexec(ends.1.as_raw_fd(), true)?;
    Ok(ends)
}

/// Fork the process.  Returns `Some(child_pid)` in the parent and `None` in
/// the child.
///
/// # Safety
///
/// In a multi-threaded process the child may only call async-signal-safe
/// functions until it execs or exits.
pub unsafe fn fork() -> Result<Option<u32>> {
    let pid = check_err(unsafe { libc::fork() })?;
    Ok(if pid == 0 { None } else { Some(pid as u32) })
}

fn os_to_cstring(s: &OsStr) -> Result<CString> {
    CString::new(s.as_bytes()).map_err(|_| Error::from_raw_os_error(libc::EINVAL))
}

#[derive(Debug)]
struct CVec {
    // Individual C strings; they are not unused as rustc thinks, they
    // are pointed to by elements of self.ptrs.
    #[allow(dead_code)]
    strings: Vec<CString>,

    // nullptr-terminated vector of pointers to data inside
    // self.strings.
    ptrs: Vec<*const libc::c_char>,
}

impl CVec {
    fn new<S: AsRef<OsStr>>(slice: &[S]) -> Result<CVec> {
        let strings = slice
            .iter()
            .map(|s| os_to_cstring(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let ptrs = strings
            .iter()
            .map(|s| s.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        Ok(CVec { strings, ptrs })
    }

    fn as_c_vec(&self) -> *const *const libc::c_char {
        self.ptrs.as_ptr()
    }
}

/// Everything `execv` needs, prepared before forking so that the child does
/// not have to allocate.
#[derive(Debug)]
pub struct ExecImage {
    path: CString,
    argv: CVec,
}

impl ExecImage {
    pub fn new<S: AsRef<OsStr>>(path: &OsStr, argv: &[S]) -> Result<ExecImage> {
        Ok(ExecImage {
            path: os_to_cstring(path)?,
            argv: CVec::new(argv)?,
        })
    }

    /// Replace the current process image.  Only returns on failure.
    pub fn exec(&self) -> Error {
        unsafe {
            libc::execv(self.path.as_ptr(), self.argv.as_c_vec());
        }
        Error::last_os_error()
    }
}

pub fn _exit(status: u8) -> ! {
    unsafe { libc::_exit(status as libc::c_int) }
}

/// Block until `pid` terminates, returning the raw wait status.
pub fn waitpid(pid: u32) -> Result<i32> {
    let mut status = 0 as libc::c_int;
    retry_eintr(|| {
        check_err(unsafe { libc::waitpid(pid as libc::pid_t, &mut status, 0) })
    })?;
    Ok(status)
}

pub fn dup2(oldfd: i32, newfd: i32) -> Result<()> {
    check_err(unsafe { libc::dup2(oldfd, newfd) })?;
    Ok(())
}

pub fn set_cloexec(fd: i32, cloexec: bool) -> Result<()> {
    let old = check_err(unsafe { libc::fcntl(fd, libc::F_GETFD) })?;
    let new = if cloexec {
        old | libc::FD_CLOEXEC
    } else {
        old & !libc::FD_CLOEXEC
    };
    if new != old {
        check_err(unsafe { libc::fcntl(fd, libc::F_SETFD, new) })?;
    }
    Ok(())
}

/// Move `file` to a descriptor above the three standard slots, keeping it
/// close-on-exec.
///
/// If the process was started with a standard descriptor closed, a new pipe end
/// can land in that slot and be mistaken for a standard stream on either side
/// of the fork.
pub fn move_above_std(file: File) -> Result<File> {
    if file.as_raw_fd() > 2 {
        return Ok(file);
    }
    let fd = check_err(unsafe { libc::fcntl(file.as_raw_fd(), libc::F_DUPFD_CLOEXEC, 3) })?;
    Ok(unsafe { File::from_raw_fd(fd) })
}

/// Make `file` occupy descriptor slot `target_fd` and survive exec.
///
/// `dup2` leaves the new descriptor inheritable, but when `file` already sits
/// in `target_fd` it is a no-op, so the close-on-exec flag is cleared
/// explicitly in both cases.
pub fn replace_fd(file: &File, target_fd: i32) -> Result<()> {
    let fd = file.as_raw_fd();
    if fd != target_fd {
        dup2(fd, target_fd)?;
    }
    set_cloexec(target_fd, false)
}

/// Reset the signal mask and `SIGPIPE` disposition inherited from the parent
/// to the defaults Unix programs expect.
pub fn reset_sigpipe() -> Result<()> {
    // Called between fork and exec, where the parent's ignored SIGPIPE would
    // otherwise leak into a program that relies on being killed by it.
    unsafe {
        let mut set = MaybeUninit::<libc::sigset_t>::uninit();
        check_err(libc::sigemptyset(set.as_mut_ptr()))?;
        let set = set.assume_init();
        let rc = libc::pthread_sigmask(libc::SIG_SETMASK, &set, ptr::null_mut());
        if rc != 0 {
            return Err(Error::from_raw_os_error(rc));
        }
        if libc::signal(libc::SIGPIPE, libc::SIG_DFL) == libc::SIG_ERR {
            return Err(Error::last_os_error());
        }
    }
    Ok(())
}

/// Ignore `SIGPIPE` for the whole process, so that writing to a closed pipe
/// fails with `EPIPE` instead of killing us.
pub fn ignore_sigpipe() -> Result<()> {
    if unsafe { libc::signal(libc::SIGPIPE, libc::SIG_IGN) } == libc::SIG_ERR {
        return Err(Error::last_os_error());
    }
    Ok(())
}

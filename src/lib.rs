//! Run a command as a child process and relay its standard streams.
//!
//! The relay creates one pipe per standard stream, forks, remaps the child's ends of
//! the pipes onto its descriptors 0, 1 and 2, and executes the target by path.  The
//! parent then copies bytes on three threads:
//!
//! * its own standard input to the child's standard input,
//! * the child's standard output to its own standard output,
//! * the child's standard error to its own standard error.
//!
//! Once the child terminates and both output streams are drained, [`Relay::run`]
//! returns the child's [`ExitStatus`].  [`ExitStatus::relay_code`] maps it to the code
//! a wrapper should exit with: the child's exit code, or [`FAILURE_CODE`] if the child
//! was killed by a signal.
//!
//! The standard input pump is never waited for, since a relay attached to an
//! interactive terminal may never see EOF on its input.
//!
//! ```no_run
//! use cmd_relay::Relay;
//!
//! let status = Relay::new("/bin/sh").run(&["sh", "-c", "echo hello"])?;
//! assert!(status.success());
//! # Ok::<(), cmd_relay::RelayError>(())
//! ```
//!
//! The crate supports Unix only.

#![warn(missing_debug_implementations, rust_2018_idioms)]

#[cfg(not(unix))]
compile_error!("cmd-relay supports Unix platforms only");

mod error;
mod posix;
mod process;
pub mod pump;
mod relay;
mod spawn;
mod stream;

#[cfg(test)]
mod tests;

pub use error::{RelayError, Result};
pub use process::{ExitStatus, FAILURE_CODE};
pub use relay::{DEFAULT_TARGET, Relay};
pub use stream::{StandardStream, StdStream};

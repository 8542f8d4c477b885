use std::io;

use crate::process::Child;
use crate::{ExitStatus, FAILURE_CODE, RelayError};

// Wait statuses as encoded by waitpid(): exit code in the second byte, or
// the terminating signal in the low seven bits.
fn exited(code: u8) -> ExitStatus {
    ExitStatus::from_raw((code as i32) << 8)
}

fn signaled(sig: i32) -> ExitStatus {
    ExitStatus::from_raw(sig)
}

#[test]
fn exited_status() {
    let status = exited(13);
    assert_eq!(status.code(), Some(13));
    assert_eq!(status.signal(), None);
    assert!(!status.success());
    assert_eq!(status.relay_code(), 13);
    assert!(exited(0).success());
}

#[test]
fn signaled_status() {
    let status = signaled(libc::SIGKILL);
    assert_eq!(status.code(), None);
    assert_eq!(status.signal(), Some(libc::SIGKILL));
    assert!(!status.success());
    assert_eq!(status.relay_code(), FAILURE_CODE);
}

#[test]
fn failure_code_is_one() {
    assert_eq!(FAILURE_CODE, 1);
}

#[test]
fn display_status() {
    assert_eq!(exited(7).to_string(), "exit code 7");
    assert_eq!(signaled(libc::SIGTERM).to_string(), format!("signal {}", libc::SIGTERM));
    assert_eq!(format!("{:?}", exited(7)), "ExitStatus(Exited(7))");
}

#[test]
fn raw_status_round_trip() {
    assert_eq!(exited(255).into_raw(), 255 << 8);
}

#[test]
fn wait_retries_until_exit() {
    let child = std::process::Command::new("sh")
        .args(["-c", "sleep 0.1; exit 4"])
        .spawn()
        .unwrap();
    let status = Child::new(child.id()).wait().unwrap();
    assert_eq!(status.code(), Some(4));
}

#[test]
fn wait_on_unknown_pid_fails() {
    // Our own pid is never our child.
    let err = Child::new(std::process::id()).wait().unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::ECHILD));
}

#[test]
fn reap_collects_status() {
    let child = std::process::Command::new("sh")
        .args(["-c", "exit 3"])
        .spawn()
        .unwrap();
    let status = Child::new(child.id()).reap();
    assert_eq!(status.and_then(|s| s.code()), Some(3));
}

#[test]
fn reap_of_unknown_pid_is_none() {
    assert_eq!(Child::new(std::process::id()).reap(), None);
}

#[test]
fn setup_error_names_operation() {
    let err = RelayError::Setup {
        op: "pipe",
        source: io::Error::from_raw_os_error(libc::EMFILE),
    };
    assert!(err.to_string().starts_with("pipe: "), "{}", err);
    assert_eq!(err.exit_code(), FAILURE_CODE);
}

mod common;
mod process;

use crate::pump::{PumpGroup, PumpReport};
use crate::{ExitStatus, Relay, RelayError, StdStream};

fn assert_send_sync<T: Send + Sync>() {}
fn assert_send<T: Send>() {}

#[test]
fn public_types_are_send() {
    assert_send_sync::<ExitStatus>();
    assert_send_sync::<RelayError>();
    assert_send_sync::<PumpReport>();
    assert_send_sync::<StdStream>();
    assert_send::<PumpGroup>();
    assert_send::<Relay>();
}

//! Run the fixed target executable with our own argument vector, relaying all three
//! standard streams, and exit with the target's status.

use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;

use cmd_relay::{DEFAULT_TARGET, ExitStatus, Relay};
use tracing_subscriber::EnvFilter;

fn program_name(argv: &[OsString]) -> String {
    argv.first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_BIN_NAME").to_owned())
}

/// The code this process exits with: the child's own code, or the failure code when
/// the child was killed or the relay could not run it.
fn exit_code(result: &cmd_relay::Result<ExitStatus>) -> u8 {
    match result {
        Ok(status) => status.relay_code(),
        Err(e) => e.exit_code(),
    }
}

fn main() -> ExitCode {
    // Our stderr is also the child's; keep it quiet unless asked.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let argv: Vec<OsString> = env::args_os().collect();
    let result = Relay::new(DEFAULT_TARGET).run(&argv);
    if let Err(e) = &result {
        eprintln!("{}: {}", program_name(&argv), e);
    }
    ExitCode::from(exit_code(&result))
}

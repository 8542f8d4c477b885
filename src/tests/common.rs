use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::PathBuf;

use tempfile::TempDir;

use crate::{ExitStatus, Relay};

/// Files standing in for the relay's standard output and error.
pub struct Outputs {
    dir: TempDir,
}

impl Outputs {
    pub fn new() -> Outputs {
        Outputs {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn create(&self, name: &str) -> File {
        File::create(self.path(name)).unwrap()
    }

    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.path(name)).unwrap()
    }
}

pub struct Relayed {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Relay `sh -c script`, feeding it `input`.
pub fn relay_sh_with(script: &str, input: impl Read + Send + 'static) -> Relayed {
    let outputs = Outputs::new();
    let status = Relay::new("/bin/sh")
        .stdin(input)
        .stdout(outputs.create("stdout"))
        .stderr(outputs.create("stderr"))
        .run(&["sh", "-c", script])
        .unwrap();
    Relayed {
        status,
        stdout: outputs.read("stdout"),
        stderr: outputs.read("stderr"),
    }
}

pub fn relay_sh(script: &str, input: &[u8]) -> Relayed {
    relay_sh_with(script, Cursor::new(input.to_vec()))
}

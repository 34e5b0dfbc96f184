use std::process::Command;

use crate::error::LaunchError;

/// What a finished child process left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.returncode == 0
    }
}

/// Runs an argument vector to completion.
///
/// `argv[0]` is the program, the rest are its arguments. An `Err` means the
/// program never started; a program that ran and failed is an `Ok` with a
/// non-zero `returncode`.
pub trait ProcessRunner {
    fn run(&self, argv: &[String]) -> Result<ProcessOutput, LaunchError>;
}

/// Runs commands with `std::process::Command`, capturing both streams
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<ProcessOutput, LaunchError> {
        let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;

        log::debug!("Spawning {program} with {} arguments", args.len());
        let output = Command::new(program).args(args).output()?;

        // Killed by a signal: no code to report, treat as a failure
        let returncode = output.status.code().unwrap_or(-1);
        log::debug!("{program} exited with {returncode}");

        Ok(ProcessOutput {
            returncode,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

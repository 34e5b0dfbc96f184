use std::path::PathBuf;

use miette::Diagnostic;

use crate::registrar::Step;
use crate::runner::ProcessOutput;

/// Errors that stop an `add` before the kernel is registered
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum AddError {
    #[error("Could not find environment {reference}")]
    #[diagnostic(
        code(pycus::environment_not_found),
        help("pass a path to a virtual environment, or a name under WORKON_HOME")
    )]
    EnvironmentNotFound { reference: String },

    #[error("No python interpreter at {}", .path.display())]
    #[diagnostic(code(pycus::missing_interpreter))]
    MissingInterpreter { path: PathBuf },

    #[error("Could not {step}: {source}")]
    #[diagnostic(code(pycus::launch))]
    Launch {
        step: Step,
        #[source]
        source: LaunchError,
    },

    #[error("Failed to {step} (exit code {})", .output.returncode)]
    #[diagnostic(code(pycus::non_zero_exit))]
    Failed { step: Step, output: ProcessOutput },
}

/// The process could not be started at all
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum LaunchError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Empty argument vector")]
    EmptyCommand,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum MiddlewareError {
    #[error("No value of the requested type was injected for `{name}`")]
    #[diagnostic(code(pycus::middleware_missing))]
    Missing { name: String },
}

//! pycus
//!
//! Registers existing Python virtual environments as Jupyter kernels.

pub mod environment;
pub mod error;
pub mod kernel_spec;
pub mod middleware;
pub mod registrar;
pub mod runner;

pub use error::{AddError, LaunchError, MiddlewareError};
pub use registrar::{AddRequest, Outcome, Registration, add};
pub use runner::{ProcessOutput, ProcessRunner, SystemRunner};

//! Registering a virtual environment as a Jupyter kernel.
//!
//! `add` runs three commands in order, each depending on the last:
//!
//! 1. `<env>/bin/python -m pip install ipykernel`
//! 2. `<env>/bin/python -m ipykernel install --name <name>-venv ...` which
//!    writes a kernel spec under `<env>/share/jupyter/kernels`
//! 3. `jupyter kernelspec install <that spec> --sys-prefix`
//!
//! Every problem is written to the output sink as plain text and stops the
//! run. Completed steps are left in place.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::environment::{self, KernelNames};
use crate::error::AddError;
use crate::kernel_spec::KernelSpec;
use crate::runner::ProcessRunner;

/// Used when no jupyter command is given; found through `PATH`
pub const DEFAULT_JUPYTER: &str = "jupyter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    InstallIpykernel,
    GenerateKernelSpec,
    RegisterKernelSpec,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Step::InstallIpykernel => write!(f, "install ipykernel"),
            Step::GenerateKernelSpec => write!(f, "generate the kernel spec"),
            Step::RegisterKernelSpec => write!(f, "register the kernel spec"),
        }
    }
}

/// Parameters of one `add` call
#[derive(Debug, Clone, Copy, Default)]
pub struct AddRequest<'a> {
    /// Path to the environment, or its name under `WORKON_HOME`
    pub environment: &'a str,
    /// Base kernel name; the environment's directory name when absent
    pub name: Option<&'a str>,
    /// Jupyter command; `jupyter` when absent
    pub jupyter: Option<&'a str>,
}

/// A kernel that made it through all three steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub environment: PathBuf,
    pub names: KernelNames,
    pub jupyter: String,
    pub spec_dir: PathBuf,
}

#[derive(Debug)]
pub enum Outcome {
    Registered(Registration),
    /// Already reported to the output sink
    Aborted(AddError),
}

impl Outcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, Outcome::Registered(_))
    }
}

/// Registers the environment named by `request` as a Jupyter kernel.
///
/// Progress and failures go to `output`; nothing is returned as an error.
pub fn add<R, W>(
    request: &AddRequest,
    runner: &R,
    os_environ: &HashMap<String, String>,
    output: &mut W,
) -> Outcome
where
    R: ProcessRunner + ?Sized,
    W: Write + ?Sized,
{
    match register(request, runner, os_environ, output) {
        Ok(registration) => {
            log::info!(
                "Registered kernel {} from {}",
                registration.names.kernel_name,
                registration.environment.display()
            );
            Outcome::Registered(registration)
        }
        Err(err) => {
            log::debug!("add {} stopped: {}", request.environment, err);
            report(&err, output);
            Outcome::Aborted(err)
        }
    }
}

fn register<R, W>(
    request: &AddRequest,
    runner: &R,
    os_environ: &HashMap<String, String>,
    output: &mut W,
) -> Result<Registration, AddError>
where
    R: ProcessRunner + ?Sized,
    W: Write + ?Sized,
{
    let environment = environment::resolve(request.environment, os_environ)?;
    let python = environment::interpreter(&environment);
    if !python.exists() {
        return Err(AddError::MissingInterpreter { path: python });
    }

    let names = KernelNames::new(request.name, &environment);
    let jupyter = request.jupyter.unwrap_or(DEFAULT_JUPYTER).to_string();
    let spec_dir = environment::kernel_spec_dir(&environment, &names.kernel_name);

    emit(
        output,
        format_args!("Running pip install ipykernel in {}", environment.display()),
    );
    run_step(Step::InstallIpykernel, pip_install_argv(&python), runner)?;

    emit(
        output,
        format_args!(
            "Generating kernel spec {} with display name {}",
            names.kernel_name, names.display_name
        ),
    );
    run_step(
        Step::GenerateKernelSpec,
        ipykernel_install_argv(&python, &names, &environment),
        runner,
    )?;
    log_kernel_spec(&spec_dir);

    emit(
        output,
        format_args!("Registering kernel spec with {}", jupyter),
    );
    run_step(
        Step::RegisterKernelSpec,
        kernelspec_install_argv(&jupyter, &spec_dir),
        runner,
    )?;

    Ok(Registration {
        environment,
        names,
        jupyter,
        spec_dir,
    })
}

fn run_step<R>(step: Step, argv: Vec<String>, runner: &R) -> Result<(), AddError>
where
    R: ProcessRunner + ?Sized,
{
    log::debug!("{step}: {argv:?}");
    let result = runner
        .run(&argv)
        .map_err(|source| AddError::Launch { step, source })?;

    if !result.success() {
        return Err(AddError::Failed {
            step,
            output: result,
        });
    }
    Ok(())
}

pub fn pip_install_argv(python: &Path) -> Vec<String> {
    vec![
        path_arg(python),
        "-m".to_string(),
        "pip".to_string(),
        "install".to_string(),
        "ipykernel".to_string(),
    ]
}

pub fn ipykernel_install_argv(python: &Path, names: &KernelNames, environment: &Path) -> Vec<String> {
    vec![
        path_arg(python),
        "-m".to_string(),
        "ipykernel".to_string(),
        "install".to_string(),
        "--name".to_string(),
        names.kernel_name.clone(),
        "--display-name".to_string(),
        names.display_name.clone(),
        "--prefix".to_string(),
        path_arg(environment),
    ]
}

pub fn kernelspec_install_argv(jupyter: &str, spec_dir: &Path) -> Vec<String> {
    vec![
        jupyter.to_string(),
        "kernelspec".to_string(),
        "install".to_string(),
        path_arg(spec_dir),
        "--sys-prefix".to_string(),
    ]
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

// Not fatal: the spec only matters to jupyter in the next step
fn log_kernel_spec(spec_dir: &Path) {
    match KernelSpec::load(spec_dir) {
        Ok(spec) => log::debug!(
            "Kernel spec '{}' ({}) starts with {:?}",
            spec.display_name,
            spec.language,
            spec.argv
        ),
        Err(e) => log::debug!("Could not inspect kernel spec: {e}"),
    }
}

fn report<W: Write + ?Sized>(err: &AddError, output: &mut W) {
    match err {
        AddError::Failed { output: result, .. } => {
            emit(output, "Output:");
            emit(output, result.stdout.trim());
            emit(output, "Error:");
            emit(output, result.stderr.trim());
        }
        other => emit(output, other),
    }
}

fn emit<W: Write + ?Sized>(output: &mut W, line: impl fmt::Display) {
    if let Err(e) = writeln!(output, "{line}") {
        log::error!("Failed to write to output: {e}");
    }
}

use std::collections::HashMap;
use std::io;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use pycus::environment;
use pycus::middleware::{Command, Injected, make_middlewares};
use pycus::{AddRequest, SystemRunner};

#[derive(Parser, Debug)]
#[command(name = "pycus")]
#[command(version, about = "Register Python virtual environments as Jupyter kernels")]
struct Args {
    /// The log level to use: "trace", "debug", "info", "warn" or "error".
    /// Defaults to the value of `RUST_LOG`, or "warn".
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a virtual environment to Jupyter as a kernel
    Add {
        /// Path to the environment, or its name under WORKON_HOME
        environment: String,

        /// Kernel name; defaults to the environment's directory name
        #[arg(value_name = "NAME")]
        positional_name: Option<String>,

        /// Kernel name; takes precedence over the positional NAME
        #[arg(short, long)]
        name: Option<String>,

        /// Jupyter command to register the kernel with
        #[arg(short, long)]
        jupyter: Option<String>,
    },
}

fn init_logging(level: Option<&str>) -> anyhow::Result<()> {
    let level = match level {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
    };

    let filter = match level.as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => {
            eprintln!("Invalid log level '{}'; using 'warn'", level);
            LevelFilter::Warn
        }
    };

    // Progress text owns stdout, so diagnostics go to stderr
    TermLogger::init(filter, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .map_err(|e| anyhow::anyhow!("Failed to initialize terminal logging: {}", e))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    match args.command {
        Commands::Add {
            environment,
            positional_name,
            name,
            jupyter,
        } => {
            let os_environ = environment::snapshot(std::env::vars_os());
            let statics = make_middlewares()
                .with("runner", SystemRunner)
                .with("os_environ", os_environ);

            let mut add_cmd = Command::new("add", move |injected: &mut Injected| {
                let runner = injected.get::<SystemRunner>("runner")?;
                let os_environ = injected.get::<HashMap<String, String>>("os_environ")?;
                let request = AddRequest {
                    environment: &environment,
                    name: name.as_deref().or(positional_name.as_deref()),
                    jupyter: jupyter.as_deref(),
                };

                let mut stdout = io::stdout().lock();
                anyhow::Ok(pycus::add(&request, runner, os_environ, &mut stdout))
            });
            for mw in statics.values() {
                add_cmd.add(mw);
            }

            if !add_cmd.run()?.is_registered() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

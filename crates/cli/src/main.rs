mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mkpipe_lib::config::ConfigInputs;
use mkpipe_lib::consts::{ENV_PLATFORM, ENV_PYTHON, ENV_PYTHON_ROOT, ENV_PYTHON_VERSION};

use output::{OutputFormat, print_error};

/// mkpipe - dependency-ordered build pipeline for native extension modules
#[derive(Parser)]
#[command(name = "mkpipe")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project root (default: current directory)
  #[arg(short = 'C', long, global = true, default_value = ".")]
  project_dir: PathBuf,

  /// Interpreter version, e.g. 2.6
  #[arg(long, global = true, env = ENV_PYTHON_VERSION)]
  python_version: Option<String>,

  /// Interpreter installation root, e.g. C:\Python26
  #[arg(long, global = true, env = ENV_PYTHON_ROOT)]
  python_root: Option<String>,

  /// Interpreter executable (default: derived from the root)
  #[arg(long, global = true, env = ENV_PYTHON)]
  python: Option<String>,

  /// Platform tag of the intermediate build directory (default: host)
  #[arg(long, global = true, env = ENV_PLATFORM)]
  platform: Option<String>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value = "text")]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run targets and their prerequisites (default: all)
  Run {
    /// Targets to run, in order; `ut-<name>` runs a single test
    targets: Vec<String>,
  },

  /// Show which targets a run would execute, without running anything
  Plan {
    /// Targets to plan for (default: all)
    targets: Vec<String>,
  },

  /// List the available targets
  Targets,
}

impl Cli {
  fn config_inputs(&self) -> ConfigInputs {
    ConfigInputs {
      python_version: self.python_version.clone(),
      python_root: self.python_root.clone(),
      python: self.python.clone(),
      platform: self.platform.clone(),
    }
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<u8> {
  let inputs = cli.config_inputs();
  let project_dir = || {
    dunce::canonicalize(&cli.project_dir)
      .with_context(|| format!("project directory not found: {}", cli.project_dir.display()))
  };

  match &cli.command {
    Commands::Targets => cmd::cmd_targets(cli.output).map(|()| 0),
    Commands::Run { targets } => cmd::cmd_run(&project_dir()?, inputs, targets, cli.output),
    Commands::Plan { targets } => cmd::cmd_plan(&project_dir()?, inputs, targets, cli.output).map(|()| 0),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(code) => ExitCode::from(code),
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}

//! Implementation of the `mkpipe plan` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use tracing::debug;

use mkpipe_lib::config::ConfigInputs;
use mkpipe_lib::consts::STATE_DIR;
use mkpipe_lib::pipeline::Pipeline;
use mkpipe_lib::process::SystemRunner;
use mkpipe_lib::run_lock::{LockMode, RunLock};

use crate::output::{OutputFormat, print_json, symbols};

pub fn cmd_plan(project_dir: &Path, inputs: ConfigInputs, targets: &[String], format: OutputFormat) -> Result<()> {
  let goals = super::goals(targets);
  // A checkout that was never built has nothing to guard, and plan must not
  // write to it.
  let _lock = if project_dir.join(STATE_DIR).is_dir() {
    Some(RunLock::acquire(project_dir, LockMode::Shared, "plan")?)
  } else {
    debug!(project = %project_dir.display(), "no state directory, planning without lock");
    None
  };

  let pipeline = Pipeline::load(project_dir, inputs, SystemRunner)?;
  let planned = pipeline.plan(&goals)?;
  debug!(goals = ?goals, targets = planned.len(), "planned run");

  if format.is_json() {
    return print_json(&planned);
  }

  for target in &planned {
    match target.run {
      Some(reason) => println!(
        "  {} {} {}",
        symbols::RUN.if_supports_color(Stream::Stdout, |s| s.green()),
        target.name,
        format!("({})", reason).if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
      None => println!(
        "  {} {} {}",
        symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()),
        target.name,
        "(up to date)".if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
    }
  }

  let to_run = planned.iter().filter(|t| t.run.is_some()).count();
  println!();
  println!("{} target(s) would run, {} up to date", to_run, planned.len() - to_run);
  Ok(())
}

//! Distribution installer.

use std::path::Path;

use tracing::info;

use super::{ActionError, ActionResult, run_checked};
use crate::config::BuildConfig;
use crate::process::{CommandRunner, CommandSpec};
use crate::project::Project;

pub async fn build_installer<R: CommandRunner>(
  project_root: &Path,
  project: &Project,
  config: &BuildConfig,
  runner: &R,
) -> Result<ActionResult, ActionError> {
  let spec = CommandSpec::new(config.interpreter().to_string_lossy(), project_root)
    .arg(project.extensions.setup_script.to_string_lossy())
    .args(project.installer.args.iter().cloned());

  info!(tag = %config.build_tag(), "building installer");
  run_checked(runner, &spec).await?;
  Ok(ActionResult::detail("installer built"))
}

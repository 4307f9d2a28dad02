//! Native extension build.

use std::path::Path;

use tracing::info;

use super::{ActionError, ActionResult, run_checked};
use crate::config::BuildConfig;
use crate::process::{CommandRunner, CommandSpec};
use crate::project::ExtensionSpec;

/// The build-extensions invocation for the configured interpreter.
///
/// The interpreter header directory travels on the child's environment under
/// `spec.include_env`.
pub fn command(project_root: &Path, spec: &ExtensionSpec, config: &BuildConfig) -> CommandSpec {
  CommandSpec::new(config.interpreter().to_string_lossy(), project_root)
    .arg(spec.setup_script.to_string_lossy())
    .arg(spec.command.as_str())
    .env(spec.include_env.as_str(), config.include_dir().to_string_lossy())
}

pub async fn build_extensions<R: CommandRunner>(
  project_root: &Path,
  spec: &ExtensionSpec,
  config: &BuildConfig,
  runner: &R,
) -> Result<ActionResult, ActionError> {
  info!(tag = %config.build_tag(), "building extension modules");
  run_checked(runner, &command(project_root, spec, config)).await?;
  Ok(ActionResult::detail(format!("extensions built for {}", config.build_tag())))
}

//! Test invocation.

use std::path::Path;

use tracing::info;

use super::{ActionError, ActionResult, run_checked};
use crate::config::BuildConfig;
use crate::process::{CommandRunner, CommandSpec};
use crate::project::TestSpec;

/// Run one test script (`Some(name)`) or the whole suite (`None`) with the
/// configured interpreter.
///
/// The process runs inside the test directory with the module search path
/// pointing at the project root, so the freshly placed modules are imported.
pub async fn invoke<R: CommandRunner>(
  project_root: &Path,
  tests: &TestSpec,
  name: Option<&str>,
  config: &BuildConfig,
  runner: &R,
) -> Result<ActionResult, ActionError> {
  let dir = project_root.join(&tests.dir);
  let script = match name {
    Some(test) => tests.script_name(test),
    None => tests.suite_entry.clone(),
  };

  let path = dir.join(&script);
  if !path.is_file() {
    return Err(ActionError::TestScriptMissing {
      test: name.unwrap_or(tests.suite_entry.as_str()).to_string(),
      path,
    });
  }

  info!(script = %script, "running tests");
  let spec = CommandSpec::new(config.interpreter().to_string_lossy(), &dir)
    .arg(script.as_str())
    .env(tests.search_path_env.as_str(), project_root.to_string_lossy());
  run_checked(runner, &spec).await?;

  Ok(ActionResult::detail(format!("{} passed", script)))
}

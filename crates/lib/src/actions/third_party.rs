//! Third-party component compilation.

use std::path::Path;

use tracing::{info, warn};

use super::{ActionError, ActionResult, run_checked};
use crate::process::{CommandRunner, CommandSpec};
use crate::project::ThirdPartyComponent;

/// Run each component's build driver in its own directory, in order.
///
/// A required component whose directory is absent fails before any driver
/// runs for it; an optional one is skipped with a warning.
pub async fn compile_components<R: CommandRunner>(
  project_root: &Path,
  components: &[ThirdPartyComponent],
  runner: &R,
) -> Result<ActionResult, ActionError> {
  let mut compiled = 0usize;

  for component in components {
    let dir = project_root.join(&component.dir);
    if !dir.is_dir() {
      if component.optional {
        warn!(component = %component.name, path = ?dir, "optional component not present, skipping");
        continue;
      }
      return Err(ActionError::ComponentMissing {
        component: component.name.clone(),
        path: dir,
      });
    }

    let Some((program, args)) = component.driver.split_first() else {
      continue;
    };

    info!(component = %component.name, "compiling third-party component");
    let spec = CommandSpec::new(program.as_str(), &dir).args(args.iter().cloned());
    run_checked(runner, &spec).await?;
    compiled += 1;
  }

  Ok(ActionResult::detail(format!("{} component(s) compiled", compiled)))
}

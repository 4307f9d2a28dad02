mod plan;
mod run;
mod targets;

pub use plan::cmd_plan;
pub use run::cmd_run;
pub use targets::cmd_targets;

use mkpipe_lib::target::ALL;

/// Requested targets, or `all` when none were given.
fn goals(targets: &[String]) -> Vec<&str> {
  if targets.is_empty() {
    vec![ALL]
  } else {
    targets.iter().map(String::as_str).collect()
  }
}

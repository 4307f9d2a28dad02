//! Implementation of the `mkpipe targets` command.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use mkpipe_lib::target::{Freshness, TargetGraph, UNIT_TEST_PREFIX, standard_targets};

use crate::output::{OutputFormat, print_json, symbols};

pub fn cmd_targets(format: OutputFormat) -> Result<()> {
  let graph = TargetGraph::new(standard_targets())?;

  if format.is_json() {
    return print_json(&graph.targets());
  }

  for target in graph.targets() {
    let stamped = if target.freshness == Freshness::Stamped {
      " [stamped]"
    } else {
      ""
    };
    println!(
      "  {}{} {}",
      target.name.if_supports_color(Stream::Stdout, |s| s.bold()),
      stamped,
      target.description.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
    if !target.prerequisites.is_empty() {
      println!("      {} {}", symbols::ARROW, target.prerequisites.join(", "));
    }
  }
  println!(
    "  {}<name> {}",
    UNIT_TEST_PREFIX.if_supports_color(Stream::Stdout, |s| s.bold()),
    "Run tests/test_<name>.py".if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
  Ok(())
}

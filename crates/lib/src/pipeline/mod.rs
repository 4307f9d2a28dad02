//! Pipeline orchestration.
//!
//! A run resolves the requested goals against the target graph, flattens them
//! into one execution order (prerequisites first, each target at most once),
//! resolves the build configuration if any target in that order needs it, and
//! then walks the order:
//!
//! - phony targets always run
//! - stamped targets run when a prerequisite ran in this run, or when their
//!   stamp is missing or stale
//! - the first failing action stops the run
//!
//! A stamped target's marker is removed before its action starts and written
//! only after it succeeds, so an interrupted or failed build is never mistaken
//! for a finished one.

mod fingerprint;
mod types;

pub use types::*;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info};

use crate::actions::{ActionContext, ActionError, execute_action, placement};
use crate::config::{BuildConfig, ConfigInputs};
use crate::process::CommandRunner;
use crate::project::Project;
use crate::stamp::{StampStore, TargetState};
use crate::target::{Freshness, TargetDef, TargetGraph, TargetKind, standard_targets};
use crate::util::hash::Fingerprint;

use fingerprint::FingerprintInputs;

pub struct Pipeline<R> {
  project_root: PathBuf,
  project: Project,
  inputs: ConfigInputs,
  graph: TargetGraph,
  stamps: StampStore,
  runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
  /// Create a pipeline over the standard targets.
  ///
  /// `inputs` take precedence over the interpreter settings in the project file.
  pub fn new(project_root: &Path, project: Project, inputs: ConfigInputs, runner: R) -> Result<Self, PipelineError> {
    let inputs = inputs.merge(project.interpreter.clone());
    Ok(Self {
      project_root: project_root.to_path_buf(),
      graph: TargetGraph::new(standard_targets())?,
      stamps: StampStore::new(project_root),
      project,
      inputs,
      runner,
    })
  }

  /// Load the project file from `project_root` and create a pipeline.
  pub fn load(project_root: &Path, inputs: ConfigInputs, runner: R) -> Result<Self, PipelineError> {
    let project = Project::load(project_root)?;
    Self::new(project_root, project, inputs, runner)
  }

  pub fn graph(&self) -> &TargetGraph {
    &self.graph
  }

  pub fn project(&self) -> &Project {
    &self.project
  }

  pub fn runner(&self) -> &R {
    &self.runner
  }

  pub async fn run(&self, goal: &str) -> Result<RunReport, PipelineError> {
    self.run_goals(&[goal]).await
  }

  /// Run goals in the given order, sharing one visited set so a target
  /// reached by several goals runs once.
  pub async fn run_goals(&self, goals: &[&str]) -> Result<RunReport, PipelineError> {
    let order = self.resolve_order(goals)?;
    let config = self.resolve_config(&order)?;

    info!(goals = ?goals, targets = order.len(), "starting run");

    let mut report = RunReport::default();
    let mut executed: HashSet<String> = HashSet::new();
    let mut settled: BTreeMap<String, Fingerprint> = BTreeMap::new();
    let ctx = ActionContext {
      project_root: &self.project_root,
      project: &self.project,
      config: config.as_ref(),
      runner: &self.runner,
    };

    for def in &order {
      let started = Instant::now();
      let result = match def.freshness {
        Freshness::Always => execute_action(&def.kind, &ctx).await.map(|r| (OutcomeStatus::Executed, r.detail)),
        Freshness::Stamped => {
          self
            .run_stamped(def, &ctx, config.as_ref(), &executed, &mut settled)
            .await
        }
      };

      match result {
        Ok((status, detail)) => {
          let elapsed_ms = started.elapsed().as_millis() as u64;
          if status == OutcomeStatus::Executed {
            executed.insert(def.name.clone());
            info!(step = %def.name, elapsed_ms, "target complete");
          } else {
            info!(step = %def.name, "target up to date");
          }
          report.outcomes.push(TargetOutcome {
            target: def.name.clone(),
            status,
            freshness: def.freshness,
            detail,
            elapsed_ms,
          });
        }
        Err(e) => {
          error!(step = %def.name, error = %e, "target failed");
          report.failed = Some((def.name.clone(), e));
          break;
        }
      }
    }

    info!(
      executed = report.executed().len(),
      skipped = report.skipped().len(),
      success = report.is_success(),
      "run finished"
    );
    Ok(report)
  }

  async fn run_stamped(
    &self,
    def: &TargetDef,
    ctx: &ActionContext<'_, R>,
    config: Option<&BuildConfig>,
    executed: &HashSet<String>,
    settled: &mut BTreeMap<String, Fingerprint>,
  ) -> Result<(OutcomeStatus, Option<String>), ActionError> {
    let prerequisite_ran = def.prerequisites.iter().any(|p| executed.contains(p));

    if !prerequisite_ran {
      let current = fingerprint::compute(def, &self.fingerprint_inputs(config, settled))?;
      let state = self.stamps.state(&def.name, &current);
      debug!(step = %def.name, %state, "stamp state");
      if state == TargetState::Built {
        settled.insert(def.name.clone(), current);
        return Ok((OutcomeStatus::UpToDate, None));
      }
    }

    self.stamps.remove(&def.name)?;
    let result = execute_action(&def.kind, ctx).await?;

    let built = fingerprint::compute(def, &self.fingerprint_inputs(config, settled))?;
    let outputs = match (&def.kind, config) {
      (TargetKind::Extensions, Some(config)) => placement::build_outputs(&self.project, config),
      _ => Vec::new(),
    };
    self.stamps.write(&def.name, &built, &outputs)?;
    settled.insert(def.name.clone(), built);

    Ok((OutcomeStatus::Executed, result.detail))
  }

  /// Describe what a run of `goals` would do, without running anything.
  pub fn plan(&self, goals: &[&str]) -> Result<Vec<PlannedTarget>, PipelineError> {
    let order = self.resolve_order(goals)?;
    let config = self.resolve_config(&order)?;

    let mut will_run: HashSet<String> = HashSet::new();
    let mut settled: BTreeMap<String, Fingerprint> = BTreeMap::new();
    let mut planned = Vec::with_capacity(order.len());

    for def in order {
      let run = match def.freshness {
        Freshness::Always => Some(RunReason::Always),
        Freshness::Stamped if def.prerequisites.iter().any(|p| will_run.contains(p)) => {
          Some(RunReason::PrerequisiteRuns)
        }
        Freshness::Stamped => {
          let current = fingerprint::compute(&def, &self.fingerprint_inputs(config.as_ref(), &settled))?;
          let state = self.stamps.state(&def.name, &current);
          settled.insert(def.name.clone(), current);
          (state != TargetState::Built).then_some(RunReason::State(state))
        }
      };

      if run.is_some() {
        will_run.insert(def.name.clone());
      }
      planned.push(PlannedTarget {
        name: def.name,
        kind: def.kind,
        freshness: def.freshness,
        run,
      });
    }

    Ok(planned)
  }

  /// Flatten goals into one execution order.
  fn resolve_order(&self, goals: &[&str]) -> Result<Vec<TargetDef>, PipelineError> {
    let mut graph = self.graph.clone();
    for goal in goals {
      graph = graph.with_target(goal)?;
    }

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for goal in goals {
      for def in graph.execution_order(goal)? {
        if seen.insert(def.name.clone()) {
          order.push(def.clone());
        }
      }
    }
    Ok(order)
  }

  /// Resolve the configuration if any target in `order` needs it.
  fn resolve_config(&self, order: &[TargetDef]) -> Result<Option<BuildConfig>, PipelineError> {
    if !order.iter().any(|d| d.kind.needs_config()) {
      return Ok(None);
    }
    let config = self.inputs.resolve()?;
    debug!(
      version = config.version(),
      interpreter = ?config.interpreter(),
      platform = config.platform(),
      "resolved build configuration"
    );
    Ok(Some(config))
  }

  fn fingerprint_inputs<'a>(
    &'a self,
    config: Option<&'a BuildConfig>,
    settled: &'a BTreeMap<String, Fingerprint>,
  ) -> FingerprintInputs<'a> {
    FingerprintInputs {
      project_root: &self.project_root,
      project: &self.project,
      config,
      settled,
    }
  }
}

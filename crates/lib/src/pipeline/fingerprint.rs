//! Fingerprints of stamped targets.
//!
//! A fingerprint covers everything a stamped target is built from: the
//! driver invocation, the source trees, the interpreter configuration and the
//! fingerprints of stamped prerequisites. Compilation byproducts that land
//! next to the sources are excluded.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::BuildConfig;
use crate::project::Project;
use crate::target::{TargetDef, TargetKind};
use crate::util::hash::{DirHashError, Exclusions, Fingerprint, FingerprintBuilder, hash_tree};

/// Everything a fingerprint may depend on.
pub(crate) struct FingerprintInputs<'a> {
  pub project_root: &'a Path,
  pub project: &'a Project,
  pub config: Option<&'a BuildConfig>,
  /// Fingerprints of stamped targets already settled in this run.
  pub settled: &'a BTreeMap<String, Fingerprint>,
}

pub(crate) fn compute(def: &TargetDef, inputs: &FingerprintInputs<'_>) -> Result<Fingerprint, DirHashError> {
  let names = inputs.project.byproduct_names();
  let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
  let extensions = inputs.project.byproduct_extensions();
  let exclusions = Exclusions {
    names: &name_refs,
    extensions: &extensions,
  };

  let mut builder = FingerprintBuilder::new().value("target", &def.name);

  for prerequisite in &def.prerequisites {
    if let Some(fp) = inputs.settled.get(prerequisite) {
      builder = builder.fingerprint(prerequisite, fp);
    }
  }

  match &def.kind {
    TargetKind::ThirdParty => {
      for component in &inputs.project.third_party {
        let hash = hash_tree(&inputs.project_root.join(&component.dir), &exclusions)?;
        builder = builder
          .value("component", &component.name)
          .value("driver", &component.driver.join(" "))
          .content(&component.dir.to_string_lossy(), &hash);
      }
    }
    TargetKind::Extensions => {
      let spec = &inputs.project.extensions;
      builder = builder
        .value("setup_script", &spec.setup_script.to_string_lossy())
        .value("command", &spec.command)
        .value("include_env", &spec.include_env);
      if let Some(config) = inputs.config {
        for (key, value) in config.fingerprint_values() {
          builder = builder.value(key, &value);
        }
      }
      for source in &spec.sources {
        let hash = hash_tree(&inputs.project_root.join(source), &exclusions)?;
        builder = builder.content(&source.to_string_lossy(), &hash);
      }
    }
    _ => {}
  }

  Ok(builder.finish())
}

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use tardocken_build::ContextArchiveBuilder;
use tardocken_core::{IgnoreRuleSet, Replacement};

/// Validated inputs for one context build.
pub struct BuildPlan {
    pub context: PathBuf,
    pub dockerfile: Option<PathBuf>,
    pub dockerignore: Option<PathBuf>,
    pub replacements: Vec<Replacement>,
}

pub fn build(plan: BuildPlan) -> anyhow::Result<()> {
    let rules = plan
        .dockerignore
        .as_deref()
        .map(IgnoreRuleSet::from_path)
        .transpose()?;
    if let Some(path) = &plan.dockerignore {
        tracing::debug!(path = %path.display(), "using ignore rules");
    }

    let mut builder = ContextArchiveBuilder::new(plan.context)
        .replacements(plan.replacements)
        .ignore_rules(rules);
    if let Some(dockerfile) = plan.dockerfile {
        builder = builder.dockerfile(dockerfile);
    }

    let archive = builder
        .build()
        .context("failed to build context archive")?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&archive)
        .context("failed to write archive to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}

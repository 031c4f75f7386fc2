mod commands;

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tardocken_core::{ContextRequest, Replacement};

/// Ignore file picked up from the working directory when `-i` is not given.
const DEFAULT_IGNORE_FILE: &str = ".dockerignore";

#[derive(Parser)]
#[command(
    name = "tardocken",
    about = "Write a docker build context to stdout, replacing the Dockerfile and/or injecting paths"
)]
#[command(version)]
struct Cli {
    /// Path to the build context directory
    #[arg(required_unless_present = "config")]
    context: Option<PathBuf>,
    /// Path to insert into the context, e.g. extra_context:where_to_put_it
    #[arg(short = 'p', long = "path", value_name = "SOURCE:DEST", value_parser = Replacement::parse)]
    paths: Vec<Replacement>,
    /// Replacement Dockerfile
    #[arg(short, long)]
    dockerfile: Option<PathBuf>,
    /// File with glob rules for files to exclude from the context
    /// (.dockerignore in the working directory is used if it exists)
    #[arg(short = 'i', long)]
    dockerignore: Option<PathBuf>,
    /// TOML build request; command-line values take precedence and
    /// --path entries are appended to its paths
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges the request file with the command line and checks every
    /// referenced path before any archive work starts.
    fn into_plan(self) -> anyhow::Result<commands::BuildPlan> {
        let request = match self.config.as_deref().map(ContextRequest::load) {
            Some(Ok(request)) => request,
            Some(Err(e)) => usage_error(e),
            None => ContextRequest::default(),
        };

        let mut replacements = match request.replacements() {
            Ok(replacements) => replacements,
            Err(e) => usage_error(e),
        };
        replacements.extend(self.paths);

        let Some(context) = self.context.or(request.context) else {
            usage_error("CONTEXT is required");
        };
        if !context.is_dir() {
            usage_error(format!("CONTEXT must be a directory: {}", context.display()));
        }

        let dockerfile = self.dockerfile.or(request.dockerfile);
        if dockerfile.as_ref().is_some_and(|path| !path.is_file()) {
            usage_error("DOCKERFILE is expected to be a plain file");
        }

        let dockerignore = match self.dockerignore.or(request.dockerignore) {
            Some(path) if path.is_file() => Some(path),
            Some(_) => usage_error("DOCKERIGNORE must be a file"),
            None => Some(PathBuf::from(DEFAULT_IGNORE_FILE)).filter(|path| path.is_file()),
        };

        Ok(commands::BuildPlan {
            context,
            dockerfile,
            dockerignore,
            replacements,
        })
    }
}

fn usage_error(message: impl std::fmt::Display) -> ! {
    Cli::command().error(ErrorKind::ValueValidation, message).exit()
}

fn main() -> anyhow::Result<()> {
    // stdout carries the archive; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let plan = Cli::parse().into_plan()?;
    commands::build(plan)
}
